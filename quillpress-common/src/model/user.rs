use crate::{model::Id, password::PasswordHashString};
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{Error, Unexpected},
};
use thiserror::Error;

pub const EMAIL_MAX_LEN: usize = 254;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct UserMarker;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct User {
    pub id: Id<UserMarker>,
    pub email: EmailAddress,
    pub name: Option<String>,
}

/// Registration payload as handed to the store. The password is already
/// hashed by the time this exists.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct CreateUser {
    pub email: EmailAddress,
    pub password_hash: PasswordHashString,
    pub name: Option<String>,
}

/// A user together with their stored password hash. Only the login flow
/// fetches this shape; everything else works with [`User`].
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: PasswordHashString,
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
#[serde(transparent)]
pub struct EmailAddress(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The email address is invalid: {0}")]
pub struct InvalidEmailAddressError(String);

impl EmailAddress {
    pub fn new(email: String) -> Result<Self, InvalidEmailAddressError> {
        let valid = email.len() <= EMAIL_MAX_LEN
            && email
                .split_once('@')
                .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));

        if valid {
            Ok(EmailAddress(email))
        } else {
            Err(InvalidEmailAddressError(email))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for EmailAddress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        EmailAddress::new(inner)
            .map_err(|err| Error::invalid_value(Unexpected::Str(&err.0), &"EmailAddress"))
    }
}
