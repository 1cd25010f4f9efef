//! Password handling for registration and login. Plaintext passwords live
//! only inside [`Password`]; the store only ever sees PHC hash strings.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::{
    Deserialize, Deserializer,
    de::{Error, Unexpected},
};
use std::fmt::{Debug, Formatter};
use thiserror::Error;

pub const PASSWORD_MIN_LEN: usize = 8;

#[derive(Debug, Error)]
#[error("Password hashing failed: {0}")]
pub struct PasswordHashError(argon2::password_hash::Error);

/// A plaintext password as received from a request body. Never logged,
/// never stored.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct Password(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The password must be at least {PASSWORD_MIN_LEN} characters long")]
pub struct InvalidPasswordError;

impl Password {
    pub fn new(password: String) -> Result<Self, InvalidPasswordError> {
        if password.chars().count() < PASSWORD_MIN_LEN {
            Err(InvalidPasswordError)
        } else {
            Ok(Password(password))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Password {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        Password::new(inner).map_err(|_| {
            Error::invalid_value(Unexpected::Str("[redacted]"), &"a longer password")
        })
    }
}

impl Debug for Password {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Password").field(&"[redacted]").finish()
    }
}

/// An argon2id hash in PHC string form, as persisted by the store.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct PasswordHashString(String);

impl PasswordHashString {
    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }
}

impl From<String> for PasswordHashString {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Debug for PasswordHashString {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PasswordHashString")
            .field(&"[redacted]")
            .finish()
    }
}

pub fn hash(password: &Password) -> Result<PasswordHashString, PasswordHashError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.get().as_bytes(), &salt)
        .map_err(PasswordHashError)?;

    Ok(PasswordHashString(hash.to_string()))
}

/// Checks a password attempt against a stored hash. A mismatch is `Ok(false)`;
/// `Err` means the stored hash itself could not be used.
pub fn verify(attempt: &Password, hash: &PasswordHashString) -> Result<bool, PasswordHashError> {
    let parsed = PasswordHash::new(&hash.0).map_err(PasswordHashError)?;

    match Argon2::default().verify_password(attempt.get().as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(err) => Err(PasswordHashError(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let password = Password::new("correct horse battery".to_owned()).unwrap();
        let hashed = hash(&password).unwrap();

        assert!(verify(&password, &hashed).unwrap());
    }

    #[test]
    fn wrong_password_does_not_verify() {
        let password = Password::new("correct horse battery".to_owned()).unwrap();
        let other = Password::new("incorrect horse battery".to_owned()).unwrap();
        let hashed = hash(&password).unwrap();

        assert!(!verify(&other, &hashed).unwrap());
    }

    #[test]
    fn garbage_stored_hash_is_an_error() {
        let password = Password::new("correct horse battery".to_owned()).unwrap();
        let stored = PasswordHashString::from("not-a-phc-string".to_owned());

        assert!(verify(&password, &stored).is_err());
    }

    #[test]
    fn short_passwords_are_rejected() {
        assert!(Password::new("short".to_owned()).is_err());
    }

    #[test]
    fn debug_output_is_redacted() {
        let password = Password::new("correct horse battery".to_owned()).unwrap();
        assert!(!format!("{password:?}").contains("horse"));
    }
}
