pub mod auth;
pub mod post;
pub mod user;

use crate::model::{
    post::{InvalidPostBodyError, InvalidPostStatusError, InvalidPostTitleError},
    user::InvalidEmailAddressError,
};
use derive_where::derive_where;
use serde::{Deserialize, Serialize};
use std::{fmt::Display, marker::PhantomData, str::FromStr};
use thiserror::Error;
use uuid::Uuid;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Error)]
pub enum ModelValidationError {
    #[error(transparent)]
    EmailAddress(#[from] InvalidEmailAddressError),
    #[error(transparent)]
    PostTitle(#[from] InvalidPostTitleError),
    #[error(transparent)]
    PostBody(#[from] InvalidPostBodyError),
    #[error(transparent)]
    PostStatus(#[from] InvalidPostStatusError),
}

/// Store-assigned identifier, marker-typed so user and post ids cannot be
/// confused with each other.
#[derive_where(
    Copy,
    Clone,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Debug,
    Default,
    Hash,
    Serialize,
    Deserialize
)]
#[serde(transparent)]
pub struct Id<Marker>(Uuid, #[serde(skip)] PhantomData<Marker>);

impl<Marker> Id<Marker> {
    #[must_use]
    pub fn new(uuid: Uuid) -> Self {
        Self(uuid, PhantomData)
    }

    #[must_use]
    pub fn uuid(self) -> Uuid {
        self.0
    }
}

impl<Marker> Display for Id<Marker> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<Marker> FromStr for Id<Marker> {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(Uuid::from_str(s)?))
    }
}

impl<Marker> From<Uuid> for Id<Marker> {
    fn from(value: Uuid) -> Self {
        Self::new(value)
    }
}

impl<Marker> From<Id<Marker>> for Uuid {
    fn from(value: Id<Marker>) -> Self {
        value.0
    }
}
