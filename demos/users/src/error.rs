use missive::{ErrorKind, Id};

use crate::users::User;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("User {0} was not found")]
    UserNotFound(Id<User>),
    #[error("Could not hash password: {0}")]
    Hashing(String),
    #[error("Invalid settings: {0}")]
    Settings(#[from] config::ConfigError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Bus(#[from] missive::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::InvalidInput,
            Self::UserNotFound(_) => ErrorKind::NotFound,
            Self::Bus(error) => error.kind(),
            Self::Hashing(_) | Self::Settings(_) | Self::Serialization(_) => ErrorKind::Internal,
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("The {0} must not be empty")]
    Empty(&'static str),
    #[error("The {0} must not be a number")]
    Numeric(&'static str),
    #[error("The password must not be empty")]
    EmptyPassword,
    #[error("Page number and page size start at 1, and the page must be addressable")]
    Page,
}
