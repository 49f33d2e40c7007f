use std::fmt::{Display, Formatter};

use crate::error::ValidationError;
use crate::security::hash_password;
use crate::Error;

fn check_name(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Empty(field))
    } else if value.chars().all(char::is_numeric) {
        Err(ValidationError::Numeric(field))
    } else {
        Ok(())
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct UserName(String);

impl UserName {
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        check_name(&value, "name")?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<UserName> for String {
    fn from(value: UserName) -> Self {
        value.0
    }
}

impl Display for UserName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct UserSurname(String);

impl UserSurname {
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        check_name(&value, "surname")?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<UserSurname> for String {
    fn from(value: UserSurname) -> Self {
        value.0
    }
}

impl Display for UserSurname {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A hashed password. The plain text is never stored.
#[derive(Clone, Eq, PartialEq)]
pub struct Password(String);

impl Password {
    /// Hashes a plain text password.
    pub fn hash(plain: &str) -> Result<Self, Error> {
        if plain.is_empty() {
            return Err(ValidationError::EmptyPassword.into());
        }
        Ok(Self(hash_password(plain)?))
    }

    /// Wraps an already hashed password, as read from storage.
    pub fn from_hash(hash: impl Into<String>) -> Result<Self, ValidationError> {
        let hash = hash.into();
        if hash.is_empty() {
            Err(ValidationError::EmptyPassword)
        } else {
            Ok(Self(hash))
        }
    }

    pub fn as_hash(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(***)")
    }
}
