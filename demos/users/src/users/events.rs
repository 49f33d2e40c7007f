use missive::{Event, Id};
use serde::{Deserialize, Serialize};

use super::User;

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize, Event)]
pub struct UserCreated {
    pub oid: Id<User>,
    pub name: String,
    pub surname: String,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize, Event)]
pub struct UserUpdated {
    pub oid: Id<User>,
    pub name: String,
    pub surname: String,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize, Event)]
pub struct UserDeleted {
    pub oid: Id<User>,
}

impl From<&User> for UserCreated {
    fn from(user: &User) -> Self {
        Self {
            oid: user.oid,
            name: user.name.to_string(),
            surname: user.surname.to_string(),
        }
    }
}

impl From<&User> for UserUpdated {
    fn from(user: &User) -> Self {
        Self {
            oid: user.oid,
            name: user.name.to_string(),
            surname: user.surname.to_string(),
        }
    }
}
