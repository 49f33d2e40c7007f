use missive::{Entity, Id};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

pub use self::commands::{
    create_user, delete_user, update_user, CreateUser, DeleteUser, UpdateUser,
};
pub use self::events::{UserCreated, UserDeleted, UserUpdated};
pub use self::notifications::{
    publish_user_created, publish_user_deleted, publish_user_updated, Notification, Services,
};
pub use self::values::{Password, UserName, UserSurname};

mod commands;
mod events;
mod notifications;
mod values;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct User {
    pub oid: Id<User>,
    pub name: UserName,
    pub surname: UserSurname,
    pub password: Password,
    pub created_at: OffsetDateTime,
}

impl User {
    pub fn new(name: UserName, surname: UserSurname, password: Password) -> Self {
        Self {
            oid: Id(Uuid::new_v4()),
            name,
            surname,
            password,
            created_at: OffsetDateTime::now_utc(),
        }
    }
}

impl Entity for User {
    type Id = Uuid;

    fn id(&self) -> Id<Self> {
        self.oid
    }
}

/// The public view of a user, without its password.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub oid: Id<User>,
    pub name: String,
    pub surname: String,
    pub created_at: OffsetDateTime,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            oid: user.oid,
            name: user.name.to_string(),
            surname: user.surname.to_string(),
            created_at: user.created_at,
        }
    }
}
