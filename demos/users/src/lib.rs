//! A users service built on missive: commands create, update and delete users in an in-memory
//! database, and every change is published on a broker topic once committed.

mod app;
mod configuration;
mod error;
mod persistence;
mod security;
mod settings;
pub mod users;
mod views;

pub use app::UsersApp;
pub use configuration::{bootstrap, topics, UsersBus};
pub use error::{Error, ValidationError};
pub use persistence::{
    Database, Repositories, Transaction, UserRecord, UsersRepository, UsersUnitOfWork,
};
pub use security::{hash_password, verify_password};
pub use settings::{BrokerSettings, Settings};
pub use views::{get_user, list_users};
