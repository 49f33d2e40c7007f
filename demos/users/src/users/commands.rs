use missive::{command_handler, Command, Id, Repository};

use super::events::{UserCreated, UserDeleted, UserUpdated};
use super::{Password, User, UserName, UserSurname};
use crate::persistence::Transaction;
use crate::Error;

#[derive(Debug, Clone, Command)]
#[missive(output = User)]
pub struct CreateUser {
    pub name: String,
    pub surname: String,
    pub password: String,
}

#[derive(Debug, Clone, Command)]
#[missive(output = User)]
pub struct UpdateUser {
    pub oid: Id<User>,
    pub name: String,
    pub surname: String,
    pub password: String,
}

#[derive(Debug, Clone, Command)]
pub struct DeleteUser {
    pub oid: Id<User>,
}

#[command_handler]
pub async fn create_user(context: &mut Transaction, command: CreateUser) -> Result<User, Error> {
    let user = User::new(
        UserName::new(command.name)?,
        UserSurname::new(command.surname)?,
        Password::hash(&command.password)?,
    );
    let user = context.repositories().users.add(user).await?;
    log::info!("User {} created", user.oid);
    context.record(UserCreated::from(&user))?;
    Ok(user)
}

#[command_handler]
pub async fn update_user(context: &mut Transaction, command: UpdateUser) -> Result<User, Error> {
    let users = &mut context.repositories().users;
    let existing = users
        .get(&command.oid)
        .await?
        .ok_or(Error::UserNotFound(command.oid))?;
    let user = User {
        name: UserName::new(command.name)?,
        surname: UserSurname::new(command.surname)?,
        password: Password::hash(&command.password)?,
        ..existing
    };
    let user = users.update(&command.oid, user).await?;

    log::info!("User {} updated", user.oid);
    context.record(UserUpdated::from(&user))?;
    Ok(user)
}

#[command_handler]
pub async fn delete_user(context: &mut Transaction, command: DeleteUser) -> Result<(), Error> {
    let users = &mut context.repositories().users;
    if users.get(&command.oid).await?.is_none() {
        return Err(Error::UserNotFound(command.oid));
    }
    users.delete(&command.oid).await?;

    log::info!("User {} deleted", command.oid);
    context.record(UserDeleted { oid: command.oid })?;
    Ok(())
}
