use missive::{Id, Repository, UnitOfWork, UnitOfWorkFactory};

use crate::error::ValidationError;
use crate::persistence::UsersUnitOfWork;
use crate::users::User;
use crate::Error;

/// Reads a user. Views never write: their unit of work is always rolled back.
pub async fn get_user<F>(database: &F, oid: Id<User>) -> Result<User, Error>
where
    F: UnitOfWorkFactory<UnitOfWork = UsersUnitOfWork>,
{
    let mut unit_of_work = database.begin().await?;
    let user = unit_of_work.repositories().users.get(&oid).await;
    unit_of_work.rollback().await?;
    user?.ok_or(Error::UserNotFound(oid))
}

/// Lists a page of users, in creation order. Pages start at 1.
pub async fn list_users<F>(
    database: &F,
    page_number: usize,
    page_size: usize,
) -> Result<Vec<User>, Error>
where
    F: UnitOfWorkFactory<UnitOfWork = UsersUnitOfWork>,
{
    let offset = page_number
        .checked_sub(1)
        .and_then(|previous_pages| previous_pages.checked_mul(page_size))
        .filter(|_| page_size > 0)
        .ok_or(ValidationError::Page)?;

    let mut unit_of_work = database.begin().await?;
    let users = unit_of_work
        .repositories()
        .users
        .list(Some(offset), Some(page_size))
        .await;
    unit_of_work.rollback().await?;
    Ok(users?)
}

#[cfg(test)]
mod test {
    use missive::ErrorKind;

    use super::*;
    use crate::persistence::Database;
    use crate::users::{Password, UserName, UserSurname};

    async fn insert_users(database: &Database, count: usize) -> Result<Vec<User>, Error> {
        let mut unit_of_work = database.begin().await?;
        let mut users = Vec::new();
        for index in 0..count {
            let user = User::new(
                UserName::new(format!("User {index}"))?,
                UserSurname::new("Doe")?,
                Password::from_hash("hash")?,
            );
            users.push(unit_of_work.repositories().users.add(user).await?);
        }
        unit_of_work.commit().await?;
        Ok(users)
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() -> Result<(), Error> {
        let database = Database::default();
        insert_users(&database, 1).await?;

        let error = get_user(&database, Id(uuid::Uuid::new_v4()))
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::NotFound);
        Ok(())
    }

    #[tokio::test]
    async fn pages_split_users_in_creation_order() -> Result<(), Error> {
        let database = Database::default();
        let users = insert_users(&database, 5).await?;

        assert_eq!(list_users(&database, 1, 2).await?, users[0..2]);
        assert_eq!(list_users(&database, 3, 2).await?, users[4..]);
        assert!(list_users(&database, 4, 2).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn pages_start_at_one() {
        let database = Database::default();

        let error = list_users(&database, 0, 10).await.unwrap_err();

        assert_eq!(error.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn out_of_range_page_is_invalid_input() {
        let database = Database::default();

        for (page_number, page_size) in [(usize::MAX, 10), (3, usize::MAX), (1, 0)] {
            let error = list_users(&database, page_number, page_size)
                .await
                .unwrap_err();
            assert!(matches!(error, Error::Validation(ValidationError::Page)));
        }
    }

    #[tokio::test]
    async fn last_addressable_page_is_empty() -> Result<(), Error> {
        let database = Database::default();
        insert_users(&database, 3).await?;

        assert!(list_users(&database, usize::MAX, 1).await?.is_empty());
        Ok(())
    }
}
