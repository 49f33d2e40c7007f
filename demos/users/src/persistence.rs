use async_trait::async_trait;
use missive::memory::{Table, TableTransaction};
use missive::{CommandContext, Entity, Id, Repository, UnitOfWork, UnitOfWorkFactory};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::users::{Password, User, UserName, UserSurname};

/// The stored form of a [User].
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct UserRecord {
    pub oid: Uuid,
    pub name: String,
    pub surname: String,
    pub password: String,
    pub created_at: OffsetDateTime,
}

impl Entity for UserRecord {
    type Id = Uuid;

    fn id(&self) -> Id<Self> {
        Id(self.oid)
    }
}

impl From<User> for UserRecord {
    fn from(user: User) -> Self {
        Self {
            oid: user.oid.0,
            name: user.name.into(),
            surname: user.surname.into(),
            password: user.password.as_hash().to_owned(),
            created_at: user.created_at,
        }
    }
}

impl TryFrom<UserRecord> for User {
    type Error = missive::Error;

    fn try_from(record: UserRecord) -> Result<Self, Self::Error> {
        let conversion_error = |error: ValidationError| {
            missive::Error::Conversion(format!("user {}: {error}", record.oid))
        };
        Ok(Self {
            oid: Id(record.oid),
            name: UserName::new(record.name.clone()).map_err(conversion_error)?,
            surname: UserSurname::new(record.surname.clone()).map_err(conversion_error)?,
            password: Password::from_hash(record.password.clone()).map_err(conversion_error)?,
            created_at: record.created_at,
        })
    }
}

/// Reads and writes [users](User), converting them from and to [records](UserRecord).
pub struct UsersRepository(TableTransaction<UserRecord>);

impl UsersRepository {
    pub async fn find_by_full_name(
        &mut self,
        name: &str,
        surname: &str,
    ) -> Result<Option<User>, missive::Error> {
        self.0
            .list(None, None)
            .await?
            .into_iter()
            .find(|record| record.name == name && record.surname == surname)
            .map(User::try_from)
            .transpose()
    }
}

#[async_trait]
impl Repository<User> for UsersRepository {
    async fn add(&mut self, user: User) -> Result<User, missive::Error> {
        self.0.add(user.into()).await?.try_into()
    }

    async fn get(&mut self, id: &Id<User>) -> Result<Option<User>, missive::Error> {
        self.0.get(&Id(id.0)).await?.map(User::try_from).transpose()
    }

    async fn update(&mut self, id: &Id<User>, user: User) -> Result<User, missive::Error> {
        self.0.update(&Id(id.0), user.into()).await?.try_into()
    }

    async fn delete(&mut self, id: &Id<User>) -> Result<(), missive::Error> {
        self.0.delete(&Id(id.0)).await
    }

    async fn list(
        &mut self,
        offset: Option<usize>,
        limit: Option<usize>,
    ) -> Result<Vec<User>, missive::Error> {
        self.0
            .list(offset, limit)
            .await?
            .into_iter()
            .map(User::try_from)
            .collect()
    }
}

pub struct Repositories {
    pub users: UsersRepository,
}

pub struct UsersUnitOfWork {
    repositories: Repositories,
}

#[async_trait]
impl UnitOfWork for UsersUnitOfWork {
    type Repositories = Repositories;

    fn repositories(&mut self) -> &mut Repositories {
        &mut self.repositories
    }

    async fn commit(self) -> Result<(), missive::Error> {
        self.repositories.users.0.commit()
    }

    async fn rollback(self) -> Result<(), missive::Error> {
        self.repositories.users.0.rollback();
        Ok(())
    }
}

/// The in-memory storage of the application. Clones share the same data.
#[derive(Clone, Default)]
pub struct Database {
    users: Table<UserRecord>,
}

impl Database {
    pub fn user_count(&self) -> Result<usize, missive::Error> {
        self.users.len()
    }
}

#[async_trait]
impl UnitOfWorkFactory for Database {
    type UnitOfWork = UsersUnitOfWork;

    async fn begin(&self) -> Result<UsersUnitOfWork, missive::Error> {
        Ok(UsersUnitOfWork {
            repositories: Repositories {
                users: UsersRepository(self.users.begin()?),
            },
        })
    }
}

pub type Transaction = CommandContext<UsersUnitOfWork>;
