use std::sync::Arc;

use missive::{Command, Id, Publisher};

use crate::configuration::{bootstrap, topics, UsersBus};
use crate::persistence::Database;
use crate::settings::Settings;
use crate::users::{Services, User};
use crate::{views, Error};

/// The users application: a message bus over an in-memory database, publishing notifications
/// through the given [Publisher].
pub struct UsersApp {
    database: Database,
    publisher: Arc<dyn Publisher>,
    bus: UsersBus,
}

impl UsersApp {
    /// Starts the publisher and builds the message bus.
    pub async fn start(settings: &Settings, publisher: Arc<dyn Publisher>) -> Result<Self, Error> {
        publisher.start().await?;
        let database = Database::default();
        let services = Services {
            publisher: publisher.clone(),
            topics: topics(&settings.broker),
        };
        let bus = bootstrap().message_bus(database.clone(), services)?;
        log::info!("Users application started");
        Ok(Self {
            database,
            publisher,
            bus,
        })
    }

    pub async fn execute<C: Command>(&self, command: C) -> Result<C::Output, Error> {
        self.bus.handle(command).await
    }

    pub async fn get_user(&self, oid: Id<User>) -> Result<User, Error> {
        views::get_user(&self.database, oid).await
    }

    pub async fn list_users(
        &self,
        page_number: usize,
        page_size: usize,
    ) -> Result<Vec<User>, Error> {
        views::list_users(&self.database, page_number, page_size).await
    }

    /// Stops the publisher.
    pub async fn close(self) -> Result<(), Error> {
        self.publisher.stop().await?;
        log::info!("Users application stopped");
        Ok(())
    }
}
