use missive::{Bootstrap, EventHandler, MessageBus, TopicMap};

use crate::persistence::UsersUnitOfWork;
use crate::settings::BrokerSettings;
use crate::users::{
    create_user, delete_user, publish_user_created, publish_user_deleted, publish_user_updated,
    update_user, CreateUser, DeleteUser, Services, UpdateUser,
};
use crate::Error;

pub type UsersBus = MessageBus<UsersUnitOfWork, Services, Error>;

pub fn bootstrap() -> Bootstrap<UsersUnitOfWork, Services, Error> {
    Bootstrap::new()
        .command_handler(&create_user)
        .command_handler(&update_user)
        .command_handler(&delete_user)
        .event_handler(&publish_user_created)
        .event_handler(&publish_user_updated)
        .event_handler(&publish_user_deleted)
        .require::<CreateUser>()
        .require::<UpdateUser>()
        .require::<DeleteUser>()
}

/// Maps each publishing handler to its configured topic.
pub fn topics(settings: &BrokerSettings) -> TopicMap {
    TopicMap::new()
        .with(publish_user_created.name(), settings.user_create_topic.clone())
        .with(publish_user_updated.name(), settings.user_update_topic.clone())
        .with(publish_user_deleted.name(), settings.user_delete_topic.clone())
}
