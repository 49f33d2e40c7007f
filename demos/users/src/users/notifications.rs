use std::sync::Arc;

use missive::{event_handler, EventContext, Id, Publisher, TopicMap, TopicResolver};
use serde::Serialize;

use super::events::{UserCreated, UserDeleted, UserUpdated};
use super::User;
use crate::Error;

/// What event handlers need to notify the outside world.
pub struct Services {
    pub publisher: Arc<dyn Publisher>,
    pub topics: TopicMap,
}

pub type Notification = EventContext<Services>;

#[derive(Serialize)]
struct UserMessage<'a> {
    oid: Id<User>,
    name: &'a str,
    surname: &'a str,
}

#[derive(Serialize)]
struct UserRemovedMessage {
    oid: Id<User>,
}

async fn publish(context: &Notification, payload: impl Serialize) -> Result<(), Error> {
    let topic = context.topics.topic(context.handler())?;
    log::debug!("Publishing on {topic} for {}", context.handler());
    context
        .publisher
        .send_message(topic, serde_json::to_value(payload)?)
        .await?;
    Ok(())
}

#[event_handler]
pub async fn publish_user_created(
    context: &mut Notification,
    event: UserCreated,
) -> Result<(), Error> {
    let message = UserMessage {
        oid: event.oid,
        name: &event.name,
        surname: &event.surname,
    };
    publish(context, message).await
}

#[event_handler]
pub async fn publish_user_updated(
    context: &mut Notification,
    event: UserUpdated,
) -> Result<(), Error> {
    let message = UserMessage {
        oid: event.oid,
        name: &event.name,
        surname: &event.surname,
    };
    publish(context, message).await
}

#[event_handler]
pub async fn publish_user_deleted(
    context: &mut Notification,
    event: UserDeleted,
) -> Result<(), Error> {
    publish(context, UserRemovedMessage { oid: event.oid }).await
}
