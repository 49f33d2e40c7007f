use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

use crate::Error;

/// Sends messages to an external broker.
///
/// Event handlers use a publisher to notify other systems. The publisher owns its connections and
/// must be [started](Self::start) before sending messages and [stopped](Self::stop) when the
/// application shuts down.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Connects to the broker.
    async fn start(&self) -> Result<(), Error>;

    /// Sends a message to a topic. Fails with [Error::UnknownTopic] if no producer is configured for
    /// the topic.
    async fn send_message(&self, topic: &str, payload: Value) -> Result<(), Error>;

    /// Disconnects from the broker.
    async fn stop(&self) -> Result<(), Error>;
}

/// Finds the topic an [event handler](crate::EventHandler) publishes to.
pub trait TopicResolver: Send + Sync {
    /// Returns the topic for the event handler with the given name.
    fn topic(&self, handler: &'static str) -> Result<&str, Error>;
}

/// A [TopicResolver] backed by a map from handler names to topics.
///
/// # Example
///
/// ```
/// let topics = missive::TopicMap::new()
///     .with("publish-book-added", "book-added")
///     .with("publish-book-removed", "book-removed");
/// ```
#[derive(Debug, Clone, Default)]
pub struct TopicMap(HashMap<&'static str, String>);

impl TopicMap {
    /// Creates an empty [TopicMap].
    pub fn new() -> Self {
        Self::default()
    }

    /// Associates a handler with a topic. Takes ownership and returns the map to allow chaining.
    pub fn with(mut self, handler: &'static str, topic: impl Into<String>) -> Self {
        self.0.insert(handler, topic.into());
        self
    }

    /// The configured topics.
    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.0.values().map(String::as_str)
    }
}

impl TopicResolver for TopicMap {
    fn topic(&self, handler: &'static str) -> Result<&str, Error> {
        self.0
            .get(handler)
            .map(String::as_str)
            .ok_or(Error::MissingTopic(handler))
    }
}
