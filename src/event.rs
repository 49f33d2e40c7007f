use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::VecDeque;
use std::ops::Deref;
use std::sync::Arc;

use crate::Error;

/// An event represents something that already happened.
///
/// It is serialized using the `serde` crate when recorded, so it can be buffered alongside events
/// of other types and handled by independent parts of the system. An event must thus implement
/// [Serialize] and [Deserialize](serde::Deserialize).
///
/// # Associated constant
///
/// * [NAME](Self::NAME) - the unique name of the event
///
/// # Example
///
/// ```
/// #[derive(serde::Serialize, serde::Deserialize)]
/// struct BookAdded {
///     id: u64,
///     title: String,
/// }
///
/// impl missive::Event for BookAdded {
///     const NAME: &'static str = "book-added";
/// }
/// ```
pub trait Event: Serialize + DeserializeOwned {
    /// The name of the event. Must be unique.
    const NAME: &'static str;

    /// Serializes an event into a [SerializedEvent].
    fn serialize(self) -> Result<SerializedEvent, Error> {
        Ok(SerializedEvent {
            name: Self::NAME,
            value: serde_json::to_value(self)?,
        })
    }
}

/// An event that has been serialized to be buffered.
///
/// Can be created from an [Event].
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SerializedEvent {
    name: &'static str,
    value: Value,
}

impl SerializedEvent {
    /// Tries to deserialize to a concrete [Event].
    pub fn deserialize<E: Event>(self) -> Result<E, Error> {
        Ok(serde_json::from_value(self.value)?)
    }

    /// The name of the serialized event
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The serialized value of the event
    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// An ordered queue of events waiting to be dispatched.
///
/// Events are appended with [add](Self::add) and taken out, oldest first, with
/// [drain](Self::drain). Each event is returned by exactly one drain.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct EventBuffer(VecDeque<SerializedEvent>);

impl EventBuffer {
    /// Creates an empty [EventBuffer].
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes an event and appends it to the buffer.
    pub fn add(&mut self, event: impl Event) -> Result<(), Error> {
        self.0.push_back(event.serialize()?);
        Ok(())
    }

    /// Appends an already serialized event.
    pub fn push(&mut self, event: SerializedEvent) {
        self.0.push_back(event);
    }

    /// Returns all the buffered events in the order they were added, and empties the buffer.
    pub fn drain(&mut self) -> Vec<SerializedEvent> {
        self.0.drain(..).collect()
    }

    /// The number of buffered events.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the buffer holds no event.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the buffered events without removing them.
    pub fn iter(&self) -> impl Iterator<Item = &SerializedEvent> {
        self.0.iter()
    }
}

impl Extend<SerializedEvent> for EventBuffer {
    fn extend<T: IntoIterator<Item = SerializedEvent>>(&mut self, iter: T) {
        self.0.extend(iter)
    }
}

impl IntoIterator for EventBuffer {
    type Item = SerializedEvent;
    type IntoIter = <VecDeque<SerializedEvent> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Reacts to dispatched [events](Event).
///
/// Can record new events, that are dispatched after the current ones.
///
/// # Type arguments
///
/// * `C` - the context for this handler
/// * `E` - the type of errors returned if the handler fails
#[async_trait]
pub trait EventHandler<C, E>: Send + Sync {
    /// The name of the handler. Identifies the handler, for instance to resolve the topic it
    /// publishes to.
    fn name(&self) -> &'static str;

    /// The names of the handled events.
    fn event_names(&self) -> &[&'static str];

    /// Handles an event with the given context.
    async fn handle(&self, context: &mut C, event: &SerializedEvent) -> Result<(), E>;
}

/// The context given to an [event handler](EventHandler).
///
/// Dereferences to the application dependencies shared by all event handlers, and buffers the
/// events recorded by the handler. Those events are dispatched only if the handler succeeds.
pub struct EventContext<D> {
    dependencies: Arc<D>,
    handler: &'static str,
    events: EventBuffer,
}

impl<D> EventContext<D> {
    /// Creates a context for one execution of the named handler.
    pub fn new(dependencies: Arc<D>, handler: &'static str) -> Self {
        Self {
            dependencies,
            handler,
            events: EventBuffer::new(),
        }
    }

    /// The name of the event handler being executed.
    pub fn handler(&self) -> &'static str {
        self.handler
    }

    /// Records a follow-up event.
    pub fn record(&mut self, event: impl Event) -> Result<(), Error> {
        self.events.add(event)
    }

    /// Takes the events recorded by the handler.
    pub fn into_events(self) -> EventBuffer {
        self.events
    }
}

impl<D> Deref for EventContext<D> {
    type Target = D;

    fn deref(&self) -> &Self::Target {
        &self.dependencies
    }
}
