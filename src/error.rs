use std::fmt::{Display, Formatter};

/// Errors that can occur when wiring or running a [MessageBus](crate::MessageBus).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A command handler failed to downcast a [BoxedCommand](crate::BoxedCommand).
    #[error("Could not downcast command to type {0}")]
    CommandDowncastError(&'static str),
    /// The value returned by a command handler is not the output declared by its command.
    #[error("Could not downcast the output of command {0}")]
    OutputDowncastError(&'static str),
    /// An error occurred when serializing or deserializing an [Event](crate::Event).
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    /// A [Command](crate::Command) was dispatched but the message bus does not have a
    /// corresponding [CommandHandler](crate::CommandHandler).
    #[error("Missing command handler for command {0}")]
    MissingCommandHandler(&'static str),
    /// Two command handlers were registered for the same command.
    #[error("Command {0} already has a command handler")]
    DuplicateCommandHandler(&'static str),
    /// The same event handler was registered twice for one event.
    #[error("Event handler {handler} is registered twice for event {event}")]
    DuplicateEventHandler {
        /// The name of the event.
        event: &'static str,
        /// The name of the event handler.
        handler: &'static str,
    },
    /// A unit of work could not begin, commit or roll back.
    #[error("Unit of work error: {0}")]
    UnitOfWork(String),
    /// A stored value could not be converted back to its domain representation.
    #[error("Conversion error: {0}")]
    Conversion(String),
    /// A message was sent to a topic for which no producer is configured.
    #[error("Unknown topic {0}")]
    UnknownTopic(String),
    /// No topic is configured for an event handler.
    #[error("No topic configured for event handler {0}")]
    MissingTopic(&'static str),
    /// The message broker failed to deliver a message.
    #[error("Broker error: {0}")]
    Broker(String),
    /// At least one event handler failed while the bus was dispatching events.
    #[error("{} event handler(s) failed: {}", .0.len(), HandlerFailures(.0))]
    EventHandlers(Vec<HandlerFailure>),
}

impl Error {
    /// The kind of the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Broker(_) | Self::UnitOfWork(_) => ErrorKind::Unavailable,
            _ => ErrorKind::Internal,
        }
    }
}

/// Broad classification of errors, allowing callers to branch without inspecting messages.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    /// The caller provided malformed input.
    InvalidInput,
    /// The targeted resource does not exist.
    NotFound,
    /// A fault in the system or its configuration.
    Internal,
    /// A transient failure of an external dependency. The operation may be retried.
    Unavailable,
}

/// The failure of one event handler for one event.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct HandlerFailure {
    /// The name of the failed event handler.
    pub handler: &'static str,
    /// The name of the event being handled.
    pub event: &'static str,
    /// The error message returned by the handler.
    pub message: String,
}

impl Display for HandlerFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} on {}: {}", self.handler, self.event, self.message)
    }
}

struct HandlerFailures<'a>(&'a [HandlerFailure]);

impl Display for HandlerFailures<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (index, failure) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            failure.fmt(f)?;
        }
        Ok(())
    }
}
