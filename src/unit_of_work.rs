use async_trait::async_trait;

use crate::{Entity, Error, Event, EventBuffer, Id};

/// A transactional scope bundling the repositories used by one command.
///
/// A unit of work is created by a [UnitOfWorkFactory] when the
/// [message bus](crate::MessageBus) dispatches a command, and ends either with
/// [commit](Self::commit) or [rollback](Self::rollback). Every repository it exposes observes the
/// same transaction.
///
/// Dropping a unit of work that was neither committed nor rolled back must discard its changes,
/// exactly like a rollback. This is what happens when the future handling a command is cancelled.
#[async_trait]
pub trait UnitOfWork: Sized + Send {
    /// The set of repositories bound to the transaction.
    type Repositories: Send;

    /// Gives access to the repositories bound to the transaction.
    fn repositories(&mut self) -> &mut Self::Repositories;

    /// Makes all the changes durable.
    async fn commit(self) -> Result<(), Error>;

    /// Discards all the changes.
    async fn rollback(self) -> Result<(), Error>;
}

/// Begins new [units of work](UnitOfWork).
#[async_trait]
pub trait UnitOfWorkFactory: Send + Sync {
    /// The type of the created units of work.
    type UnitOfWork: UnitOfWork;

    /// Begins a transaction and returns a unit of work bound to it.
    async fn begin(&self) -> Result<Self::UnitOfWork, Error>;
}

/// Stores and retrieves [entities](Entity) within a [UnitOfWork].
///
/// A missing entity is never an error: [get](Self::get) returns [None].
#[async_trait]
pub trait Repository<T: Entity>: Send {
    /// Adds a new entity and returns it as stored.
    async fn add(&mut self, entity: T) -> Result<T, Error>;

    /// Retrieves an entity by id.
    async fn get(&mut self, id: &Id<T>) -> Result<Option<T>, Error>;

    /// Replaces the entity with the given id and returns it as stored.
    async fn update(&mut self, id: &Id<T>, entity: T) -> Result<T, Error>;

    /// Deletes the entity with the given id. Deleting a missing entity does nothing.
    async fn delete(&mut self, id: &Id<T>) -> Result<(), Error>;

    /// Lists entities in storage order, skipping `offset` entities and returning at most `limit`.
    async fn list(&mut self, offset: Option<usize>, limit: Option<usize>)
        -> Result<Vec<T>, Error>;
}

/// The context given to a [command handler](crate::CommandHandler): a [UnitOfWork] and the
/// events recorded by the handler.
///
/// Recorded events only reach the [message bus](crate::MessageBus) cascade if the unit of work
/// commits. They are dropped with the context otherwise.
pub struct CommandContext<W> {
    unit_of_work: W,
    events: EventBuffer,
}

impl<W: UnitOfWork> CommandContext<W> {
    /// Creates a context for a freshly begun unit of work.
    pub fn new(unit_of_work: W) -> Self {
        Self {
            unit_of_work,
            events: EventBuffer::new(),
        }
    }

    /// Gives access to the repositories of the unit of work.
    pub fn repositories(&mut self) -> &mut W::Repositories {
        self.unit_of_work.repositories()
    }

    /// Records an event, to be dispatched once the unit of work has committed.
    pub fn record(&mut self, event: impl Event) -> Result<(), Error> {
        self.events.add(event)
    }

    /// The events recorded so far.
    pub fn events(&self) -> &EventBuffer {
        &self.events
    }

    /// Separates the unit of work from the recorded events.
    pub fn into_parts(self) -> (W, EventBuffer) {
        (self.unit_of_work, self.events)
    }
}
