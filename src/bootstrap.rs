use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::ops::{Add, AddAssign};
use std::sync::Arc;

use crate::message_bus::Registry;
use crate::{
    CascadePolicy, Command, CommandContext, CommandHandler, Error, EventContext, EventHandler,
    MessageBus, UnitOfWorkFactory,
};

/// The startup wiring of a [MessageBus].
///
/// Collects command handlers and event handlers, then validates them and produces a ready bus with
/// [message_bus()](Self::message_bus). Implements [Add] and [AddAssign] for composition of the
/// wirings of several modules.
///
/// # Type arguments
///
/// * `W` - the [unit of work](crate::UnitOfWork) given to command handlers
/// * `D` - the dependencies given to event handlers
/// * `E` - the type of errors returned by handlers
pub struct Bootstrap<W, D, E>
where
    W: 'static,
    D: 'static,
    E: 'static,
{
    command_handlers: Vec<&'static dyn CommandHandler<CommandContext<W>, E>>,
    event_handlers: Vec<&'static dyn EventHandler<EventContext<D>, E>>,
    required_commands: Vec<&'static str>,
    cascade_policy: CascadePolicy,
}

impl<W, D, E> Bootstrap<W, D, E> {
    /// Creates a new empty [Bootstrap].
    pub fn new() -> Self {
        Self {
            command_handlers: Vec::new(),
            event_handlers: Vec::new(),
            required_commands: Vec::new(),
            cascade_policy: CascadePolicy::default(),
        }
    }

    /// Adds a command handler. Takes ownership and returns the bootstrap to allow chaining.
    pub fn command_handler(
        mut self,
        handler: &'static dyn CommandHandler<CommandContext<W>, E>,
    ) -> Self {
        self.command_handlers.push(handler);
        self
    }

    /// Adds an event handler. Takes ownership and returns the bootstrap to allow chaining.
    ///
    /// Handlers of the same event are executed in registration order.
    pub fn event_handler(mut self, handler: &'static dyn EventHandler<EventContext<D>, E>) -> Self {
        self.event_handlers.push(handler);
        self
    }

    /// Declares a command the application dispatches. Building the bus fails if no handler is
    /// registered for it.
    pub fn require<C: Command>(mut self) -> Self {
        self.required_commands.push(C::NAME);
        self
    }

    /// Sets how event handler failures are handled. Defaults to [CascadePolicy::Isolate].
    pub fn cascade_policy(mut self, policy: CascadePolicy) -> Self {
        self.cascade_policy = policy;
        self
    }

    /// Validates the handlers and creates a [MessageBus] using the given unit of work factory and
    /// event handler dependencies.
    ///
    /// Fails if two command handlers handle the same command, if an event handler is registered
    /// twice for the same event, or if a [required](Self::require) command has no handler.
    pub fn message_bus<U>(
        self,
        unit_of_work: U,
        dependencies: impl Into<Arc<D>>,
    ) -> Result<MessageBus<W, D, E>, Error>
    where
        U: UnitOfWorkFactory<UnitOfWork = W> + 'static,
    {
        let mut command_handlers = HashMap::new();
        for handler in self.command_handlers {
            match command_handlers.entry(handler.command_name()) {
                Entry::Occupied(_) => {
                    return Err(Error::DuplicateCommandHandler(handler.command_name()))
                }
                Entry::Vacant(entry) => {
                    entry.insert(handler);
                }
            }
        }

        if let Some(command) = self
            .required_commands
            .into_iter()
            .find(|command| !command_handlers.contains_key(command))
        {
            return Err(Error::MissingCommandHandler(command));
        }

        let mut event_handlers: HashMap<_, Vec<&'static dyn EventHandler<EventContext<D>, E>>> =
            HashMap::new();
        for handler in self.event_handlers {
            for event in handler.event_names() {
                let handlers = event_handlers.entry(*event).or_default();
                if handlers
                    .iter()
                    .any(|registered| registered.name() == handler.name())
                {
                    return Err(Error::DuplicateEventHandler {
                        event: *event,
                        handler: handler.name(),
                    });
                }
                handlers.push(handler);
            }
        }

        log::debug!(
            "Message bus ready with {} command handler(s) and handlers for {} event(s)",
            command_handlers.len(),
            event_handlers.len(),
        );

        Ok(MessageBus::new(
            Registry {
                command_handlers,
                event_handlers,
                cascade_policy: self.cascade_policy,
            },
            Arc::new(unit_of_work),
            dependencies.into(),
        ))
    }
}

impl<W, D, E> Default for Bootstrap<W, D, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W, D, E> Add for Bootstrap<W, D, E> {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self::Output {
        self += rhs;
        self
    }
}

/// Handlers and required commands of both sides are kept. The composed bootstrap uses
/// [CascadePolicy::FailFast] if either side does.
impl<W, D, E> AddAssign for Bootstrap<W, D, E> {
    fn add_assign(&mut self, rhs: Self) {
        self.command_handlers.extend(rhs.command_handlers);
        self.event_handlers.extend(rhs.event_handlers);
        self.required_commands.extend(rhs.required_commands);
        if rhs.cascade_policy == CascadePolicy::FailFast {
            self.cascade_policy = CascadePolicy::FailFast;
        }
    }
}
