use async_trait::async_trait;
use std::any::{type_name, Any};
use std::fmt::{Debug, Formatter};

use crate::Error;

/// A request to modify the system.
///
/// Exactly one [command handler](CommandHandler) must be registered for each command.
///
/// # Associated constant and type
///
/// * [NAME](Self::NAME) - the unique name of the command
/// * [Output](Self::Output) - the value returned by the handler once the command has been executed
///
/// # Example
///
/// ```
/// #[derive(Debug)]
/// pub struct AddBook {
///     pub title: String,
/// }
///
/// impl missive::Command for AddBook {
///     const NAME: &'static str = "add-book";
///     type Output = u64;
/// }
/// ```
pub trait Command: Sized + Send + Sync + 'static {
    /// The name of the command. Must be unique.
    const NAME: &'static str;

    /// The type of the value produced by the command handler.
    type Output: Send + 'static;
}

/// A command that has been boxed to be dispatched.
///
/// Can be created from a [Command].
#[derive(Debug)]
pub struct BoxedCommand {
    name: &'static str,
    command: Box<dyn Any + Send + Sync>,
}

impl BoxedCommand {
    /// Returns the name of the boxed command.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Tries to downcast the boxed command to a concrete [Command] implementation.
    pub fn downcast<C: Command>(self) -> Result<C, Error> {
        self.command
            .downcast()
            .map(|command| *command)
            .map_err(|_| Error::CommandDowncastError(type_name::<C>()))
    }
}

impl<C: Command> From<C> for BoxedCommand {
    fn from(command: C) -> Self {
        BoxedCommand {
            name: C::NAME,
            command: Box::new(command),
        }
    }
}

/// The boxed result of a command handler.
///
/// The [message bus](crate::MessageBus) downcasts it back to the [Output](Command::Output) of the
/// executed command.
pub struct CommandOutput(Box<dyn Any + Send>);

impl CommandOutput {
    /// Boxes the value produced by a command handler.
    pub fn new<T: Send + 'static>(output: T) -> Self {
        Self(Box::new(output))
    }

    /// Tries to downcast to the output of the given [Command].
    pub fn downcast<C: Command>(self) -> Result<C::Output, Error> {
        self.0
            .downcast()
            .map(|output| *output)
            .map_err(|_| Error::OutputDowncastError(C::NAME))
    }
}

impl Debug for CommandOutput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("CommandOutput(..)")
    }
}

/// Handles a command within a transactional context.
///
/// The handler mutates state through the repositories of the context and records the resulting
/// [events](crate::Event). It must not commit nor roll back: the
/// [message bus](crate::MessageBus) does it depending on the result.
///
/// # Type arguments
///
/// * `C` - the context for this handler
/// * `E` - the type of errors returned if the handler fails
#[async_trait]
pub trait CommandHandler<C, E>: Send + Sync {
    /// The name of the handled command.
    fn command_name(&self) -> &'static str;

    /// Executes a command, with the given context.
    async fn handle(&self, context: &mut C, command: BoxedCommand) -> Result<CommandOutput, E>;
}
