//! # Missive
//!
//! Missive is a Rust library to dispatch commands and events in a transactional way.
//!
//! ## Concepts
//!
//! A [Command] is a request to modify the system. It is executed by exactly one
//! [command handler](CommandHandler), inside a [UnitOfWork] grouping the
//! [repositories](Repository) it works with. While mutating state, the handler records
//! [events](Event): facts describing what happened.
//!
//! Events are what other parts of the system react to, through [event handlers](EventHandler). An
//! event handler typically notifies external systems with a [Publisher], and can record further
//! events.
//!
//! ## Message bus
//!
//! The [MessageBus] is the main entry point. It takes a command, executes its handler and commits
//! the unit of work. Only then are the recorded events dispatched to their handlers, oldest first,
//! until no more events are recorded. If the handler fails or the commit does not succeed, the
//! unit of work is rolled back and no event is dispatched: side effects are never emitted for a
//! change that did not happen.
//!
//! A bus is created at startup by a [Bootstrap], which validates the handlers.
//!
//! ## Features
//!
//! The `derive` feature, which is enabled by default, provides derive macros for [Event] and
//! [Command], as well as attribute macros to easily create [command handlers](CommandHandler) and
//! [event handlers](EventHandler).

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![cfg_attr(__docs, feature(doc_auto_cfg))]

extern crate self as missive;

mod bootstrap;
mod command;
mod entity;
mod error;
mod event;
pub mod memory;
mod message_bus;
mod publisher;
mod unit_of_work;

pub use bootstrap::Bootstrap;
pub use command::{BoxedCommand, Command, CommandHandler, CommandOutput};
pub use entity::{Entity, Id};
pub use error::{Error, ErrorKind, HandlerFailure};
pub use event::{Event, EventBuffer, EventContext, EventHandler, SerializedEvent};
pub use message_bus::{CascadePolicy, MessageBus};
pub use publisher::{Publisher, TopicMap, TopicResolver};
pub use unit_of_work::{CommandContext, Repository, UnitOfWork, UnitOfWorkFactory};

#[cfg(feature = "derive")]
pub use missive_macros::{command_handler, event_handler, Command, Event};

#[cfg(feature = "derive")]
#[doc(hidden)]
pub use async_trait::async_trait;
