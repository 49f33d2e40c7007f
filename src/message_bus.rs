use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;

use crate::{
    BoxedCommand, Command, CommandContext, CommandHandler, Error, EventBuffer, EventContext,
    EventHandler, HandlerFailure, SerializedEvent, UnitOfWork, UnitOfWorkFactory,
};

/// What the [MessageBus] does when an event handler fails.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum CascadePolicy {
    /// Every remaining event handler is still executed. Once all events have been dispatched, the
    /// failures are returned together as [Error::EventHandlers], in place of the command output.
    #[default]
    Isolate,
    /// Dispatching stops at the first failure, whose error is returned. Events not yet dispatched
    /// are lost.
    FailFast,
}

pub(crate) struct Registry<W, D, E>
where
    W: 'static,
    D: 'static,
    E: 'static,
{
    pub(crate) command_handlers:
        HashMap<&'static str, &'static dyn CommandHandler<CommandContext<W>, E>>,
    pub(crate) event_handlers:
        HashMap<&'static str, Vec<&'static dyn EventHandler<EventContext<D>, E>>>,
    pub(crate) cascade_policy: CascadePolicy,
}

/// Executes a command in a unit of work and dispatches the resulting [events](crate::Event).
///
/// For each command, the bus begins a [UnitOfWork] and runs the command handler. If the handler
/// succeeds the unit of work is committed, otherwise it is rolled back and the error is returned.
/// Only after a successful commit are the recorded events dispatched to their
/// [event handlers](EventHandler). Those handlers can record new events, which are dispatched after
/// the current ones. The process continues until no more events are recorded.
///
/// The bus keeps no state between commands: every call to [handle()](Self::handle) uses its own
/// unit of work and event buffer, so a bus can be cloned and used concurrently.
///
/// Created with a [Bootstrap](crate::Bootstrap).
pub struct MessageBus<W, D, E>
where
    W: 'static,
    D: 'static,
    E: 'static,
{
    registry: Arc<Registry<W, D, E>>,
    unit_of_work: Arc<dyn UnitOfWorkFactory<UnitOfWork = W>>,
    dependencies: Arc<D>,
}

impl<W, D, E> MessageBus<W, D, E> {
    pub(crate) fn new(
        registry: Registry<W, D, E>,
        unit_of_work: Arc<dyn UnitOfWorkFactory<UnitOfWork = W>>,
        dependencies: Arc<D>,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            unit_of_work,
            dependencies,
        }
    }

    /// The dependencies given to event handlers.
    pub fn dependencies(&self) -> &D {
        &self.dependencies
    }

    /// The names of the handlers of an event, in execution order.
    pub fn event_handler_names(&self, event_name: &str) -> Vec<&'static str> {
        self.registry
            .event_handlers
            .get(event_name)
            .map(|handlers| handlers.iter().map(|handler| handler.name()).collect())
            .unwrap_or_default()
    }
}

impl<W, D, E> MessageBus<W, D, E>
where
    W: UnitOfWork,
    D: Send + Sync,
    E: From<Error> + Display + Send,
{
    /// Executes a [command](Command) and returns the output of its handler, once all the
    /// resulting events have been dispatched.
    ///
    /// If the command handler fails, or if the unit of work cannot be committed, the error is
    /// returned and no event is dispatched. Failures of event handlers are handled according to the
    /// [CascadePolicy].
    ///
    /// An event handler failure is reported after the commit: the changes of the command are kept,
    /// but its output is not returned. Callers that need it can read the committed state back.
    pub async fn handle<C>(&self, command: C) -> Result<C::Output, E>
    where
        C: Command,
    {
        let handler = self.get_command_handler(C::NAME)?;
        let mut context = CommandContext::new(self.unit_of_work.begin().await?);

        log::debug!("Handling command {}", C::NAME);
        let result = handler
            .handle(&mut context, BoxedCommand::from(command))
            .await;
        let (unit_of_work, events) = context.into_parts();

        let output = match result {
            Ok(output) => output,
            Err(error) => {
                log::debug!(
                    "Command {} failed, discarding {} recorded event(s)",
                    C::NAME,
                    events.len(),
                );
                if let Err(rollback_error) = unit_of_work.rollback().await {
                    log::error!("Could not roll back command {}: {rollback_error}", C::NAME);
                }
                return Err(error);
            }
        };

        unit_of_work.commit().await?;
        log::debug!("Command {} committed with {} event(s)", C::NAME, events.len());

        self.dispatch(events).await?;
        Ok(output.downcast::<C>()?)
    }

    fn get_command_handler(
        &self,
        command_name: &'static str,
    ) -> Result<&'static dyn CommandHandler<CommandContext<W>, E>, Error> {
        self.registry
            .command_handlers
            .get(command_name)
            .ok_or(Error::MissingCommandHandler(command_name))
            .copied()
    }

    async fn dispatch(&self, mut buffer: EventBuffer) -> Result<(), E> {
        let mut failures = Vec::new();
        loop {
            let events = buffer.drain();
            if events.is_empty() {
                break;
            }
            for event in events {
                self.handle_event(&event, &mut buffer, &mut failures).await?;
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::EventHandlers(failures).into())
        }
    }

    async fn handle_event(
        &self,
        event: &SerializedEvent,
        buffer: &mut EventBuffer,
        failures: &mut Vec<HandlerFailure>,
    ) -> Result<(), E> {
        let Some(handlers) = self.registry.event_handlers.get(event.name()) else {
            log::warn!(
                "An event of type {} was recorded, but no event handler was found to handle it.",
                event.name(),
            );
            return Ok(());
        };

        for handler in handlers {
            let mut context = EventContext::new(self.dependencies.clone(), handler.name());
            match handler.handle(&mut context, event).await {
                Ok(()) => buffer.extend(context.into_events()),
                Err(error) => match self.registry.cascade_policy {
                    CascadePolicy::FailFast => return Err(error),
                    CascadePolicy::Isolate => {
                        log::error!(
                            "Event handler {} failed on event {}: {error}",
                            handler.name(),
                            event.name(),
                        );
                        failures.push(HandlerFailure {
                            handler: handler.name(),
                            event: event.name(),
                            message: error.to_string(),
                        });
                    }
                },
            }
        }
        Ok(())
    }
}

impl<W, D, E> Clone for MessageBus<W, D, E> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            unit_of_work: self.unit_of_work.clone(),
            dependencies: self.dependencies.clone(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{command_handler, event_handler, Bootstrap};
    use async_trait::async_trait;
    use serde::{Deserialize, Serialize};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// A counter committed by units of work, and a log of what event handlers saw.
    #[derive(Default)]
    struct Store {
        committed: Mutex<i64>,
        commits: AtomicUsize,
        rollbacks: AtomicUsize,
        fail_commit: bool,
        handled: Mutex<Vec<String>>,
        invocations: AtomicUsize,
    }

    impl Store {
        fn committed(&self) -> i64 {
            *self.committed.lock().unwrap()
        }

        fn handled(&self) -> Vec<String> {
            self.handled.lock().unwrap().clone()
        }

        fn log(&self, entry: impl Into<String>) {
            self.handled.lock().unwrap().push(entry.into());
        }
    }

    struct Counter {
        value: i64,
    }

    struct CounterTransaction {
        store: Arc<Store>,
        counter: Counter,
    }

    #[async_trait]
    impl UnitOfWork for CounterTransaction {
        type Repositories = Counter;

        fn repositories(&mut self) -> &mut Counter {
            &mut self.counter
        }

        async fn commit(self) -> Result<(), Error> {
            if self.store.fail_commit {
                return Err(Error::UnitOfWork("connection lost".into()));
            }
            *self.store.committed.lock().unwrap() = self.counter.value;
            self.store.commits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn rollback(self) -> Result<(), Error> {
            self.store.rollbacks.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct CounterDatabase(Arc<Store>);

    #[async_trait]
    impl UnitOfWorkFactory for CounterDatabase {
        type UnitOfWork = CounterTransaction;

        async fn begin(&self) -> Result<CounterTransaction, Error> {
            Ok(CounterTransaction {
                store: self.0.clone(),
                counter: Counter {
                    value: self.0.committed(),
                },
            })
        }
    }

    #[derive(Debug, thiserror::Error)]
    enum TestError {
        #[error("{0}")]
        Bus(#[from] Error),
        #[error("rejected: {0}")]
        Rejected(&'static str),
    }

    type Context = CommandContext<CounterTransaction>;
    type Events = EventContext<Store>;

    #[derive(Debug)]
    struct Increment(i64);

    impl Command for Increment {
        const NAME: &'static str = "increment";
        type Output = i64;
    }

    #[derive(Debug)]
    struct IncrementThenFail(i64);

    impl Command for IncrementThenFail {
        const NAME: &'static str = "increment-then-fail";
        type Output = ();
    }

    #[derive(Debug)]
    struct SlowIncrement(i64);

    impl Command for SlowIncrement {
        const NAME: &'static str = "slow-increment";
        type Output = ();
    }

    #[derive(Debug)]
    struct Unregistered;

    impl Command for Unregistered {
        const NAME: &'static str = "unregistered";
        type Output = ();
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct Incremented {
        by: i64,
    }

    impl crate::Event for Incremented {
        const NAME: &'static str = "incremented";
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct Echoed {
        by: i64,
    }

    impl crate::Event for Echoed {
        const NAME: &'static str = "echoed";
    }

    #[command_handler]
    async fn increment(context: &mut Context, Increment(by): Increment) -> Result<i64, TestError> {
        context.repositories().value += by;
        context.record(Incremented { by })?;
        context.record(Incremented { by: by * 10 })?;
        Ok(context.repositories().value)
    }

    #[command_handler]
    async fn increment_then_fail(
        context: &mut Context,
        IncrementThenFail(by): IncrementThenFail,
    ) -> Result<(), TestError> {
        context.repositories().value += by;
        context.record(Incremented { by })?;
        Err(TestError::Rejected("too late"))
    }

    #[command_handler]
    async fn slow_increment(
        context: &mut Context,
        SlowIncrement(by): SlowIncrement,
    ) -> Result<(), TestError> {
        context.repositories().value += by;
        context.record(Incremented { by })?;
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(())
    }

    #[event_handler]
    async fn log_increment(context: &mut Events, event: Incremented) -> Result<(), TestError> {
        context.log(format!("log:{}", event.by));
        Ok(())
    }

    #[event_handler]
    async fn echo_increment(context: &mut Events, event: Incremented) -> Result<(), TestError> {
        context.log(format!("echo:{}", event.by));
        context.record(Echoed { by: event.by })?;
        Ok(())
    }

    #[event_handler]
    async fn log_echo(context: &mut Events, event: Echoed) -> Result<(), TestError> {
        context.log(format!("echoed:{}", event.by));
        Ok(())
    }

    #[event_handler]
    async fn reject_small_increment(
        context: &mut Events,
        event: Incremented,
    ) -> Result<(), TestError> {
        if event.by < 10 {
            context.record(Echoed { by: -1 })?;
            return Err(TestError::Rejected("small"));
        }
        Ok(())
    }

    #[event_handler(events = ["incremented", "echoed"])]
    async fn count_events(context: &mut Events, event: &SerializedEvent) -> Result<(), TestError> {
        context.invocations.fetch_add(1, Ordering::SeqCst);
        context.log(format!("count:{}", event.name()));
        Ok(())
    }

    struct CountingHandler(AtomicUsize);

    static COUNTING_HANDLER: CountingHandler = CountingHandler(AtomicUsize::new(0));

    #[async_trait]
    impl CommandHandler<Context, TestError> for CountingHandler {
        fn command_name(&self) -> &'static str {
            Increment::NAME
        }

        async fn handle(
            &self,
            context: &mut Context,
            command: BoxedCommand,
        ) -> Result<crate::CommandOutput, TestError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            let Increment(by) = command.downcast()?;
            context.repositories().value += by;
            Ok(crate::CommandOutput::new(context.repositories().value))
        }
    }

    fn bus(
        store: Arc<Store>,
        bootstrap: Bootstrap<CounterTransaction, Store, TestError>,
    ) -> MessageBus<CounterTransaction, Store, TestError> {
        bootstrap
            .message_bus(CounterDatabase(store.clone()), store)
            .unwrap()
    }

    #[tokio::test]
    async fn handles_command_once_and_returns_its_output() {
        let store = Arc::new(Store::default());
        let bus = bus(store.clone(), Bootstrap::new().command_handler(&increment));

        assert_eq!(bus.handle(Increment(2)).await.unwrap(), 2);
        assert_eq!(bus.handle(Increment(3)).await.unwrap(), 5);
        assert_eq!(store.committed(), 5);
        assert_eq!(store.commits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn handler_is_invoked_exactly_once_per_command() {
        let store = Arc::new(Store::default());
        let bus = bus(
            store.clone(),
            Bootstrap::new().command_handler(&COUNTING_HANDLER),
        );

        assert_eq!(bus.handle(Increment(7)).await.unwrap(), 7);
        assert_eq!(COUNTING_HANDLER.0.load(Ordering::SeqCst), 1);
        assert_eq!(store.committed(), 7);
    }

    #[tokio::test]
    async fn events_are_dispatched_in_order_after_commit() {
        let store = Arc::new(Store::default());
        let bus = bus(
            store.clone(),
            Bootstrap::new()
                .command_handler(&increment)
                .event_handler(&log_increment)
                .event_handler(&echo_increment)
                .event_handler(&log_echo),
        );

        bus.handle(Increment(1)).await.unwrap();

        assert_eq!(
            store.handled(),
            vec!["log:1", "echo:1", "log:10", "echo:10", "echoed:1", "echoed:10"],
        );
    }

    #[tokio::test]
    async fn failed_command_is_rolled_back_without_dispatching_events() {
        let store = Arc::new(Store::default());
        let bus = bus(
            store.clone(),
            Bootstrap::new()
                .command_handler(&increment_then_fail)
                .event_handler(&log_increment),
        );

        let result = bus.handle(IncrementThenFail(4)).await;

        assert!(matches!(result, Err(TestError::Rejected("too late"))));
        assert_eq!(store.committed(), 0);
        assert_eq!(store.rollbacks.load(Ordering::SeqCst), 1);
        assert!(store.handled().is_empty());
    }

    #[tokio::test]
    async fn failed_commit_dispatches_no_event() {
        let store = Arc::new(Store {
            fail_commit: true,
            ..Default::default()
        });
        let bus = bus(
            store.clone(),
            Bootstrap::new()
                .command_handler(&increment)
                .event_handler(&log_increment),
        );

        let result = bus.handle(Increment(4)).await;

        assert!(matches!(result, Err(TestError::Bus(Error::UnitOfWork(_)))));
        assert!(store.handled().is_empty());
    }

    #[tokio::test]
    async fn events_of_a_failed_command_do_not_leak_into_the_next_one() {
        let store = Arc::new(Store::default());
        let bus = bus(
            store.clone(),
            Bootstrap::new()
                .command_handler(&increment)
                .command_handler(&increment_then_fail)
                .event_handler(&log_increment),
        );

        assert!(bus.handle(IncrementThenFail(100)).await.is_err());
        bus.handle(Increment(1)).await.unwrap();

        assert_eq!(store.handled(), vec!["log:1", "log:10"]);
    }

    #[tokio::test]
    async fn cancelled_command_dispatches_no_event() {
        let store = Arc::new(Store::default());
        let bus = bus(
            store.clone(),
            Bootstrap::new()
                .command_handler(&slow_increment)
                .event_handler(&log_increment),
        );

        let result =
            tokio::time::timeout(Duration::from_millis(20), bus.handle(SlowIncrement(3))).await;

        assert!(result.is_err());
        assert_eq!(store.committed(), 0);
        assert_eq!(store.commits.load(Ordering::SeqCst), 0);
        assert!(store.handled().is_empty());
    }

    #[tokio::test]
    async fn unknown_command_is_a_configuration_error() {
        let store = Arc::new(Store::default());
        let bus = bus(store.clone(), Bootstrap::new().command_handler(&increment));

        let result = bus.handle(Unregistered).await;

        assert!(matches!(
            result,
            Err(TestError::Bus(Error::MissingCommandHandler("unregistered")))
        ));
    }

    #[tokio::test]
    async fn isolated_handler_failure_does_not_stop_the_cascade() {
        let store = Arc::new(Store::default());
        let bus = bus(
            store.clone(),
            Bootstrap::new()
                .command_handler(&increment)
                .event_handler(&reject_small_increment)
                .event_handler(&log_increment),
        );

        let result = bus.handle(Increment(1)).await;

        match result {
            Err(TestError::Bus(Error::EventHandlers(failures))) => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].handler, "reject-small-increment");
                assert_eq!(failures[0].event, "incremented");
                assert_eq!(failures[0].message, "rejected: small");
            }
            other => panic!("unexpected result {other:?}"),
        }
        assert_eq!(store.committed(), 1);
        assert_eq!(store.handled(), vec!["log:1", "log:10"]);
    }

    #[tokio::test]
    async fn events_recorded_by_a_failed_handler_are_discarded() {
        let store = Arc::new(Store::default());
        let bus = bus(
            store.clone(),
            Bootstrap::new()
                .command_handler(&increment)
                .event_handler(&reject_small_increment)
                .event_handler(&log_echo),
        );

        assert!(bus.handle(Increment(1)).await.is_err());

        assert!(store.handled().is_empty());
    }

    #[tokio::test]
    async fn fail_fast_stops_at_the_first_failure() {
        let store = Arc::new(Store::default());
        let bus = bus(
            store.clone(),
            Bootstrap::new()
                .cascade_policy(CascadePolicy::FailFast)
                .command_handler(&increment)
                .event_handler(&reject_small_increment)
                .event_handler(&log_increment),
        );

        let result = bus.handle(Increment(1)).await;

        assert!(matches!(result, Err(TestError::Rejected("small"))));
        assert_eq!(store.committed(), 1);
        assert!(store.handled().is_empty());
    }

    #[tokio::test]
    async fn handler_for_several_events_receives_serialized_events() {
        let store = Arc::new(Store::default());
        let bus = bus(
            store.clone(),
            Bootstrap::new()
                .command_handler(&increment)
                .event_handler(&echo_increment)
                .event_handler(&count_events),
        );

        bus.handle(Increment(1)).await.unwrap();

        assert_eq!(store.invocations.load(Ordering::SeqCst), 4);
        assert_eq!(
            store.handled(),
            vec![
                "echo:1",
                "count:incremented",
                "echo:10",
                "count:incremented",
                "count:echoed",
                "count:echoed"
            ],
        );
    }

    #[tokio::test]
    async fn concurrent_commands_do_not_share_events() {
        let first_store = Arc::new(Store::default());
        let second_store = Arc::new(Store::default());
        let wiring = || {
            Bootstrap::new()
                .command_handler(&increment)
                .event_handler(&log_increment)
        };
        let first = bus(first_store.clone(), wiring());
        let second = bus(second_store.clone(), wiring());

        let (a, b) = tokio::join!(
            tokio::spawn(async move { first.handle(Increment(1)).await }),
            tokio::spawn(async move { second.handle(Increment(2)).await }),
        );

        assert_eq!(a.unwrap().unwrap(), 1);
        assert_eq!(b.unwrap().unwrap(), 2);
        assert_eq!(first_store.handled(), vec!["log:1", "log:10"]);
        assert_eq!(second_store.handled(), vec!["log:2", "log:20"]);
    }
}
