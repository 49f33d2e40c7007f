//! In-memory adapters, for tests and single-process applications.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::{Entity, Error, Id, Publisher, Repository};

/// A shared in-memory collection of entities, read and written through
/// [transactions](TableTransaction).
///
/// Cloning a table gives another handle to the same data.
pub struct Table<T> {
    rows: Arc<Mutex<Vec<T>>>,
}

impl<T> Clone for Table<T> {
    fn clone(&self) -> Self {
        Self {
            rows: self.rows.clone(),
        }
    }
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Table<T> {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            rows: Default::default(),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<T>>, Error> {
        self.rows
            .lock()
            .map_err(|_| Error::UnitOfWork("the table mutex has been poisoned".into()))
    }
}

impl<T: Entity + Clone> Table<T> {
    /// Begins a transaction, that sees the rows committed so far.
    pub fn begin(&self) -> Result<TableTransaction<T>, Error> {
        Ok(TableTransaction {
            table: self.clone(),
            snapshot: self.lock()?.clone(),
            changes: Vec::new(),
        })
    }

    /// The number of committed rows.
    pub fn len(&self) -> Result<usize, Error> {
        Ok(self.lock()?.len())
    }

    /// Whether the table has no committed row.
    pub fn is_empty(&self) -> Result<bool, Error> {
        Ok(self.lock()?.is_empty())
    }
}

enum Change<T: Entity> {
    Insert(T),
    Update(T),
    Delete(Id<T>),
}

/// A transaction on a [Table].
///
/// Reads see the rows committed when the transaction began, plus the changes of the transaction
/// itself. Changes are applied to the table on [commit](Self::commit), and discarded on
/// [rollback](Self::rollback) or when the transaction is dropped.
///
/// A commit fails if another transaction committed a conflicting change in the meantime: an
/// insert of an id that now exists, or an update or delete of a row that is gone.
pub struct TableTransaction<T: Entity> {
    table: Table<T>,
    snapshot: Vec<T>,
    changes: Vec<Change<T>>,
}

impl<T: Entity + Clone> TableTransaction<T> {
    /// Applies the changes to the table, all or none of them.
    pub fn commit(self) -> Result<(), Error> {
        let mut rows = self.table.lock()?;
        let mut staged = rows.clone();
        for change in self.changes {
            match change {
                Change::Insert(entity) => {
                    if position(&staged, &entity.id()).is_some() {
                        return Err(conflict("insert", &entity.id()));
                    }
                    staged.push(entity);
                }
                Change::Update(entity) => match position(&staged, &entity.id()) {
                    Some(index) => staged[index] = entity,
                    None => return Err(conflict("update", &entity.id())),
                },
                Change::Delete(id) => match position(&staged, &id) {
                    Some(index) => {
                        staged.remove(index);
                    }
                    None => return Err(conflict("delete", &id)),
                },
            }
        }
        *rows = staged;
        Ok(())
    }

    /// Discards the changes.
    pub fn rollback(self) {
        log::debug!("Discarding {} change(s)", self.changes.len());
    }

    fn position(&self, id: &Id<T>) -> Option<usize> {
        position(&self.snapshot, id)
    }
}

fn position<T: Entity>(rows: &[T], id: &Id<T>) -> Option<usize> {
    rows.iter().position(|row| &row.id() == id)
}

fn conflict<T: Entity>(change: &str, id: &Id<T>) -> Error {
    Error::UnitOfWork(format!(
        "cannot commit the {change} of entity {id}, another transaction changed it"
    ))
}

#[async_trait]
impl<T> Repository<T> for TableTransaction<T>
where
    T: Entity + Clone + 'static,
{
    async fn add(&mut self, entity: T) -> Result<T, Error> {
        if self.position(&entity.id()).is_some() {
            return Err(Error::UnitOfWork(format!(
                "an entity with id {} already exists",
                entity.id()
            )));
        }
        self.snapshot.push(entity.clone());
        self.changes.push(Change::Insert(entity.clone()));
        Ok(entity)
    }

    async fn get(&mut self, id: &Id<T>) -> Result<Option<T>, Error> {
        Ok(self.position(id).map(|index| self.snapshot[index].clone()))
    }

    async fn update(&mut self, id: &Id<T>, entity: T) -> Result<T, Error> {
        let index = self
            .position(id)
            .ok_or_else(|| Error::UnitOfWork(format!("no entity with id {id} to update")))?;
        self.snapshot[index] = entity.clone();
        self.changes.push(Change::Update(entity.clone()));
        Ok(entity)
    }

    async fn delete(&mut self, id: &Id<T>) -> Result<(), Error> {
        if let Some(index) = self.position(id) {
            self.snapshot.remove(index);
            self.changes.push(Change::Delete(id.clone()));
        }
        Ok(())
    }

    async fn list(
        &mut self,
        offset: Option<usize>,
        limit: Option<usize>,
    ) -> Result<Vec<T>, Error> {
        Ok(self
            .snapshot
            .iter()
            .skip(offset.unwrap_or(0))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }
}

/// A message sent by an [InMemoryPublisher].
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Message {
    /// The topic the message was sent to.
    pub topic: String,
    /// The content of the message.
    pub payload: Value,
}

/// A [Publisher] that keeps sent messages in memory.
///
/// Only the topics given at creation have a producer: sending to any other topic fails with
/// [Error::UnknownTopic].
pub struct InMemoryPublisher {
    topics: HashSet<String>,
    started: AtomicBool,
    messages: Mutex<Vec<Message>>,
}

impl InMemoryPublisher {
    /// Creates a stopped publisher with producers for the given topics.
    pub fn new<T: Into<String>>(topics: impl IntoIterator<Item = T>) -> Self {
        Self {
            topics: topics.into_iter().map(Into::into).collect(),
            started: AtomicBool::new(false),
            messages: Mutex::new(Vec::new()),
        }
    }

    /// Whether the publisher has been started and not stopped since.
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// The messages sent so far, in sending order.
    pub fn messages(&self) -> Result<Vec<Message>, Error> {
        Ok(self.lock()?.clone())
    }

    /// The messages sent so far to one topic.
    pub fn messages_on(&self, topic: &str) -> Result<Vec<Value>, Error> {
        Ok(self
            .lock()?
            .iter()
            .filter(|message| message.topic == topic)
            .map(|message| message.payload.clone())
            .collect())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<Message>>, Error> {
        self.messages
            .lock()
            .map_err(|_| Error::Broker("the message mutex has been poisoned".into()))
    }
}

#[async_trait]
impl Publisher for InMemoryPublisher {
    async fn start(&self) -> Result<(), Error> {
        self.started.store(true, Ordering::SeqCst);
        log::info!("In-memory publisher started");
        Ok(())
    }

    async fn send_message(&self, topic: &str, payload: Value) -> Result<(), Error> {
        if !self.topics.contains(topic) {
            return Err(Error::UnknownTopic(topic.into()));
        }
        if !self.is_started() {
            return Err(Error::Broker(format!(
                "cannot send to {topic}, the publisher is not started"
            )));
        }
        log::info!("Sending message {payload} to topic {topic}");
        self.lock()?.push(Message {
            topic: topic.into(),
            payload,
        });
        Ok(())
    }

    async fn stop(&self) -> Result<(), Error> {
        self.started.store(false, Ordering::SeqCst);
        log::info!("In-memory publisher stopped");
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq)]
    struct Book {
        id: Id<Book>,
        title: &'static str,
    }

    impl Entity for Book {
        type Id = u32;

        fn id(&self) -> Id<Self> {
            self.id
        }
    }

    fn book(id: u32, title: &'static str) -> Book {
        Book { id: Id(id), title }
    }

    #[tokio::test]
    async fn committed_changes_are_visible_to_later_transactions() -> Result<(), Error> {
        let table = Table::<Book>::new();

        let mut transaction = table.begin()?;
        transaction.add(book(1, "Dune")).await?;
        transaction.add(book(2, "Emma")).await?;
        transaction.update(&Id(1), book(1, "Dune Messiah")).await?;
        transaction.delete(&Id(2)).await?;
        transaction.commit()?;

        let mut transaction = table.begin()?;
        assert_eq!(transaction.get(&Id(1)).await?, Some(book(1, "Dune Messiah")));
        assert_eq!(transaction.get(&Id(2)).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn rolled_back_and_dropped_transactions_change_nothing() -> Result<(), Error> {
        let table = Table::<Book>::new();

        let mut transaction = table.begin()?;
        transaction.add(book(1, "Dune")).await?;
        transaction.rollback();

        let mut transaction = table.begin()?;
        transaction.add(book(2, "Emma")).await?;
        drop(transaction);

        assert!(table.is_empty()?);
        Ok(())
    }

    #[tokio::test]
    async fn transaction_reads_its_own_writes() -> Result<(), Error> {
        let table = Table::<Book>::new();
        let mut transaction = table.begin()?;

        transaction.add(book(1, "Dune")).await?;

        assert_eq!(transaction.get(&Id(1)).await?, Some(book(1, "Dune")));
        assert_eq!(table.len()?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_transactions_are_isolated() -> Result<(), Error> {
        let table = Table::<Book>::new();
        let mut first = table.begin()?;
        let mut second = table.begin()?;

        first.add(book(1, "Dune")).await?;
        second.add(book(2, "Emma")).await?;

        assert_eq!(second.get(&Id(1)).await?, None);
        first.commit()?;
        second.commit()?;
        assert_eq!(table.len()?, 2);
        Ok(())
    }

    #[tokio::test]
    async fn update_of_a_concurrently_deleted_row_fails_to_commit() -> Result<(), Error> {
        let table = Table::<Book>::new();
        let mut setup = table.begin()?;
        setup.add(book(1, "Dune")).await?;
        setup.commit()?;

        let mut deleter = table.begin()?;
        let mut updater = table.begin()?;
        deleter.delete(&Id(1)).await?;
        updater.update(&Id(1), book(1, "Dune Messiah")).await?;
        updater.add(book(2, "Emma")).await?;
        deleter.commit()?;

        assert!(matches!(updater.commit(), Err(Error::UnitOfWork(_))));
        let mut transaction = table.begin()?;
        assert_eq!(transaction.get(&Id(1)).await?, None);
        assert_eq!(transaction.get(&Id(2)).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_inserts_and_deletes_of_one_id_conflict() -> Result<(), Error> {
        let table = Table::<Book>::new();
        let mut first = table.begin()?;
        let mut second = table.begin()?;
        first.add(book(1, "Dune")).await?;
        second.add(book(1, "Emma")).await?;
        first.commit()?;

        assert!(second.commit().is_err());

        let mut first = table.begin()?;
        let mut second = table.begin()?;
        first.delete(&Id(1)).await?;
        second.delete(&Id(1)).await?;
        first.commit()?;

        assert!(second.commit().is_err());
        assert!(table.is_empty()?);
        Ok(())
    }

    #[tokio::test]
    async fn deleted_then_re_added_id_commits() -> Result<(), Error> {
        let table = Table::<Book>::new();
        let mut setup = table.begin()?;
        setup.add(book(1, "Dune")).await?;
        setup.commit()?;

        let mut transaction = table.begin()?;
        transaction.delete(&Id(1)).await?;
        transaction.add(book(1, "Dune Messiah")).await?;
        transaction.commit()?;

        let mut transaction = table.begin()?;
        assert_eq!(transaction.get(&Id(1)).await?, Some(book(1, "Dune Messiah")));
        Ok(())
    }

    #[tokio::test]
    async fn list_pages_through_rows_in_insertion_order() -> Result<(), Error> {
        let table = Table::<Book>::new();
        let mut transaction = table.begin()?;
        for (id, title) in [(1, "Dune"), (2, "Emma"), (3, "Ulysses")] {
            transaction.add(book(id, title)).await?;
        }

        assert_eq!(transaction.list(None, None).await?.len(), 3);
        assert_eq!(
            transaction.list(Some(1), Some(1)).await?,
            vec![book(2, "Emma")]
        );
        assert!(transaction.list(Some(5), Some(2)).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn adding_an_existing_id_fails() -> Result<(), Error> {
        let table = Table::<Book>::new();
        let mut transaction = table.begin()?;
        transaction.add(book(1, "Dune")).await?;

        assert!(transaction.add(book(1, "Emma")).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn publisher_rejects_unknown_topics() -> Result<(), Error> {
        let publisher = InMemoryPublisher::new(["books"]);
        publisher.start().await?;

        let result = publisher.send_message("authors", json!({})).await;

        assert!(matches!(result, Err(Error::UnknownTopic(topic)) if topic == "authors"));
        Ok(())
    }

    #[tokio::test]
    async fn publisher_records_messages_while_started() -> Result<(), Error> {
        let publisher = InMemoryPublisher::new(["books"]);
        assert!(publisher.send_message("books", json!(1)).await.is_err());

        publisher.start().await?;
        publisher.send_message("books", json!(2)).await?;
        publisher.stop().await?;

        assert_eq!(
            publisher.messages()?,
            vec![Message {
                topic: "books".into(),
                payload: json!(2)
            }]
        );
        assert!(!publisher.is_started());
        Ok(())
    }
}
