use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::ops::Deref;

/// A business entity stored by a [Repository](crate::Repository).
///
/// It is identified by a unique _id_, that never changes during the life of the entity.
///
/// # Example
/// ```
/// # use missive::{Entity, Id};
/// #[derive(Clone)]
/// pub struct Book {
///     pub id: Id<Book>,
///     pub title: String,
/// }
///
/// impl Entity for Book {
///     type Id = u64;
///
///     fn id(&self) -> Id<Self> {
///         self.id
///     }
/// }
/// ```
pub trait Entity: Sized + Send + Sync {
    /// The type of the entity id.
    type Id: Clone + Display + PartialEq + Send + Sync;

    /// Getter for the entity id.
    fn id(&self) -> Id<Self>;
}

/// Wrapper type for the id of an entity.
///
/// Ids of different entities cannot be mixed up, even when they wrap the same type.
///
/// It always implements [Deref], [Clone], [Display] and [PartialEq], and optionally implements
/// [Copy], [Debug], [Eq], [Hash], [Serialize] and [Deserialize] if they are implemented by the
/// wrapped type.
#[repr(transparent)]
pub struct Id<T: Entity>(
    /// The wrapped id.
    pub T::Id,
);

impl<T: Entity> Deref for Id<T> {
    type Target = T::Id;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> Serialize for Id<T>
where
    T: Entity,
    T::Id: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'a, T> Deserialize<'a> for Id<T>
where
    T: Entity,
    T::Id: Deserialize<'a>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'a>,
    {
        T::Id::deserialize(deserializer).map(Id)
    }
}

impl<T: Entity> Clone for Id<T> {
    fn clone(&self) -> Self {
        Id(self.0.clone())
    }
}

impl<T> Copy for Id<T>
where
    T: Entity,
    T::Id: Copy,
{
}

impl<T> Debug for Id<T>
where
    T: Entity,
    T::Id: Debug,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Id({:?})", self.0)
    }
}

impl<T: Entity> Display for Id<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl<T: Entity> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq(&other.0)
    }
}

impl<T> Eq for Id<T>
where
    T: Entity,
    T::Id: Eq,
{
}

impl<T> Hash for Id<T>
where
    T: Entity,
    T::Id: Hash,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}
