use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use pickline_core::{ActorId, ExpectedVersion, OrderId};
use pickline_orders::{NewOrder, Order};
use pickline_roster::{Actor, ActorKind, NewActor};

/// Storage error.
///
/// These are **infrastructure errors** (concurrency, missing rows, backend
/// failures) as opposed to domain rejections, which never reach a store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A compare-and-set lost: the row no longer has the expected version.
    #[error("optimistic concurrency check failed: {0}")]
    Conflict(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Order persistence.
///
/// Orders are never deleted. The only mutation after insert is
/// [`OrderStore::compare_and_swap`], which is the single atomic step every
/// lifecycle transition goes through.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert a new order and assign it an identifier.
    async fn insert(&self, order: NewOrder) -> Result<Order, StoreError>;

    async fn get(&self, id: OrderId) -> Result<Option<Order>, StoreError>;

    /// Replace the stored order with `next` iff the stored version matches `expected`.
    ///
    /// Implementations must make the check and the write a single atomic step:
    /// of two racing callers with the same expectation exactly one succeeds and
    /// the other gets [`StoreError::Conflict`].
    async fn compare_and_swap(&self, next: &Order, expected: ExpectedVersion) -> Result<Order, StoreError>;

    /// All orders, newest first.
    async fn list_newest_first(&self) -> Result<Vec<Order>, StoreError>;

    /// Orders created on `date` (UTC calendar day), oldest first.
    async fn list_created_on(&self, date: NaiveDate) -> Result<Vec<Order>, StoreError>;
}

/// Picker/checker roster persistence. Entries are soft-deleted only.
#[async_trait]
pub trait ActorStore: Send + Sync {
    async fn insert(&self, actor: NewActor) -> Result<Actor, StoreError>;

    /// Look up an actor regardless of status.
    async fn get(&self, kind: ActorKind, id: ActorId) -> Result<Option<Actor>, StoreError>;

    /// Active actors of `kind`, ordered by name.
    async fn list_active(&self, kind: ActorKind) -> Result<Vec<Actor>, StoreError>;

    /// Every actor of `kind`, including inactive ones (used for name joins).
    async fn list_all(&self, kind: ActorKind) -> Result<Vec<Actor>, StoreError>;

    /// Flip an actor to inactive. Idempotent; `NotFound` when the id is unknown.
    async fn deactivate(&self, kind: ActorKind, id: ActorId) -> Result<Actor, StoreError>;
}

#[async_trait]
impl<S> OrderStore for Arc<S>
where
    S: OrderStore + ?Sized,
{
    async fn insert(&self, order: NewOrder) -> Result<Order, StoreError> {
        (**self).insert(order).await
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        (**self).get(id).await
    }

    async fn compare_and_swap(&self, next: &Order, expected: ExpectedVersion) -> Result<Order, StoreError> {
        (**self).compare_and_swap(next, expected).await
    }

    async fn list_newest_first(&self) -> Result<Vec<Order>, StoreError> {
        (**self).list_newest_first().await
    }

    async fn list_created_on(&self, date: NaiveDate) -> Result<Vec<Order>, StoreError> {
        (**self).list_created_on(date).await
    }
}

#[async_trait]
impl<S> ActorStore for Arc<S>
where
    S: ActorStore + ?Sized,
{
    async fn insert(&self, actor: NewActor) -> Result<Actor, StoreError> {
        (**self).insert(actor).await
    }

    async fn get(&self, kind: ActorKind, id: ActorId) -> Result<Option<Actor>, StoreError> {
        (**self).get(kind, id).await
    }

    async fn list_active(&self, kind: ActorKind) -> Result<Vec<Actor>, StoreError> {
        (**self).list_active(kind).await
    }

    async fn list_all(&self, kind: ActorKind) -> Result<Vec<Actor>, StoreError> {
        (**self).list_all(kind).await
    }

    async fn deactivate(&self, kind: ActorKind, id: ActorId) -> Result<Actor, StoreError> {
        (**self).deactivate(kind, id).await
    }
}
