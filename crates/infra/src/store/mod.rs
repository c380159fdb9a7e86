//! Persistence boundary for orders and the picker/checker roster.
//!
//! Both backends expose the same atomic compare-and-set primitive that the
//! lifecycle engine relies on; nothing above this module holds locks.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::{InMemoryActorStore, InMemoryOrderStore};
pub use postgres::{PostgresActorStore, PostgresOrderStore};
pub use r#trait::{ActorStore, OrderStore, StoreError};
