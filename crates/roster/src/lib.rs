//! Picker/checker roster (directory) domain module.
//!
//! Roster entries are never hard-deleted: historical orders keep pointing at
//! them, so removal is a status flip to [`ActorStatus::Inactive`].

pub mod actor;

pub use actor::{Actor, ActorKind, ActorStatus, NewActor};
