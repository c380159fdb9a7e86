//! Infrastructure layer: stores, the lifecycle engine, roster directory, reports.

pub mod directory;
pub mod engine;
pub mod reports;
pub mod store;


pub use directory::Directory;
pub use engine::{EngineError, LifecycleEngine};
pub use reports::{ExportRow, OrderListing, OrderReports, format_clock, format_duration};
