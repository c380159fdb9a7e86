//! Order fulfillment lifecycle (pick → idle → check).
//!
//! This crate contains the business rules for warehouse orders, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage). Stores
//! apply the result of [`transition`] with a compare-and-set on the order's
//! version, so a rejected guard never touches persisted state.

pub mod lifecycle;
pub mod order;

pub use lifecycle::{
    AssignPicker, CheckingEnded, CheckingStarted, EndChecking, EndPicking, OrderCommand,
    OrderEvent, PickerAssigned, PickingEnded, PickingStarted, StartChecking, StartPicking,
    transition,
};
pub use order::{NewOrder, Order, OrderStatus, Stage};
