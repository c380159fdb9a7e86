//! Order lifecycle engine (application-level orchestration).
//!
//! Every transition runs the same pipeline:
//!
//! ```text
//! Command
//!   ↓
//! 1. Validate referenced actors (assign / start checking only)
//!   ↓
//! 2. Load the current order snapshot
//!   ↓
//! 3. Evaluate the guard (`pickline_orders::transition`, pure)
//!   ↓
//! 4. Compare-and-set the next state against the snapshot's version
//! ```
//!
//! Step 4 is the only write. A guard rejection never reaches the store, and a
//! lost compare-and-set is reported as the command's own rejection, so two
//! checkers racing on the same picked order see exactly one winner.

use std::sync::Arc;

use thiserror::Error;
use tracing::instrument;

use pickline_core::{DomainError, ExpectedVersion, OrderId};
use pickline_orders::{
    AssignPicker, EndChecking, EndPicking, NewOrder, Order, OrderCommand, StartChecking, StartPicking,
    transition,
};
use pickline_roster::ActorKind;

use crate::directory::Directory;
use crate::store::{OrderStore, StoreError};

#[derive(Debug, Error)]
pub enum EngineError {
    /// The order is not in a state that allows the operation, or the actor does not match.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// Checking was requested before picking finished (or after somebody else claimed it).
    #[error("not ready: {0}")]
    NotReady(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("store error: {0}")]
    Store(StoreError),
}

impl EngineError {
    /// Whether the error is a guard rejection (as opposed to bad input or a failure).
    pub fn is_rejection(&self) -> bool {
        matches!(self, EngineError::InvalidTransition(_) | EngineError::NotReady(_))
    }
}

impl From<DomainError> for EngineError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => EngineError::Validation(msg),
            DomainError::InvalidTransition(msg) => EngineError::InvalidTransition(msg),
            DomainError::NotReady(msg) => EngineError::NotReady(msg),
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(what) => EngineError::NotFound(what),
            other => EngineError::Store(other),
        }
    }
}

/// Drives orders through UNASSIGNED → ASSIGNED → PICKING → PICKED → CHECKING → DONE.
#[derive(Clone)]
pub struct LifecycleEngine {
    orders: Arc<dyn OrderStore>,
    directory: Directory,
}

impl LifecycleEngine {
    pub fn new(orders: Arc<dyn OrderStore>, directory: Directory) -> Self {
        Self { orders, directory }
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    #[instrument(skip(self, order), fields(so_number = %order.so_number))]
    pub async fn create_order(&self, order: NewOrder) -> Result<Order, EngineError> {
        let order = self.orders.insert(order).await?;
        tracing::info!(order_id = %order.id, "order created");
        Ok(order)
    }

    pub async fn get_order(&self, id: OrderId) -> Result<Order, EngineError> {
        self.orders
            .get(id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("order {id}")))
    }

    /// Assign (or reassign) a picker. The picker must be on the roster, active or not.
    ///
    /// The compare-and-set is keyed on the version, not the status. Of two
    /// concurrent reassignments of the same ASSIGNED order, the one that
    /// loses is rejected with "order was modified concurrently" even though
    /// the status would still allow it; the caller re-fetches and retries.
    pub async fn assign(&self, cmd: AssignPicker) -> Result<Order, EngineError> {
        self.directory.ensure_exists(ActorKind::Picker, cmd.picker_id).await?;
        self.execute(OrderCommand::AssignPicker(cmd)).await
    }

    pub async fn start_picking(&self, cmd: StartPicking) -> Result<Order, EngineError> {
        self.execute(OrderCommand::StartPicking(cmd)).await
    }

    pub async fn end_picking(&self, cmd: EndPicking) -> Result<Order, EngineError> {
        self.execute(OrderCommand::EndPicking(cmd)).await
    }

    /// Claim a picked order for checking. The first checker wins.
    pub async fn start_checking(&self, cmd: StartChecking) -> Result<Order, EngineError> {
        self.directory.ensure_exists(ActorKind::Checker, cmd.checker_id).await?;
        self.execute(OrderCommand::StartChecking(cmd)).await
    }

    pub async fn end_checking(&self, cmd: EndChecking) -> Result<Order, EngineError> {
        self.execute(OrderCommand::EndChecking(cmd)).await
    }

    #[instrument(
        skip(self, command),
        fields(
            order_id = %command.order_id(),
            actor_id = %command.actor_id(),
            command = command.name()
        )
    )]
    async fn execute(&self, command: OrderCommand) -> Result<Order, EngineError> {
        let current = self.get_order(command.order_id()).await?;

        let next = transition(&current, &command).map_err(|e| {
            tracing::debug!(reason = %e, status = %current.status, "transition rejected");
            EngineError::from(e)
        })?;

        match self
            .orders
            .compare_and_swap(&next, ExpectedVersion::Exact(current.version))
            .await
        {
            Ok(saved) => {
                tracing::info!(status = %saved.status, version = saved.version, "order transitioned");
                Ok(saved)
            }
            Err(StoreError::Conflict(msg)) => {
                tracing::debug!(reason = %msg, "lost compare-and-set");
                Err(command.stale_rejection().into())
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to persist transition");
                Err(e.into())
            }
        }
    }
}
