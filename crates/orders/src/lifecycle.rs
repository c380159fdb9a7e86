//! Guarded transitions of the order lifecycle.
//!
//! ```text
//! UNASSIGNED --assign-------> ASSIGNED
//! ASSIGNED   --assign-------> ASSIGNED   (reassignment allowed until picking starts)
//! ASSIGNED   --startPicking-> PICKING    picker_start
//! PICKING    --endPicking---> PICKED     picker_end, idle_start
//! PICKED     --startChecking> CHECKING   checker_id, checker_start, idle_end
//! CHECKING   --endChecking--> DONE       checker_end
//! ```
//!
//! Every guard is evaluated in `handle` against an immutable snapshot. A
//! rejected command yields no events, so nothing downstream can half-apply it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pickline_core::{ActorId, Aggregate, DomainError, DomainResult, OrderId};

use crate::order::{Order, OrderStatus};

/// Command: AssignPicker (admin).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignPicker {
    pub order_id: OrderId,
    pub picker_id: ActorId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: StartPicking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartPicking {
    pub order_id: OrderId,
    pub picker_id: ActorId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: EndPicking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndPicking {
    pub order_id: OrderId,
    pub picker_id: ActorId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: StartChecking. Claims the order for whichever checker calls first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartChecking {
    pub order_id: OrderId,
    pub checker_id: ActorId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: EndChecking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndChecking {
    pub order_id: OrderId,
    pub checker_id: ActorId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderCommand {
    AssignPicker(AssignPicker),
    StartPicking(StartPicking),
    EndPicking(EndPicking),
    StartChecking(StartChecking),
    EndChecking(EndChecking),
}

impl OrderCommand {
    pub fn order_id(&self) -> OrderId {
        match self {
            OrderCommand::AssignPicker(c) => c.order_id,
            OrderCommand::StartPicking(c) => c.order_id,
            OrderCommand::EndPicking(c) => c.order_id,
            OrderCommand::StartChecking(c) => c.order_id,
            OrderCommand::EndChecking(c) => c.order_id,
        }
    }

    /// The picker or checker the command acts on behalf of.
    pub fn actor_id(&self) -> ActorId {
        match self {
            OrderCommand::AssignPicker(c) => c.picker_id,
            OrderCommand::StartPicking(c) => c.picker_id,
            OrderCommand::EndPicking(c) => c.picker_id,
            OrderCommand::StartChecking(c) => c.checker_id,
            OrderCommand::EndChecking(c) => c.checker_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OrderCommand::AssignPicker(_) => "assign",
            OrderCommand::StartPicking(_) => "start_picking",
            OrderCommand::EndPicking(_) => "end_picking",
            OrderCommand::StartChecking(_) => "start_checking",
            OrderCommand::EndChecking(_) => "end_checking",
        }
    }

    /// Rejection used when the guard passed on a snapshot but the order moved
    /// before the write landed.
    pub fn stale_rejection(&self) -> DomainError {
        let reason = "order was modified concurrently";
        match self {
            OrderCommand::StartChecking(_) => DomainError::not_ready(reason),
            _ => DomainError::invalid_transition(reason),
        }
    }
}

/// Event: PickerAssigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickerAssigned {
    pub picker_id: ActorId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PickingStarted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickingStarted {
    pub occurred_at: DateTime<Utc>,
}

/// Event: PickingEnded. The idle clock starts at the same instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickingEnded {
    pub occurred_at: DateTime<Utc>,
}

/// Event: CheckingStarted. The idle clock stops at the same instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckingStarted {
    pub checker_id: ActorId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CheckingEnded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckingEnded {
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderEvent {
    PickerAssigned(PickerAssigned),
    PickingStarted(PickingStarted),
    PickingEnded(PickingEnded),
    CheckingStarted(CheckingStarted),
    CheckingEnded(CheckingEnded),
}

impl OrderEvent {
    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            OrderEvent::PickerAssigned(e) => e.occurred_at,
            OrderEvent::PickingStarted(e) => e.occurred_at,
            OrderEvent::PickingEnded(e) => e.occurred_at,
            OrderEvent::CheckingStarted(e) => e.occurred_at,
            OrderEvent::CheckingEnded(e) => e.occurred_at,
        }
    }

    pub fn resulting_status(&self) -> OrderStatus {
        match self {
            OrderEvent::PickerAssigned(_) => OrderStatus::Assigned,
            OrderEvent::PickingStarted(_) => OrderStatus::Picking,
            OrderEvent::PickingEnded(_) => OrderStatus::Picked,
            OrderEvent::CheckingStarted(_) => OrderStatus::Checking,
            OrderEvent::CheckingEnded(_) => OrderStatus::Done,
        }
    }
}

impl Aggregate for Order {
    type Command = OrderCommand;
    type Event = OrderEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            OrderEvent::PickerAssigned(e) => {
                self.picker_id = Some(e.picker_id);
            }
            OrderEvent::PickingStarted(e) => {
                self.picker_start = Some(e.occurred_at);
            }
            OrderEvent::PickingEnded(e) => {
                self.picker_end = Some(e.occurred_at);
                self.idle_start = Some(e.occurred_at);
            }
            OrderEvent::CheckingStarted(e) => {
                self.checker_id = Some(e.checker_id);
                self.checker_start = Some(e.occurred_at);
                self.idle_end = Some(e.occurred_at);
            }
            OrderEvent::CheckingEnded(e) => {
                self.checker_end = Some(e.occurred_at);
            }
        }

        self.status = event.resulting_status();
        // last-modified never moves backwards, even if the caller's clock does.
        self.updated_at = self.updated_at.max(event.occurred_at());
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        self.ensure_order_id(command.order_id())?;
        match command {
            OrderCommand::AssignPicker(cmd) => self.handle_assign(cmd),
            OrderCommand::StartPicking(cmd) => self.handle_start_picking(cmd),
            OrderCommand::EndPicking(cmd) => self.handle_end_picking(cmd),
            OrderCommand::StartChecking(cmd) => self.handle_start_checking(cmd),
            OrderCommand::EndChecking(cmd) => self.handle_end_checking(cmd),
        }
    }
}

impl Order {
    fn ensure_order_id(&self, order_id: OrderId) -> DomainResult<()> {
        if self.id != order_id {
            return Err(DomainError::validation("order_id mismatch"));
        }
        Ok(())
    }

    fn ensure_status(&self, expected: OrderStatus, action: &str) -> DomainResult<()> {
        if self.status != expected {
            return Err(DomainError::invalid_transition(format!(
                "cannot {action}: order is {}, expected {expected}",
                self.status
            )));
        }
        Ok(())
    }

    fn ensure_picker(&self, picker_id: ActorId, action: &str) -> DomainResult<()> {
        if self.picker_id != Some(picker_id) {
            return Err(DomainError::invalid_transition(format!(
                "cannot {action}: picker {picker_id} is not assigned to this order"
            )));
        }
        Ok(())
    }

    fn handle_assign(&self, cmd: &AssignPicker) -> DomainResult<Vec<OrderEvent>> {
        if self.status.picker_locked() {
            return Err(DomainError::invalid_transition(
                "cannot reassign after picking started",
            ));
        }

        Ok(vec![OrderEvent::PickerAssigned(PickerAssigned {
            picker_id: cmd.picker_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_start_picking(&self, cmd: &StartPicking) -> DomainResult<Vec<OrderEvent>> {
        self.ensure_status(OrderStatus::Assigned, "start picking")?;
        self.ensure_picker(cmd.picker_id, "start picking")?;

        Ok(vec![OrderEvent::PickingStarted(PickingStarted {
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_end_picking(&self, cmd: &EndPicking) -> DomainResult<Vec<OrderEvent>> {
        self.ensure_status(OrderStatus::Picking, "end picking")?;
        self.ensure_picker(cmd.picker_id, "end picking")?;

        Ok(vec![OrderEvent::PickingEnded(PickingEnded {
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_start_checking(&self, cmd: &StartChecking) -> DomainResult<Vec<OrderEvent>> {
        // No identity precondition: the first checker to claim a picked order gets it.
        if self.status != OrderStatus::Picked {
            return Err(DomainError::not_ready(format!(
                "order not ready for checking: order is {}",
                self.status
            )));
        }

        Ok(vec![OrderEvent::CheckingStarted(CheckingStarted {
            checker_id: cmd.checker_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_end_checking(&self, cmd: &EndChecking) -> DomainResult<Vec<OrderEvent>> {
        self.ensure_status(OrderStatus::Checking, "end checking")?;
        if self.checker_id != Some(cmd.checker_id) {
            return Err(DomainError::invalid_transition(format!(
                "cannot end checking: checker {} is not checking this order",
                cmd.checker_id
            )));
        }

        Ok(vec![OrderEvent::CheckingEnded(CheckingEnded {
            occurred_at: cmd.occurred_at,
        })])
    }
}

/// Evaluate a command against the current state and return the next state.
///
/// Pure: the input is untouched and the result carries `version + 1`, which is
/// what a store's compare-and-set writes while expecting `order.version`.
pub fn transition(order: &Order, command: &OrderCommand) -> DomainResult<Order> {
    let events = order.handle(command)?;
    let mut next = order.clone();
    for event in &events {
        next.apply(event);
    }
    Ok(next)
}
