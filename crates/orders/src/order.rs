use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use pickline_core::{ActorId, AggregateRoot, DomainError, DomainResult, OrderId};

/// Order status lifecycle, in the only order it may be traversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Unassigned,
    Assigned,
    Picking,
    Picked,
    Checking,
    Done,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Unassigned,
        OrderStatus::Assigned,
        OrderStatus::Picking,
        OrderStatus::Picked,
        OrderStatus::Checking,
        OrderStatus::Done,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Unassigned => "UNASSIGNED",
            OrderStatus::Assigned => "ASSIGNED",
            OrderStatus::Picking => "PICKING",
            OrderStatus::Picked => "PICKED",
            OrderStatus::Checking => "CHECKING",
            OrderStatus::Done => "DONE",
        }
    }

    /// Position in the lifecycle (0 = UNASSIGNED, 5 = DONE).
    pub fn rank(self) -> u8 {
        self as u8
    }

    /// Once picking has started the assigned picker can no longer change.
    pub fn picker_locked(self) -> bool {
        self >= OrderStatus::Picking
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::validation(format!("unknown order status '{s}'")))
    }
}

/// A timed phase of the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Picking,
    /// Gap between the end of picking and the start of checking.
    Idle,
    Checking,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Picking, Stage::Idle, Stage::Checking];
}

/// A pick-and-check job.
///
/// Fields are public so stores can reconstitute rows; every state change after
/// creation must go through [`crate::transition`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub so_number: String,
    pub size: String,
    pub delivery_type: String,
    pub status: OrderStatus,
    pub picker_id: Option<ActorId>,
    pub checker_id: Option<ActorId>,
    pub picker_start: Option<DateTime<Utc>>,
    pub picker_end: Option<DateTime<Utc>>,
    pub idle_start: Option<DateTime<Utc>>,
    pub idle_end: Option<DateTime<Utc>>,
    pub checker_start: Option<DateTime<Utc>>,
    pub checker_end: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: u64,
}

impl Order {
    /// Start and end timestamps bounding a stage.
    pub fn stage_bounds(&self, stage: Stage) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        match stage {
            Stage::Picking => (self.picker_start, self.picker_end),
            Stage::Idle => (self.idle_start, self.idle_end),
            Stage::Checking => (self.checker_start, self.checker_end),
        }
    }

    /// Elapsed time of a stage, absent until both bounds are recorded.
    pub fn stage_duration(&self, stage: Stage) -> Option<Duration> {
        span(self.stage_bounds(stage))
    }

    pub fn picking_duration(&self) -> Option<Duration> {
        self.stage_duration(Stage::Picking)
    }

    pub fn idle_duration(&self) -> Option<Duration> {
        self.stage_duration(Stage::Idle)
    }

    pub fn checking_duration(&self) -> Option<Duration> {
        self.stage_duration(Stage::Checking)
    }

    /// From the first scan of picking to the end of checking.
    pub fn total_duration(&self) -> Option<Duration> {
        span((self.picker_start, self.checker_end))
    }
}

fn span(bounds: (Option<DateTime<Utc>>, Option<DateTime<Utc>>)) -> Option<Duration> {
    match bounds {
        (Some(start), Some(end)) => Some(end - start),
        _ => None,
    }
}

impl AggregateRoot for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Validated input for order creation; the store assigns the identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub so_number: String,
    pub size: String,
    pub delivery_type: String,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    pub fn new(
        so_number: impl Into<String>,
        size: impl Into<String>,
        delivery_type: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        Ok(Self {
            so_number: required("so_number", so_number.into())?,
            size: required("size", size.into())?,
            delivery_type: required("delivery_type", delivery_type.into())?,
            created_at,
        })
    }

    /// Materialize the initial `UNASSIGNED` state under a store-assigned id.
    pub fn into_order(self, id: OrderId) -> Order {
        Order {
            id,
            so_number: self.so_number,
            size: self.size,
            delivery_type: self.delivery_type,
            status: OrderStatus::Unassigned,
            picker_id: None,
            checker_id: None,
            picker_start: None,
            picker_end: None,
            idle_start: None,
            idle_end: None,
            checker_start: None,
            checker_end: None,
            created_at: self.created_at,
            updated_at: self.created_at,
            version: 1,
        }
    }
}

fn required(field: &str, value: String) -> DomainResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 18, h, m, s).unwrap()
    }

    #[test]
    fn status_round_trips_through_its_wire_name() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert_eq!(
            serde_json::to_string(&OrderStatus::Unassigned).unwrap(),
            "\"UNASSIGNED\""
        );
        assert!("SHIPPED".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn ranks_follow_lifecycle_order() {
        let ranks: Vec<u8> = OrderStatus::ALL.iter().map(|s| s.rank()).collect();
        assert_eq!(ranks, vec![0, 1, 2, 3, 4, 5]);
        assert!(!OrderStatus::Assigned.picker_locked());
        assert!(OrderStatus::Picking.picker_locked());
    }

    #[test]
    fn new_order_trims_and_rejects_blank_fields() {
        let order = NewOrder::new(" SO-1001 ", "M", "STANDARD", t(8, 0, 0)).unwrap();
        assert_eq!(order.so_number, "SO-1001");

        let err = NewOrder::new("   ", "M", "STANDARD", t(8, 0, 0)).unwrap_err();
        assert_eq!(err, DomainError::validation("so_number must not be empty"));
    }

    #[test]
    fn fresh_order_is_unassigned_without_durations() {
        let order = NewOrder::new("SO-1", "S", "EXPRESS", t(8, 0, 0))
            .unwrap()
            .into_order(OrderId::new(1));

        assert_eq!(order.status, OrderStatus::Unassigned);
        assert_eq!(order.version(), 1);
        assert_eq!(order.updated_at, order.created_at);
        for stage in Stage::ALL {
            assert_eq!(order.stage_duration(stage), None);
        }
        assert_eq!(order.total_duration(), None);
    }

    #[test]
    fn durations_need_both_bounds() {
        let mut order = NewOrder::new("SO-2", "L", "STANDARD", t(8, 0, 0))
            .unwrap()
            .into_order(OrderId::new(2));

        order.picker_start = Some(t(9, 0, 0));
        assert_eq!(order.picking_duration(), None);

        order.picker_end = Some(t(9, 12, 30));
        assert_eq!(order.picking_duration(), Some(Duration::seconds(750)));
        assert_eq!(order.total_duration(), None);

        order.checker_end = Some(t(10, 0, 0));
        assert_eq!(order.total_duration(), Some(Duration::hours(1)));
    }
}
