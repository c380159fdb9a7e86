//! Read-only projections over orders: the admin listing and the daily export.
//!
//! Nothing here writes. Actor names are joined at read time (inactive actors
//! included) and durations are derived from the stored timestamps, so a report
//! can never disagree with the order it was built from.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use tracing::instrument;

use pickline_core::ActorId;
use pickline_orders::Order;
use pickline_roster::ActorKind;

use crate::directory::Directory;
use crate::engine::EngineError;
use crate::store::OrderStore;

/// An order with joined actor names and formatted stage durations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderListing {
    #[serde(flatten)]
    pub order: Order,
    pub picker_name: Option<String>,
    pub checker_name: Option<String>,
    pub picking_time: Option<String>,
    pub idle_time: Option<String>,
    pub checking_time: Option<String>,
    pub total_time: Option<String>,
}

/// One flattened spreadsheet row of the daily export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    #[serde(rename = "SO Number")]
    pub so_number: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Order Size")]
    pub size: String,
    #[serde(rename = "Delivery Type")]
    pub delivery_type: String,
    #[serde(rename = "Picker Name")]
    pub picker_name: Option<String>,
    #[serde(rename = "Pick Start")]
    pub pick_start: Option<String>,
    #[serde(rename = "Pick End")]
    pub pick_end: Option<String>,
    #[serde(rename = "Picking Duration")]
    pub picking_duration: Option<String>,
    #[serde(rename = "Idle Start")]
    pub idle_start: Option<String>,
    #[serde(rename = "Idle End")]
    pub idle_end: Option<String>,
    #[serde(rename = "Idle Time")]
    pub idle_time: Option<String>,
    #[serde(rename = "Checker Name")]
    pub checker_name: Option<String>,
    #[serde(rename = "Check Start")]
    pub check_start: Option<String>,
    #[serde(rename = "Check End")]
    pub check_end: Option<String>,
    #[serde(rename = "Checking Duration")]
    pub checking_duration: Option<String>,
    #[serde(rename = "Total Duration")]
    pub total_duration: Option<String>,
    #[serde(rename = "Date")]
    pub date: NaiveDate,
}

/// `HH:MM:SS`; hours are not wrapped at 24.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.num_seconds();
    let sign = if secs < 0 { "-" } else { "" };
    let secs = secs.unsigned_abs();
    format!("{sign}{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Wall-clock `HH:MM:SS` in UTC.
pub fn format_clock(at: DateTime<Utc>) -> String {
    at.format("%H:%M:%S").to_string()
}

struct NameIndex {
    pickers: HashMap<ActorId, String>,
    checkers: HashMap<ActorId, String>,
}

impl NameIndex {
    fn picker(&self, order: &Order) -> Option<String> {
        order.picker_id.and_then(|id| self.pickers.get(&id).cloned())
    }

    fn checker(&self, order: &Order) -> Option<String> {
        order.checker_id.and_then(|id| self.checkers.get(&id).cloned())
    }
}

#[derive(Clone)]
pub struct OrderReports {
    orders: Arc<dyn OrderStore>,
    directory: Directory,
}

impl OrderReports {
    pub fn new(orders: Arc<dyn OrderStore>, directory: Directory) -> Self {
        Self { orders, directory }
    }

    async fn names(&self) -> Result<NameIndex, EngineError> {
        Ok(NameIndex {
            pickers: self.directory.names(ActorKind::Picker).await?,
            checkers: self.directory.names(ActorKind::Checker).await?,
        })
    }

    /// Every order, newest first.
    #[instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<OrderListing>, EngineError> {
        let orders = self.orders.list_newest_first().await?;
        let names = self.names().await?;
        Ok(orders.into_iter().map(|o| listing(o, &names)).collect())
    }

    /// A single order with the same joins as the listing.
    pub async fn order(&self, order: Order) -> Result<OrderListing, EngineError> {
        let names = self.names().await?;
        Ok(listing(order, &names))
    }

    /// Orders created on `date` (UTC), oldest first.
    #[instrument(skip(self), fields(date = %date))]
    pub async fn export(&self, date: NaiveDate) -> Result<Vec<ExportRow>, EngineError> {
        let orders = self.orders.list_created_on(date).await?;
        let names = self.names().await?;
        tracing::debug!(rows = orders.len(), "export built");
        Ok(orders.iter().map(|o| export_row(o, &names)).collect())
    }
}

fn listing(order: Order, names: &NameIndex) -> OrderListing {
    OrderListing {
        picker_name: names.picker(&order),
        checker_name: names.checker(&order),
        picking_time: order.picking_duration().map(format_duration),
        idle_time: order.idle_duration().map(format_duration),
        checking_time: order.checking_duration().map(format_duration),
        total_time: order.total_duration().map(format_duration),
        order,
    }
}

fn export_row(order: &Order, names: &NameIndex) -> ExportRow {
    ExportRow {
        so_number: order.so_number.clone(),
        status: order.status.to_string(),
        size: order.size.clone(),
        delivery_type: order.delivery_type.clone(),
        picker_name: names.picker(order),
        pick_start: order.picker_start.map(format_clock),
        pick_end: order.picker_end.map(format_clock),
        picking_duration: order.picking_duration().map(format_duration),
        idle_start: order.idle_start.map(format_clock),
        idle_end: order.idle_end.map(format_clock),
        idle_time: order.idle_duration().map(format_duration),
        checker_name: names.checker(order),
        check_start: order.checker_start.map(format_clock),
        check_end: order.checker_end.map(format_clock),
        checking_duration: order.checking_duration().map(format_duration),
        total_duration: order.total_duration().map(format_duration),
        date: order.created_at.date_naive(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pickline_core::OrderId;
    use pickline_orders::{NewOrder, OrderStatus};

    #[test]
    fn durations_are_zero_padded_and_unwrapped() {
        assert_eq!(format_duration(Duration::seconds(0)), "00:00:00");
        assert_eq!(format_duration(Duration::seconds(3 * 60 + 5)), "00:03:05");
        assert_eq!(format_duration(Duration::hours(26) + Duration::minutes(1)), "26:01:00");
        assert_eq!(format_duration(Duration::seconds(-61)), "-00:01:01");
    }

    #[test]
    fn clock_is_rendered_in_utc() {
        let at = Utc.with_ymd_and_hms(2026, 2, 18, 9, 7, 3).unwrap();
        assert_eq!(format_clock(at), "09:07:03");
    }

    #[test]
    fn export_row_uses_spreadsheet_headers() {
        let created = Utc.with_ymd_and_hms(2026, 2, 18, 8, 0, 0).unwrap();
        let mut order = NewOrder::new("SO-1001", "L", "PICKUP", created)
            .unwrap()
            .into_order(OrderId::new(1));
        order.status = OrderStatus::Picking;
        order.picker_id = Some(ActorId::new(3));
        order.picker_start = Some(created + Duration::minutes(5));

        let names = NameIndex {
            pickers: HashMap::from([(ActorId::new(3), "Amy".to_string())]),
            checkers: HashMap::new(),
        };
        let row = serde_json::to_value(export_row(&order, &names)).unwrap();

        assert_eq!(row["SO Number"], "SO-1001");
        assert_eq!(row["Status"], "PICKING");
        assert_eq!(row["Picker Name"], "Amy");
        assert_eq!(row["Pick Start"], "08:05:00");
        assert!(row["Pick End"].is_null());
        assert!(row["Total Duration"].is_null());
        assert_eq!(row["Date"], "2026-02-18");
    }

    #[test]
    fn listing_flattens_the_order() {
        let created = Utc.with_ymd_and_hms(2026, 2, 18, 8, 0, 0).unwrap();
        let order = NewOrder::new("SO-1", "S", "DELIVERY", created)
            .unwrap()
            .into_order(OrderId::new(5));
        let names = NameIndex {
            pickers: HashMap::new(),
            checkers: HashMap::new(),
        };
        let json = serde_json::to_value(listing(order, &names)).unwrap();

        assert_eq!(json["id"], 5);
        assert_eq!(json["status"], "UNASSIGNED");
        assert!(json["picker_name"].is_null());
        assert!(json["picking_time"].is_null());
    }
}
