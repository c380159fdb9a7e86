use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use pickline_core::{ActorId, DomainError, OrderId};
use pickline_roster::Actor;

use crate::app::errors;
use axum::http::StatusCode;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub so_number: String,
    pub size: String,
    pub delivery_type: String,
}

#[derive(Debug, Deserialize)]
pub struct PickerRequest {
    pub picker_id: ActorId,
}

#[derive(Debug, Deserialize)]
pub struct CheckerRequest {
    pub checker_id: ActorId,
}

#[derive(Debug, Deserialize)]
pub struct CreateActorRequest {
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    pub date: Option<String>,
}

// -------------------------
// Response DTOs
// -------------------------

/// Public roster entry: what the picker/checker selection screens need.
#[derive(Debug, Serialize)]
pub struct ActorSummary {
    pub id: ActorId,
    pub name: String,
}

impl From<Actor> for ActorSummary {
    fn from(actor: Actor) -> Self {
        Self {
            id: actor.id,
            name: actor.name,
        }
    }
}

// -------------------------
// Parsing helpers
// -------------------------

pub fn parse_order_id(raw: &str) -> Result<OrderId, axum::response::Response> {
    raw.parse::<OrderId>()
        .map_err(|e: DomainError| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", e.to_string()))
}

pub fn parse_actor_id(raw: &str) -> Result<ActorId, axum::response::Response> {
    raw.parse::<ActorId>()
        .map_err(|e: DomainError| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", e.to_string()))
}

/// `YYYY-MM-DD`, defaulting to today's UTC date.
pub fn parse_export_date(raw: Option<&str>) -> Result<NaiveDate, axum::response::Response> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(Utc::now().date_naive()),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| {
            errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_date",
                format!("date must be YYYY-MM-DD, got '{s}'"),
            )
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_date_defaults_to_today() {
        assert_eq!(parse_export_date(None).unwrap(), Utc::now().date_naive());
        assert_eq!(parse_export_date(Some("  ")).unwrap(), Utc::now().date_naive());
        assert_eq!(
            parse_export_date(Some("2026-02-18")).unwrap(),
            NaiveDate::from_ymd_opt(2026, 2, 18).unwrap()
        );
        assert_eq!(
            parse_export_date(Some("18/02/2026")).unwrap_err().status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn path_ids_must_be_positive_integers() {
        assert_eq!(parse_order_id("12").unwrap(), OrderId::new(12));
        assert!(parse_order_id("0").is_err());
        assert!(parse_actor_id("abc").is_err());
    }
}
