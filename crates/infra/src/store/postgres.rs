//! Postgres-backed stores.
//!
//! Orders and roster entries live in plain relational tables. Every lifecycle
//! transition is a single conditional `UPDATE ... WHERE id = $1 AND version = $2`,
//! so Postgres' row locking serializes racing writers and the loser sees zero
//! rows affected.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (foreign key violation) | `23503` | `NotFound` |
//! | Database (other) | Any other | `Backend` |
//! | PoolClosed / other | N/A | `Backend` |

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::instrument;

use pickline_core::{ActorId, ExpectedVersion, OrderId};
use pickline_orders::{NewOrder, Order, OrderStatus};
use pickline_roster::{Actor, ActorKind, ActorStatus, NewActor};

use super::r#trait::{ActorStore, OrderStore, StoreError};

const SCHEMA: [&str; 4] = [
    r#"
    CREATE TABLE IF NOT EXISTS pickers (
        id          BIGSERIAL PRIMARY KEY,
        name        TEXT NOT NULL,
        status      TEXT NOT NULL DEFAULT 'active',
        created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS checkers (
        id          BIGSERIAL PRIMARY KEY,
        name        TEXT NOT NULL,
        status      TEXT NOT NULL DEFAULT 'active',
        created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS orders (
        id             BIGSERIAL PRIMARY KEY,
        so_number      TEXT NOT NULL,
        size           TEXT NOT NULL,
        delivery_type  TEXT NOT NULL,
        status         TEXT NOT NULL DEFAULT 'UNASSIGNED',
        picker_id      BIGINT REFERENCES pickers (id),
        checker_id     BIGINT REFERENCES checkers (id),
        picker_start   TIMESTAMPTZ,
        picker_end     TIMESTAMPTZ,
        idle_start     TIMESTAMPTZ,
        idle_end       TIMESTAMPTZ,
        checker_start  TIMESTAMPTZ,
        checker_end    TIMESTAMPTZ,
        created_at     TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at     TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        version        BIGINT NOT NULL DEFAULT 1
    )
    "#,
    "CREATE INDEX IF NOT EXISTS orders_created_at_idx ON orders (created_at)",
];

const ORDER_COLUMNS: &str = "id, so_number, size, delivery_type, status, picker_id, checker_id, \
     picker_start, picker_end, idle_start, idle_end, checker_start, checker_end, \
     created_at, updated_at, version";

/// Open a pool and make sure the tables exist.
pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .context("failed to connect to Postgres")?;

    ensure_schema(&pool).await.context("failed to prepare database schema")?;
    Ok(pool)
}

/// Idempotently create the tables used by the stores (development bootstrap).
#[instrument(skip(pool), err)]
pub async fn ensure_schema(pool: &PgPool) -> Result<(), StoreError> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
    }
    Ok(())
}

/// Postgres-backed order store.
#[derive(Debug, Clone)]
pub struct PostgresOrderStore {
    pool: Arc<PgPool>,
}

impl PostgresOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }

    async fn exists(&self, id: OrderId) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT 1 FROM orders WHERE id = $1")
            .bind(id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("order_exists", e))?;
        Ok(row.is_some())
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    #[instrument(skip(self, order), fields(so_number = %order.so_number), err)]
    async fn insert(&self, order: NewOrder) -> Result<Order, StoreError> {
        let sql = format!(
            "INSERT INTO orders (so_number, size, delivery_type, status, created_at, updated_at, version) \
             VALUES ($1, $2, $3, $4, $5, $5, 1) RETURNING {ORDER_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(&order.so_number)
            .bind(&order.size)
            .bind(&order.delivery_type)
            .bind(OrderStatus::Unassigned.as_str())
            .bind(order.created_at)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_order", e))?;
        order_from_row(&row)
    }

    #[instrument(skip(self), fields(order_id = %id), err)]
    async fn get(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_order", e))?;
        row.as_ref().map(order_from_row).transpose()
    }

    #[instrument(
        skip(self, next),
        fields(order_id = %next.id, status = %next.status, expected_version = ?expected),
        err
    )]
    async fn compare_and_swap(&self, next: &Order, expected: ExpectedVersion) -> Result<Order, StoreError> {
        let expected_version = match expected {
            ExpectedVersion::Any => None,
            ExpectedVersion::Exact(v) => Some(to_db_version(v)?),
        };

        let sql = format!(
            r#"
            UPDATE orders SET
                status = $3,
                picker_id = $4,
                checker_id = $5,
                picker_start = $6,
                picker_end = $7,
                idle_start = $8,
                idle_end = $9,
                checker_start = $10,
                checker_end = $11,
                updated_at = $12,
                version = $13
            WHERE id = $1 AND ($2::BIGINT IS NULL OR version = $2)
            RETURNING {ORDER_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(next.id.get())
            .bind(expected_version)
            .bind(next.status.as_str())
            .bind(next.picker_id.map(|id| id.get()))
            .bind(next.checker_id.map(|id| id.get()))
            .bind(next.picker_start)
            .bind(next.picker_end)
            .bind(next.idle_start)
            .bind(next.idle_end)
            .bind(next.checker_start)
            .bind(next.checker_end)
            .bind(next.updated_at)
            .bind(to_db_version(next.version)?)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("compare_and_swap_order", e))?;

        if let Some(row) = row {
            return order_from_row(&row);
        }

        // Zero rows: either the order is gone or somebody else moved it first.
        if self.exists(next.id).await? {
            Err(StoreError::Conflict(format!("order {}: expected {expected:?}", next.id)))
        } else {
            Err(StoreError::NotFound(format!("order {}", next.id)))
        }
    }

    #[instrument(skip(self), err)]
    async fn list_newest_first(&self) -> Result<Vec<Order>, StoreError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id DESC");
        let rows = sqlx::query(&sql)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_orders", e))?;
        rows.iter().map(order_from_row).collect()
    }

    #[instrument(skip(self), fields(date = %date), err)]
    async fn list_created_on(&self, date: NaiveDate) -> Result<Vec<Order>, StoreError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE (created_at AT TIME ZONE 'UTC')::date = $1 \
             ORDER BY created_at ASC, id ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(date)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_orders_created_on", e))?;
        rows.iter().map(order_from_row).collect()
    }
}

/// Postgres-backed roster; one table per actor kind.
#[derive(Debug, Clone)]
pub struct PostgresActorStore {
    pool: Arc<PgPool>,
}

impl PostgresActorStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }
}

fn actor_table(kind: ActorKind) -> &'static str {
    match kind {
        ActorKind::Picker => "pickers",
        ActorKind::Checker => "checkers",
    }
}

#[async_trait]
impl ActorStore for PostgresActorStore {
    #[instrument(skip(self, actor), fields(kind = %actor.kind), err)]
    async fn insert(&self, actor: NewActor) -> Result<Actor, StoreError> {
        let sql = format!(
            "INSERT INTO {} (name, status, created_at) VALUES ($1, $2, $3) \
             RETURNING id, name, status, created_at",
            actor_table(actor.kind)
        );
        let row = sqlx::query(&sql)
            .bind(&actor.name)
            .bind(ActorStatus::Active.as_str())
            .bind(actor.created_at)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_actor", e))?;
        actor_from_row(actor.kind, &row)
    }

    #[instrument(skip(self), fields(kind = %kind, actor_id = %id), err)]
    async fn get(&self, kind: ActorKind, id: ActorId) -> Result<Option<Actor>, StoreError> {
        let sql = format!(
            "SELECT id, name, status, created_at FROM {} WHERE id = $1",
            actor_table(kind)
        );
        let row = sqlx::query(&sql)
            .bind(id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_actor", e))?;
        row.as_ref().map(|r| actor_from_row(kind, r)).transpose()
    }

    #[instrument(skip(self), fields(kind = %kind), err)]
    async fn list_active(&self, kind: ActorKind) -> Result<Vec<Actor>, StoreError> {
        let sql = format!(
            "SELECT id, name, status, created_at FROM {} WHERE status = $1 ORDER BY name, id",
            actor_table(kind)
        );
        let rows = sqlx::query(&sql)
            .bind(ActorStatus::Active.as_str())
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_active_actors", e))?;
        rows.iter().map(|r| actor_from_row(kind, r)).collect()
    }

    #[instrument(skip(self), fields(kind = %kind), err)]
    async fn list_all(&self, kind: ActorKind) -> Result<Vec<Actor>, StoreError> {
        let sql = format!(
            "SELECT id, name, status, created_at FROM {} ORDER BY id",
            actor_table(kind)
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_actors", e))?;
        rows.iter().map(|r| actor_from_row(kind, r)).collect()
    }

    #[instrument(skip(self), fields(kind = %kind, actor_id = %id), err)]
    async fn deactivate(&self, kind: ActorKind, id: ActorId) -> Result<Actor, StoreError> {
        let sql = format!(
            "UPDATE {} SET status = $2 WHERE id = $1 RETURNING id, name, status, created_at",
            actor_table(kind)
        );
        let row = sqlx::query(&sql)
            .bind(id.get())
            .bind(ActorStatus::Inactive.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("deactivate_actor", e))?;
        match row {
            Some(row) => actor_from_row(kind, &row),
            None => Err(StoreError::NotFound(format!("{kind} {id}"))),
        }
    }
}

fn to_db_version(version: u64) -> Result<i64, StoreError> {
    i64::try_from(version).map_err(|_| StoreError::Backend(format!("version {version} out of range")))
}

fn decode<T>(row: &PgRow, column: &str) -> Result<T, StoreError>
where
    T: for<'r> sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(column)
        .map_err(|e| StoreError::Backend(format!("failed to decode column '{column}': {e}")))
}

fn order_from_row(row: &PgRow) -> Result<Order, StoreError> {
    let status: String = decode(row, "status")?;
    let status = status
        .parse::<OrderStatus>()
        .map_err(|e| StoreError::Backend(e.to_string()))?;
    let version: i64 = decode(row, "version")?;

    Ok(Order {
        id: OrderId::new(decode(row, "id")?),
        so_number: decode(row, "so_number")?,
        size: decode(row, "size")?,
        delivery_type: decode(row, "delivery_type")?,
        status,
        picker_id: decode::<Option<i64>>(row, "picker_id")?.map(ActorId::new),
        checker_id: decode::<Option<i64>>(row, "checker_id")?.map(ActorId::new),
        picker_start: decode::<Option<DateTime<Utc>>>(row, "picker_start")?,
        picker_end: decode::<Option<DateTime<Utc>>>(row, "picker_end")?,
        idle_start: decode::<Option<DateTime<Utc>>>(row, "idle_start")?,
        idle_end: decode::<Option<DateTime<Utc>>>(row, "idle_end")?,
        checker_start: decode::<Option<DateTime<Utc>>>(row, "checker_start")?,
        checker_end: decode::<Option<DateTime<Utc>>>(row, "checker_end")?,
        created_at: decode(row, "created_at")?,
        updated_at: decode(row, "updated_at")?,
        version: u64::try_from(version)
            .map_err(|_| StoreError::Backend(format!("negative version {version}")))?,
    })
}

fn actor_from_row(kind: ActorKind, row: &PgRow) -> Result<Actor, StoreError> {
    let status: String = decode(row, "status")?;
    Ok(Actor {
        id: ActorId::new(decode(row, "id")?),
        kind,
        name: decode(row, "name")?,
        status: status
            .parse::<ActorStatus>()
            .map_err(|e| StoreError::Backend(e.to_string()))?,
        created_at: decode(row, "created_at")?,
    })
}

/// Map SQLx errors to `StoreError`.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(msg),
                // Referencing a picker/checker row that does not exist.
                Some("23503") => StoreError::NotFound(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => StoreError::Backend(format!("connection pool closed in {operation}")),
        _ => StoreError::Backend(format!("sqlx error in {operation}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pickline_orders::{AssignPicker, OrderCommand, transition};

    #[test]
    fn pool_closed_maps_to_backend() {
        let err = map_sqlx_error("list_orders", sqlx::Error::PoolClosed);
        assert!(matches!(err, StoreError::Backend(msg) if msg.contains("list_orders")));
    }

    #[test]
    fn actor_tables_are_split_by_kind() {
        assert_eq!(actor_table(ActorKind::Picker), "pickers");
        assert_eq!(actor_table(ActorKind::Checker), "checkers");
    }

    #[test]
    fn versions_beyond_bigint_are_rejected() {
        assert_eq!(to_db_version(7).unwrap(), 7);
        assert!(to_db_version(u64::MAX).is_err());
    }

    /// Pool for the database in `DATABASE_URL`; `None` skips the test.
    async fn test_pool() -> Option<PgPool> {
        let url = std::env::var("DATABASE_URL").ok()?;
        Some(connect(&url, 2).await.expect("failed to connect to DATABASE_URL"))
    }

    #[tokio::test]
    async fn conditional_update_lands_once_per_version() {
        let Some(pool) = test_pool().await else {
            return;
        };
        let orders = PostgresOrderStore::new(pool.clone());
        let actors = PostgresActorStore::new(pool);

        let picker = actors
            .insert(NewActor::new(ActorKind::Picker, "Amy", Utc::now()).unwrap())
            .await
            .unwrap();
        let order = orders
            .insert(NewOrder::new("SO-PG-CAS", "M", "PICKUP", Utc::now()).unwrap())
            .await
            .unwrap();
        assert_eq!(order.version, 1);
        assert_eq!(order.status, OrderStatus::Unassigned);

        let assign = OrderCommand::AssignPicker(AssignPicker {
            order_id: order.id,
            picker_id: picker.id,
            occurred_at: Utc::now(),
        });
        let next = transition(&order, &assign).unwrap();

        let saved = orders
            .compare_and_swap(&next, ExpectedVersion::Exact(order.version))
            .await
            .unwrap();
        assert_eq!(saved.version, 2);
        assert_eq!(saved.status, OrderStatus::Assigned);
        assert_eq!(saved.picker_id, Some(picker.id));

        // Same expectation again: the row has moved on.
        let err = orders
            .compare_and_swap(&next, ExpectedVersion::Exact(order.version))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let stored = orders.get(order.id).await.unwrap().unwrap();
        assert_eq!(stored.version, 2);
    }

    #[tokio::test]
    async fn conditional_update_of_missing_row_is_not_found() {
        let Some(pool) = test_pool().await else {
            return;
        };
        let orders = PostgresOrderStore::new(pool.clone());
        let actors = PostgresActorStore::new(pool);

        let mut ghost = NewOrder::new("SO-PG-GHOST", "M", "PICKUP", Utc::now())
            .unwrap()
            .into_order(OrderId::new(i64::MAX));
        ghost.version = 2;
        let err = orders
            .compare_and_swap(&ghost, ExpectedVersion::Exact(1))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));

        let err = actors
            .deactivate(ActorKind::Checker, ActorId::new(i64::MAX))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
