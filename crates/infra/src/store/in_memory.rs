use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::NaiveDate;

use pickline_core::{ActorId, ExpectedVersion, OrderId};
use pickline_orders::{NewOrder, Order};
use pickline_roster::{Actor, ActorKind, NewActor};

use super::r#trait::{ActorStore, OrderStore, StoreError};

#[derive(Debug)]
struct Table<K, V> {
    next_id: i64,
    rows: BTreeMap<K, V>,
}

impl<K, V> Default for Table<K, V> {
    fn default() -> Self {
        Self {
            next_id: 1,
            rows: BTreeMap::new(),
        }
    }
}

impl<K, V> Table<K, V> {
    fn allocate_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("lock poisoned".to_string())
}

/// In-memory order store.
///
/// Intended for tests/dev. Compare-and-set runs under the write lock, so it is
/// atomic with respect to every other writer.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    table: RwLock<Table<OrderId, Order>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: NewOrder) -> Result<Order, StoreError> {
        let mut table = self.table.write().map_err(|_| poisoned())?;
        let id = OrderId::new(table.allocate_id());
        let order = order.into_order(id);
        table.rows.insert(id, order.clone());
        Ok(order)
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let table = self.table.read().map_err(|_| poisoned())?;
        Ok(table.rows.get(&id).cloned())
    }

    async fn compare_and_swap(&self, next: &Order, expected: ExpectedVersion) -> Result<Order, StoreError> {
        let mut table = self.table.write().map_err(|_| poisoned())?;
        let current = table
            .rows
            .get_mut(&next.id)
            .ok_or_else(|| StoreError::NotFound(format!("order {}", next.id)))?;

        if !expected.matches(current.version) {
            return Err(StoreError::Conflict(format!(
                "order {}: expected {expected:?}, found {}",
                next.id, current.version
            )));
        }

        *current = next.clone();
        Ok(next.clone())
    }

    async fn list_newest_first(&self) -> Result<Vec<Order>, StoreError> {
        let table = self.table.read().map_err(|_| poisoned())?;
        let mut orders: Vec<Order> = table.rows.values().cloned().collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(orders)
    }

    async fn list_created_on(&self, date: NaiveDate) -> Result<Vec<Order>, StoreError> {
        let table = self.table.read().map_err(|_| poisoned())?;
        let mut orders: Vec<Order> = table
            .rows
            .values()
            .filter(|o| o.created_at.date_naive() == date)
            .cloned()
            .collect();
        orders.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(orders)
    }
}

/// In-memory roster. Pickers and checkers get independent id sequences, like
/// their separate tables in Postgres.
#[derive(Debug, Default)]
pub struct InMemoryActorStore {
    pickers: RwLock<Table<ActorId, Actor>>,
    checkers: RwLock<Table<ActorId, Actor>>,
}

impl InMemoryActorStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self, kind: ActorKind) -> &RwLock<Table<ActorId, Actor>> {
        match kind {
            ActorKind::Picker => &self.pickers,
            ActorKind::Checker => &self.checkers,
        }
    }
}

#[async_trait]
impl ActorStore for InMemoryActorStore {
    async fn insert(&self, actor: NewActor) -> Result<Actor, StoreError> {
        let mut table = self.table(actor.kind).write().map_err(|_| poisoned())?;
        let id = ActorId::new(table.allocate_id());
        let actor = actor.into_actor(id);
        table.rows.insert(id, actor.clone());
        Ok(actor)
    }

    async fn get(&self, kind: ActorKind, id: ActorId) -> Result<Option<Actor>, StoreError> {
        let table = self.table(kind).read().map_err(|_| poisoned())?;
        Ok(table.rows.get(&id).cloned())
    }

    async fn list_active(&self, kind: ActorKind) -> Result<Vec<Actor>, StoreError> {
        let mut actors: Vec<Actor> = self
            .list_all(kind)
            .await?
            .into_iter()
            .filter(Actor::is_active)
            .collect();
        actors.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(actors)
    }

    async fn list_all(&self, kind: ActorKind) -> Result<Vec<Actor>, StoreError> {
        let table = self.table(kind).read().map_err(|_| poisoned())?;
        Ok(table.rows.values().cloned().collect())
    }

    async fn deactivate(&self, kind: ActorKind, id: ActorId) -> Result<Actor, StoreError> {
        let mut table = self.table(kind).write().map_err(|_| poisoned())?;
        let actor = table
            .rows
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("{kind} {id}")))?;
        actor.deactivate();
        Ok(actor.clone())
    }
}
