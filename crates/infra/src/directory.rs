//! Picker/checker directory service.
//!
//! Thin orchestration over [`ActorStore`]: input validation lives in
//! `pickline-roster`, persistence in the store. The lifecycle engine asks the
//! directory whether an actor id is known before recording it on an order.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::instrument;

use pickline_core::{ActorId, Entity};
use pickline_roster::{Actor, ActorKind, NewActor};

use crate::engine::EngineError;
use crate::store::ActorStore;

#[derive(Clone)]
pub struct Directory {
    actors: Arc<dyn ActorStore>,
}

impl Directory {
    pub fn new(actors: Arc<dyn ActorStore>) -> Self {
        Self { actors }
    }

    /// Active actors of `kind`, ordered by name.
    pub async fn list_active(&self, kind: ActorKind) -> Result<Vec<Actor>, EngineError> {
        Ok(self.actors.list_active(kind).await?)
    }

    #[instrument(skip(self, name), fields(kind = %kind))]
    pub async fn create(
        &self,
        kind: ActorKind,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<Actor, EngineError> {
        let actor = self.actors.insert(NewActor::new(kind, name, now)?).await?;
        tracing::info!(actor_id = %actor.id, "roster entry created");
        Ok(actor)
    }

    /// Soft delete. Orders that reference the actor keep resolving its name.
    #[instrument(skip(self), fields(kind = %kind, actor_id = %id))]
    pub async fn deactivate(&self, kind: ActorKind, id: ActorId) -> Result<Actor, EngineError> {
        let actor = self.actors.deactivate(kind, id).await?;
        tracing::info!("roster entry deactivated");
        Ok(actor)
    }

    /// Resolve an actor by id, active or not.
    pub async fn ensure_exists(&self, kind: ActorKind, id: ActorId) -> Result<Actor, EngineError> {
        self.actors
            .get(kind, id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("{kind} {id}")))
    }

    /// Id → display name for every actor of `kind`, including inactive ones.
    pub async fn names(&self, kind: ActorKind) -> Result<HashMap<ActorId, String>, EngineError> {
        let actors = self.actors.list_all(kind).await?;
        Ok(actors
            .iter()
            .map(|a| (*a.id(), a.label().to_string()))
            .collect())
    }
}
