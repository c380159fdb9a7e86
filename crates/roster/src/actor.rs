use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pickline_core::{ActorId, DomainError, DomainResult, Entity};

/// Which roster an actor belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorKind {
    Picker,
    Checker,
}

impl ActorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActorKind::Picker => "picker",
            ActorKind::Checker => "checker",
        }
    }
}

impl core::fmt::Display for ActorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Roster status. Tagged rather than boolean so new states need no schema change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ActorStatus {
    #[default]
    Active,
    Inactive,
}

impl ActorStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ActorStatus::Active => "active",
            ActorStatus::Inactive => "inactive",
        }
    }
}

impl core::str::FromStr for ActorStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(ActorStatus::Active),
            "inactive" => Ok(ActorStatus::Inactive),
            other => Err(DomainError::validation(format!("unknown actor status '{other}'"))),
        }
    }
}

/// A picker or checker on the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub kind: ActorKind,
    pub name: String,
    pub status: ActorStatus,
    pub created_at: DateTime<Utc>,
}

impl Actor {
    pub fn is_active(&self) -> bool {
        self.status == ActorStatus::Active
    }

    /// Soft delete. Idempotent: deactivating an inactive actor changes nothing.
    pub fn deactivate(&mut self) -> bool {
        if self.status == ActorStatus::Inactive {
            return false;
        }
        self.status = ActorStatus::Inactive;
        true
    }
}

impl Entity for Actor {
    type Id = ActorId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn label(&self) -> &str {
        &self.name
    }
}

/// Validated input for roster creation; the store assigns the identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActor {
    pub kind: ActorKind,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl NewActor {
    pub fn new(kind: ActorKind, name: impl Into<String>, created_at: DateTime<Utc>) -> DomainResult<Self> {
        let name = name.into();
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation(format!("{kind} name must not be empty")));
        }
        Ok(Self {
            kind,
            name: name.to_string(),
            created_at,
        })
    }

    pub fn into_actor(self, id: ActorId) -> Actor {
        Actor {
            id,
            kind: self.kind,
            name: self.name,
            status: ActorStatus::Active,
            created_at: self.created_at,
        }
    }
}
