//! Acting identity and audit stamps.
//!
//! # Responsibility
//! - Carry the caller identity explicitly into every lifecycle call.
//! - Stamp `created_*` / `updated_*` audit fields on behalf of that caller.
//!
//! # Invariants
//! - Audit fields are written only by the system, never from payloads.
//! - A missing or blank actor is recorded as `System`.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Display name used when no authenticated actor is available.
pub const SYSTEM_ACTOR: &str = "System";

/// Authenticated caller identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    display_name: String,
}

impl Actor {
    /// Builds an actor from first/last name, joined by one space.
    pub fn new(first_name: &str, last_name: &str) -> Self {
        Self::named(format!("{} {}", first_name.trim(), last_name.trim()))
    }

    /// Builds an actor from a preformatted display name.
    pub fn named(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into().trim().to_string(),
        }
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

/// Explicit acting-identity context passed to lifecycle operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActorContext {
    actor: Option<Actor>,
}

impl ActorContext {
    /// Context with no authenticated caller; stamps as `System`.
    pub fn system() -> Self {
        Self { actor: None }
    }

    pub fn authenticated(actor: Actor) -> Self {
        Self { actor: Some(actor) }
    }

    /// Returns the authenticated caller, if any.
    pub fn current_actor(&self) -> Option<&Actor> {
        self.actor
            .as_ref()
            .filter(|actor| !actor.display_name.is_empty())
    }

    /// Name written into audit fields.
    pub fn display_name(&self) -> &str {
        self.current_actor()
            .map_or(SYSTEM_ACTOR, |actor| actor.display_name())
    }
}

/// System-maintained audit metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStamp {
    /// Unix epoch milliseconds.
    pub created_at: i64,
    pub created_by: String,
    /// Unix epoch milliseconds of the last mutation, if any.
    pub updated_at: Option<i64>,
    pub updated_by: Option<String>,
}

impl AuditStamp {
    /// Stamp for a record created now by `ctx`.
    pub fn created(ctx: &ActorContext) -> Self {
        Self {
            created_at: now_epoch_ms(),
            created_by: ctx.display_name().to_string(),
            updated_at: None,
            updated_by: None,
        }
    }

    /// Records a mutation performed now by `ctx`.
    pub fn touch(&mut self, ctx: &ActorContext) {
        self.updated_at = Some(now_epoch_ms());
        self.updated_by = Some(ctx.display_name().to_string());
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as i64)
}
