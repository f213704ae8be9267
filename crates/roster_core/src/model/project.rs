//! Project domain model.
//!
//! # Invariants
//! - `name` is unique among active projects, compared case-insensitively.
//! - `account_id` always points at an existing account.
//! - `version` increases by one on every persisted write.

use crate::model::account::AccountId;
use crate::model::actor::AuditStamp;
use crate::model::ident::{encode, DEFAULT_CODE_WIDTH, PROJECT_PREFIX};
use serde::{Deserialize, Serialize};

pub type ProjectId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    /// Soft-delete flag. Flagged projects stay addressable and linked.
    pub is_deleted: bool,
    pub account_id: AccountId,
    pub audit: AuditStamp,
    /// Optimistic concurrency token.
    pub version: i64,
}

impl Project {
    /// Formatted code, e.g. `PJT003`.
    pub fn code(&self) -> String {
        encode(self.id, PROJECT_PREFIX, DEFAULT_CODE_WIDTH)
    }

    pub fn is_active(&self) -> bool {
        !self.is_deleted
    }
}

/// Creation payload accepted from callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    pub name: String,
    pub account_id: AccountId,
}

/// Insert payload for a new project row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDraft {
    pub name: String,
    pub account_id: AccountId,
    pub audit: AuditStamp,
}

/// Client-settable project fields.
///
/// This is the whole write whitelist for both full and partial update.
/// Audit fields and `id` are deliberately absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectChanges {
    pub name: Option<String>,
    pub is_deleted: Option<bool>,
    pub account_id: Option<AccountId>,
    /// When set, the write fails with a conflict unless the stored version matches.
    pub expected_version: Option<i64>,
}

impl ProjectChanges {
    /// Returns true when no settable field is supplied.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.is_deleted.is_none() && self.account_id.is_none()
    }
}

/// Query options for listing projects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectListQuery {
    /// Exact, case-insensitive name match.
    pub name: Option<String>,
    pub include_deleted: bool,
}
