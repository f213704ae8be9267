//! Weekly summary domain model.

use crate::model::actor::AuditStamp;
use crate::model::ident::{encode, DEFAULT_CODE_WIDTH, WEEKLY_SUMMARY_PREFIX};
use crate::model::project::ProjectId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub type WeeklySummaryId = i64;

/// Status report for one week, linked to the projects it covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySummary {
    pub id: WeeklySummaryId,
    /// ISO-8601 date of the first day of the reported week.
    pub week_start: String,
    /// ISO-8601 date of the last day of the reported week.
    pub week_end: String,
    pub summary: String,
    pub project_ids: BTreeSet<ProjectId>,
    pub audit: AuditStamp,
}

impl WeeklySummary {
    pub fn code(&self) -> String {
        encode(self.id, WEEKLY_SUMMARY_PREFIX, DEFAULT_CODE_WIDTH)
    }
}

/// Creation payload for a weekly summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWeeklySummary {
    pub week_start: String,
    pub week_end: String,
    pub summary: String,
    pub project_ids: Vec<ProjectId>,
}

/// Insert payload for a new weekly summary row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklySummaryDraft {
    pub week_start: String,
    pub week_end: String,
    pub summary: String,
    pub project_ids: BTreeSet<ProjectId>,
    pub audit: AuditStamp,
}
