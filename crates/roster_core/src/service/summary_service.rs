//! Weekly summary use-case service.

use crate::model::actor::{ActorContext, AuditStamp};
use crate::model::ident::{decode_for, EntityKind, IdInput};
use crate::model::weekly_summary::{NewWeeklySummary, WeeklySummary, WeeklySummaryDraft};
use crate::repo::project_repo::{ProjectStore, SqliteProjectStore};
use crate::repo::summary_repo::{SqliteWeeklySummaryStore, WeeklySummaryStore};
use crate::service::error::ServiceResult;
use crate::service::{guard, observe};
use rusqlite::{Connection, TransactionBehavior};
use std::time::Instant;

pub struct WeeklySummaryService<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> WeeklySummaryService<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }

    /// Creates a summary linked to the given projects.
    ///
    /// # Errors
    /// - `NotFound { Project }` when any listed project does not exist.
    pub fn create(
        &mut self,
        ctx: &ActorContext,
        new: &NewWeeklySummary,
    ) -> ServiceResult<WeeklySummary> {
        let started_at = Instant::now();
        let result = self.create_inner(ctx, new);
        observe("weekly_summary_create", started_at, result)
    }

    pub fn get(&self, id: impl Into<IdInput>) -> ServiceResult<WeeklySummary> {
        let summary_id = decode_for(EntityKind::WeeklySummary, id)?;
        let summaries = SqliteWeeklySummaryStore::try_new(self.conn)?;
        guard::require_existing(EntityKind::WeeklySummary, summary_id, |id| {
            summaries.find_by_id(id)
        })
    }

    /// All summaries, most recent week first.
    pub fn list(&self) -> ServiceResult<Vec<WeeklySummary>> {
        let summaries = SqliteWeeklySummaryStore::try_new(self.conn)?;
        Ok(summaries.find_all()?)
    }

    pub fn hard_delete(&mut self, id: impl Into<IdInput>) -> ServiceResult<()> {
        let started_at = Instant::now();
        let result = self.hard_delete_inner(id.into());
        observe("weekly_summary_hard_delete", started_at, result)
    }

    fn create_inner(
        &mut self,
        ctx: &ActorContext,
        new: &NewWeeklySummary,
    ) -> ServiceResult<WeeklySummary> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let created = {
            let projects = SqliteProjectStore::try_new(&tx)?;
            for &project_id in &new.project_ids {
                guard::require_existing(EntityKind::Project, project_id, |id| {
                    projects.find_by_id(id)
                })?;
            }

            let summaries = SqliteWeeklySummaryStore::try_new(&tx)?;
            let summary_id = summaries.insert(&WeeklySummaryDraft {
                week_start: new.week_start.trim().to_string(),
                week_end: new.week_end.trim().to_string(),
                summary: new.summary.clone(),
                project_ids: new.project_ids.iter().copied().collect(),
                audit: AuditStamp::created(ctx),
            })?;
            guard::require_existing(EntityKind::WeeklySummary, summary_id, |id| {
                summaries.find_by_id(id)
            })?
        };
        tx.commit()?;
        Ok(created)
    }

    fn hard_delete_inner(&mut self, id: IdInput) -> ServiceResult<()> {
        let summary_id = decode_for(EntityKind::WeeklySummary, id)?;
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        {
            let summaries = SqliteWeeklySummaryStore::try_new(&tx)?;
            guard::require_existing(EntityKind::WeeklySummary, summary_id, |id| {
                summaries.find_by_id(id)
            })?;
            summaries.delete(summary_id)?;
        }
        tx.commit()?;
        Ok(())
    }
}
