//! Weekly summary store contract and SQLite implementation.

use crate::model::ident::EntityKind;
use crate::model::project::ProjectId;
use crate::model::weekly_summary::{WeeklySummary, WeeklySummaryDraft, WeeklySummaryId};
use crate::repo::{
    ensure_connection_ready, parse_audit, ProjectLinkTable, ProjectLinked,
    ProjectReferenceStore, RepoError, RepoResult,
};
use rusqlite::{params, Connection, Row};

const SUMMARY_SELECT_SQL: &str = "SELECT
    id,
    week_start,
    week_end,
    summary,
    created_at,
    created_by,
    updated_at,
    updated_by
FROM weekly_summaries";

const SUMMARY_PROJECTS: ProjectLinkTable = ProjectLinkTable {
    table: "weekly_summary_projects",
    owner_column: "summary_id",
};

/// Store interface for weekly summaries and their project links.
pub trait WeeklySummaryStore {
    fn find_by_id(&self, id: WeeklySummaryId) -> RepoResult<Option<WeeklySummary>>;
    fn find_all(&self) -> RepoResult<Vec<WeeklySummary>>;
    fn insert(&self, draft: &WeeklySummaryDraft) -> RepoResult<WeeklySummaryId>;
    fn save(&self, summary: &WeeklySummary) -> RepoResult<()>;
    fn delete(&self, id: WeeklySummaryId) -> RepoResult<()>;
}

pub struct SqliteWeeklySummaryStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteWeeklySummaryStore<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["weekly_summaries", "weekly_summary_projects"])?;
        Ok(Self { conn })
    }

    fn parse_summary_row(&self, row: &Row<'_>) -> RepoResult<WeeklySummary> {
        let id: WeeklySummaryId = row.get("id")?;
        Ok(WeeklySummary {
            id,
            week_start: row.get("week_start")?,
            week_end: row.get("week_end")?,
            summary: row.get("summary")?,
            project_ids: SUMMARY_PROJECTS.load(self.conn, id)?,
            audit: parse_audit(row)?,
        })
    }
}

impl WeeklySummaryStore for SqliteWeeklySummaryStore<'_> {
    fn find_by_id(&self, id: WeeklySummaryId) -> RepoResult<Option<WeeklySummary>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SUMMARY_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(self.parse_summary_row(row)?));
        }
        Ok(None)
    }

    fn find_all(&self) -> RepoResult<Vec<WeeklySummary>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SUMMARY_SELECT_SQL} ORDER BY week_start DESC, id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut summaries = Vec::new();
        while let Some(row) = rows.next()? {
            summaries.push(self.parse_summary_row(row)?);
        }
        Ok(summaries)
    }

    fn insert(&self, draft: &WeeklySummaryDraft) -> RepoResult<WeeklySummaryId> {
        self.conn.execute(
            "INSERT INTO weekly_summaries (
                week_start,
                week_end,
                summary,
                created_at,
                created_by,
                updated_at,
                updated_by
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                draft.week_start.as_str(),
                draft.week_end.as_str(),
                draft.summary.as_str(),
                draft.audit.created_at,
                draft.audit.created_by.as_str(),
                draft.audit.updated_at,
                draft.audit.updated_by.as_deref(),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        SUMMARY_PROJECTS.replace(self.conn, id, &draft.project_ids)?;
        Ok(id)
    }

    fn save(&self, summary: &WeeklySummary) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE weekly_summaries
             SET
                week_start = ?2,
                week_end = ?3,
                summary = ?4,
                updated_at = ?5,
                updated_by = ?6
             WHERE id = ?1;",
            params![
                summary.id,
                summary.week_start.as_str(),
                summary.week_end.as_str(),
                summary.summary.as_str(),
                summary.audit.updated_at,
                summary.audit.updated_by.as_deref(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: EntityKind::WeeklySummary,
                id: summary.id,
            });
        }
        SUMMARY_PROJECTS.replace(self.conn, summary.id, &summary.project_ids)
    }

    fn delete(&self, id: WeeklySummaryId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM weekly_summaries WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: EntityKind::WeeklySummary,
                id,
            });
        }
        Ok(())
    }
}

impl ProjectLinked for WeeklySummary {
    fn references_project(&self, project_id: ProjectId) -> bool {
        self.project_ids.contains(&project_id)
    }

    fn unlink_project(&mut self, project_id: ProjectId) -> bool {
        self.project_ids.remove(&project_id)
    }
}

impl ProjectReferenceStore for SqliteWeeklySummaryStore<'_> {
    type Owner = WeeklySummary;

    fn relation(&self) -> &'static str {
        "weekly_summary.projects"
    }

    fn find_owners_referencing(&self, project_id: ProjectId) -> RepoResult<Vec<WeeklySummary>> {
        let mut owners = Vec::new();
        for summary_id in SUMMARY_PROJECTS.owners_of(self.conn, project_id)? {
            let summary = self.find_by_id(summary_id)?.ok_or(RepoError::NotFound {
                kind: EntityKind::WeeklySummary,
                id: summary_id,
            })?;
            owners.push(summary);
        }
        Ok(owners)
    }

    fn save_all(&self, owners: &[WeeklySummary]) -> RepoResult<()> {
        for summary in owners {
            self.save(summary)?;
        }
        Ok(())
    }
}
