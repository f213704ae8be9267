//! Project store contract and SQLite implementation.
//!
//! # Invariants
//! - `save` is conditional on the version the caller loaded and bumps it.
//! - `delete` removes only the project row; inbound references must already
//!   be detached, otherwise the foreign key rejects the delete.

use crate::model::ident::EntityKind;
use crate::model::project::{Project, ProjectDraft, ProjectId, ProjectListQuery};
use crate::repo::{
    bool_to_int, ensure_connection_ready, name_key, parse_audit, parse_flag, RepoError,
    RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const PROJECT_SELECT_SQL: &str = "SELECT
    id,
    name,
    is_deleted,
    account_id,
    version,
    created_at,
    created_by,
    updated_at,
    updated_by
FROM projects";

/// Store interface for project rows.
pub trait ProjectStore {
    fn find_by_id(&self, id: ProjectId) -> RepoResult<Option<Project>>;
    fn find_all(&self, query: &ProjectListQuery) -> RepoResult<Vec<Project>>;
    /// Whether an active project other than `excluding` has this name, compared by `name_key`.
    fn exists_by_name(&self, name: &str, excluding: Option<ProjectId>) -> RepoResult<bool>;
    fn insert(&self, draft: &ProjectDraft) -> RepoResult<ProjectId>;
    /// Writes `project` if the stored version still equals `project.version`.
    ///
    /// Returns the new version.
    fn save(&self, project: &Project) -> RepoResult<i64>;
    fn delete(&self, id: ProjectId) -> RepoResult<()>;
}

pub struct SqliteProjectStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProjectStore<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["projects", "accounts"])?;
        Ok(Self { conn })
    }
}

impl ProjectStore for SqliteProjectStore<'_> {
    fn find_by_id(&self, id: ProjectId) -> RepoResult<Option<Project>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PROJECT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_project_row(row)?));
        }
        Ok(None)
    }

    fn find_all(&self, query: &ProjectListQuery) -> RepoResult<Vec<Project>> {
        let mut sql = format!("{PROJECT_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if !query.include_deleted {
            sql.push_str(" AND is_deleted = 0");
        }
        if let Some(name) = query.name.as_ref() {
            sql.push_str(" AND name_key = ?");
            bind_values.push(Value::Text(name_key(name)));
        }
        sql.push_str(" ORDER BY id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut projects = Vec::new();
        while let Some(row) = rows.next()? {
            projects.push(parse_project_row(row)?);
        }
        Ok(projects)
    }

    fn exists_by_name(&self, name: &str, excluding: Option<ProjectId>) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM projects
                WHERE name_key = ?1
                  AND is_deleted = 0
                  AND (?2 IS NULL OR id != ?2)
            );",
            params![name_key(name), excluding],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn insert(&self, draft: &ProjectDraft) -> RepoResult<ProjectId> {
        self.conn.execute(
            "INSERT INTO projects (
                name,
                name_key,
                is_deleted,
                account_id,
                version,
                created_at,
                created_by,
                updated_at,
                updated_by
            ) VALUES (?1, ?2, 0, ?3, 1, ?4, ?5, ?6, ?7);",
            params![
                draft.name.as_str(),
                name_key(&draft.name),
                draft.account_id,
                draft.audit.created_at,
                draft.audit.created_by.as_str(),
                draft.audit.updated_at,
                draft.audit.updated_by.as_deref(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn save(&self, project: &Project) -> RepoResult<i64> {
        let changed = self.conn.execute(
            "UPDATE projects
             SET
                name = ?2,
                name_key = ?3,
                is_deleted = ?4,
                account_id = ?5,
                updated_at = ?6,
                updated_by = ?7,
                version = version + 1
             WHERE id = ?1
               AND version = ?8;",
            params![
                project.id,
                project.name.as_str(),
                name_key(&project.name),
                bool_to_int(project.is_deleted),
                project.account_id,
                project.audit.updated_at,
                project.audit.updated_by.as_deref(),
                project.version,
            ],
        )?;

        if changed == 1 {
            return Ok(project.version + 1);
        }

        if self.find_by_id(project.id)?.is_none() {
            return Err(RepoError::NotFound {
                kind: EntityKind::Project,
                id: project.id,
            });
        }
        Err(RepoError::VersionConflict {
            kind: EntityKind::Project,
            id: project.id,
            expected: project.version,
        })
    }

    fn delete(&self, id: ProjectId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM projects WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: EntityKind::Project,
                id,
            });
        }
        Ok(())
    }
}

fn parse_project_row(row: &Row<'_>) -> RepoResult<Project> {
    let version: i64 = row.get("version")?;
    if version < 1 {
        return Err(RepoError::InvalidData(format!(
            "invalid version `{version}` in projects.version"
        )));
    }

    Ok(Project {
        id: row.get("id")?,
        name: row.get("name")?,
        is_deleted: parse_flag(row, "is_deleted")?,
        account_id: row.get("account_id")?,
        audit: parse_audit(row)?,
        version,
    })
}
