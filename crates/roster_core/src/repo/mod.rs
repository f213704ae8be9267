//! Repository layer abstractions and SQLite implementations.
//!
//! # Responsibility
//! - Define per-entity store contracts (`find`, `save`, `delete`, lookups).
//! - Define the relationship-containment contract used by project cascade.
//! - Isolate SQL details from service orchestration.
//!
//! # Invariants
//! - Stores borrow a connection and never open transactions themselves, so
//!   every write joins the caller's unit of work.
//! - Repository APIs return semantic errors (`NotFound`, `VersionConflict`)
//!   in addition to DB transport errors.

use crate::db::migrations::{current_version, latest_version};
use crate::db::DbError;
use crate::model::actor::AuditStamp;
use crate::model::ident::EntityKind;
use crate::model::project::ProjectId;
use rusqlite::{params, Connection, Row};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod account_repo;
pub mod person_repo;
pub mod project_repo;
pub mod summary_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Target row does not exist.
    NotFound { kind: EntityKind, id: i64 },
    /// Conditional write lost against a concurrent writer.
    VersionConflict {
        kind: EntityKind,
        id: i64,
        expected: i64,
    },
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    /// Persisted data cannot be converted into a valid record.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::VersionConflict { kind, id, expected } => write!(
                f,
                "{kind} {id} was modified concurrently (expected version {expected})"
            ),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// A record holding a set of project references.
pub trait ProjectLinked {
    fn references_project(&self, project_id: ProjectId) -> bool;
    /// Drops `project_id` from the set. Returns whether it was present.
    fn unlink_project(&mut self, project_id: ProjectId) -> bool;
}

/// Store whose records may reference projects.
///
/// Every collection pointing at projects implements this so project hard
/// delete can detach inbound references before removing the row.
pub trait ProjectReferenceStore {
    type Owner: ProjectLinked;

    /// Stable relation label, e.g. `person.projects`.
    fn relation(&self) -> &'static str;
    /// Loads every owner whose reference set contains `project_id`.
    fn find_owners_referencing(&self, project_id: ProjectId) -> RepoResult<Vec<Self::Owner>>;
    /// Persists all owners, including their full reference sets.
    fn save_all(&self, owners: &[Self::Owner]) -> RepoResult<()>;
}

/// Junction table linking owner rows to projects.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ProjectLinkTable {
    pub table: &'static str,
    pub owner_column: &'static str,
}

impl ProjectLinkTable {
    pub(crate) fn load(&self, conn: &Connection, owner_id: i64) -> RepoResult<BTreeSet<ProjectId>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT project_id FROM {} WHERE {} = ?1 ORDER BY project_id ASC;",
            self.table, self.owner_column
        ))?;
        let mut rows = stmt.query([owner_id])?;
        let mut ids = BTreeSet::new();
        while let Some(row) = rows.next()? {
            ids.insert(row.get::<_, ProjectId>(0)?);
        }
        Ok(ids)
    }

    /// Owner ids whose link set contains `project_id`, ascending.
    pub(crate) fn owners_of(&self, conn: &Connection, project_id: ProjectId) -> RepoResult<Vec<i64>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {owner} FROM {table} WHERE project_id = ?1 ORDER BY {owner} ASC;",
            owner = self.owner_column,
            table = self.table
        ))?;
        let mut rows = stmt.query([project_id])?;
        let mut owners = Vec::new();
        while let Some(row) = rows.next()? {
            owners.push(row.get::<_, i64>(0)?);
        }
        Ok(owners)
    }

    /// Replaces the owner's whole link set with `project_ids`.
    pub(crate) fn replace(
        &self,
        conn: &Connection,
        owner_id: i64,
        project_ids: &BTreeSet<ProjectId>,
    ) -> RepoResult<()> {
        conn.execute(
            &format!("DELETE FROM {} WHERE {} = ?1;", self.table, self.owner_column),
            [owner_id],
        )?;
        let insert_sql = format!(
            "INSERT INTO {} ({}, project_id) VALUES (?1, ?2);",
            self.table, self.owner_column
        );
        for project_id in project_ids {
            conn.execute(&insert_sql, params![owner_id, project_id])?;
        }
        Ok(())
    }
}

pub(crate) fn ensure_connection_ready(conn: &Connection, tables: &[&'static str]) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in tables {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

pub(crate) fn parse_audit(row: &Row<'_>) -> RepoResult<AuditStamp> {
    Ok(AuditStamp {
        created_at: row.get("created_at")?,
        created_by: row.get("created_by")?,
        updated_at: row.get("updated_at")?,
        updated_by: row.get("updated_by")?,
    })
}

pub(crate) fn parse_flag(row: &Row<'_>, column: &'static str) -> RepoResult<bool> {
    match row.get::<_, i64>(column)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid flag value `{other}` in column {column}"
        ))),
    }
}

/// Case-folded lookup key for names.
///
/// Uses full Unicode lowercasing; SQLite `NOCASE` and `lower()` fold ASCII only.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
