//! Project lifecycle service.
//!
//! # Responsibility
//! - Orchestrate project create/get/list/update/partial-update/soft-delete/
//!   hard-delete over the project, account, person and summary stores.
//! - Stamp audit fields from the explicit `ActorContext`.
//!
//! # Invariants
//! - Every mutation runs in one immediate transaction: guards, cascade and
//!   the final write commit together or not at all.
//! - Ids are decoded once at entry; stores only see canonical integers.
//! - Soft delete flips the flag only; hard delete detaches every inbound
//!   reference before removing the row.
//! - Each persisted write bumps `version`; a caller-supplied
//!   `expected_version` that no longer matches fails with `Conflict`.

use crate::model::actor::{ActorContext, AuditStamp};
use crate::model::ident::{decode_for, EntityKind, IdInput};
use crate::model::project::{NewProject, Project, ProjectChanges, ProjectDraft, ProjectListQuery};
use crate::repo::account_repo::{AccountStore, SqliteAccountStore};
use crate::repo::person_repo::SqlitePersonStore;
use crate::repo::project_repo::{ProjectStore, SqliteProjectStore};
use crate::repo::summary_repo::SqliteWeeklySummaryStore;
use crate::service::cascade::CascadeResolver;
use crate::service::error::{ServiceError, ServiceResult};
use crate::service::guard;
use crate::service::observe;
use log::info;
use rusqlite::{Connection, TransactionBehavior};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UpdateMode {
    /// Always stamps and persists, even when no field is supplied.
    Full,
    /// Applies supplied fields only; an empty change set is a no-op.
    Partial,
}

/// Project lifecycle facade over a SQLite connection.
pub struct ProjectService<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> ProjectService<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }

    /// Creates a project under an existing account.
    ///
    /// # Errors
    /// - `DuplicateName` when an active project already uses the name.
    /// - `NotFound { Account }` when the account does not exist.
    pub fn create(&mut self, ctx: &ActorContext, new: &NewProject) -> ServiceResult<Project> {
        let started_at = Instant::now();
        observe("project_create", started_at, self.create_inner(ctx, new))
    }

    /// Loads one project by numeric id or `PJT` code, soft-deleted included.
    pub fn get(&self, id: impl Into<IdInput>) -> ServiceResult<Project> {
        let project_id = decode_for(EntityKind::Project, id)?;
        let projects = SqliteProjectStore::try_new(self.conn)?;
        guard::require_existing(EntityKind::Project, project_id, |id| projects.find_by_id(id))
    }

    pub fn list(&self, query: &ProjectListQuery) -> ServiceResult<Vec<Project>> {
        let projects = SqliteProjectStore::try_new(self.conn)?;
        Ok(projects.find_all(query)?)
    }

    /// Projects whose name equals `name`, ignoring case.
    ///
    /// Soft-deleted projects are included; callers check `is_deleted`.
    pub fn search_by_name(&self, name: &str) -> ServiceResult<Vec<Project>> {
        self.list(&ProjectListQuery {
            name: Some(name.to_string()),
            include_deleted: true,
        })
    }

    /// Full update over the client-settable whitelist.
    ///
    /// Always re-stamps `updated_at/updated_by` and bumps the version.
    pub fn update(
        &mut self,
        ctx: &ActorContext,
        id: impl Into<IdInput>,
        changes: &ProjectChanges,
    ) -> ServiceResult<Project> {
        let started_at = Instant::now();
        let result = self.apply_changes(ctx, id.into(), changes, UpdateMode::Full);
        observe("project_update", started_at, result)
    }

    /// Field-level merge: only supplied fields change.
    ///
    /// An empty change set returns the stored project untouched.
    pub fn partial_update(
        &mut self,
        ctx: &ActorContext,
        id: impl Into<IdInput>,
        changes: &ProjectChanges,
    ) -> ServiceResult<Project> {
        let started_at = Instant::now();
        let result = self.apply_changes(ctx, id.into(), changes, UpdateMode::Partial);
        observe("project_partial_update", started_at, result)
    }

    /// Flags the project as deleted; links and row are kept.
    pub fn soft_delete(
        &mut self,
        ctx: &ActorContext,
        id: impl Into<IdInput>,
    ) -> ServiceResult<Project> {
        let started_at = Instant::now();
        let changes = ProjectChanges {
            is_deleted: Some(true),
            ..ProjectChanges::default()
        };
        let result = self.apply_changes(ctx, id.into(), &changes, UpdateMode::Partial);
        observe("project_soft_delete", started_at, result)
    }

    /// Detaches every inbound reference, then removes the project row.
    ///
    /// Irreversible. Any failure rolls back all detach writes.
    pub fn hard_delete(&mut self, id: impl Into<IdInput>) -> ServiceResult<()> {
        let started_at = Instant::now();
        let result = self.hard_delete_inner(id.into());
        observe("project_hard_delete", started_at, result)
    }

    fn create_inner(&mut self, ctx: &ActorContext, new: &NewProject) -> ServiceResult<Project> {
        let name = guard::normalize_name(EntityKind::Project, &new.name)?;
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let created = {
            let projects = SqliteProjectStore::try_new(&tx)?;
            let accounts = SqliteAccountStore::try_new(&tx)?;

            guard::assert_unique_name(EntityKind::Project, &name, |name| {
                projects.exists_by_name(name, None)
            })?;
            guard::require_existing(EntityKind::Account, new.account_id, |id| {
                accounts.find_by_id(id)
            })?;

            let project_id = projects.insert(&ProjectDraft {
                name,
                account_id: new.account_id,
                audit: AuditStamp::created(ctx),
            })?;
            guard::require_existing(EntityKind::Project, project_id, |id| {
                projects.find_by_id(id)
            })?
        };
        tx.commit()?;
        Ok(created)
    }

    fn apply_changes(
        &mut self,
        ctx: &ActorContext,
        id: IdInput,
        changes: &ProjectChanges,
        mode: UpdateMode,
    ) -> ServiceResult<Project> {
        let project_id = decode_for(EntityKind::Project, id)?;
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let updated = {
            let projects = SqliteProjectStore::try_new(&tx)?;
            let mut project = guard::require_existing(EntityKind::Project, project_id, |id| {
                projects.find_by_id(id)
            })?;

            if let Some(expected) = changes.expected_version {
                if expected != project.version {
                    return Err(ServiceError::Conflict {
                        kind: EntityKind::Project,
                        id: project.id,
                        expected,
                        actual: Some(project.version),
                    });
                }
            }

            if mode == UpdateMode::Partial && changes.is_empty() {
                return Ok(project);
            }

            if let Some(name) = changes.name.as_deref() {
                project.name = guard::normalize_name(EntityKind::Project, name)?;
            }
            if let Some(is_deleted) = changes.is_deleted {
                project.is_deleted = is_deleted;
            }
            if let Some(account_id) = changes.account_id {
                let accounts = SqliteAccountStore::try_new(&tx)?;
                guard::require_existing(EntityKind::Account, account_id, |id| {
                    accounts.find_by_id(id)
                })?;
                project.account_id = account_id;
            }

            if project.is_active() {
                guard::assert_unique_name(EntityKind::Project, &project.name, |name| {
                    projects.exists_by_name(name, Some(project.id))
                })?;
            }

            project.audit.touch(ctx);
            project.version = projects.save(&project)?;
            project
        };
        tx.commit()?;
        Ok(updated)
    }

    fn hard_delete_inner(&mut self, id: IdInput) -> ServiceResult<()> {
        let project_id = decode_for(EntityKind::Project, id)?;
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let report = {
            let projects = SqliteProjectStore::try_new(&tx)?;
            guard::require_existing(EntityKind::Project, project_id, |id| {
                projects.find_by_id(id)
            })?;

            let persons = SqlitePersonStore::try_new(&tx)?;
            let summaries = SqliteWeeklySummaryStore::try_new(&tx)?;
            let report = CascadeResolver::new()
                .register(&persons)
                .register(&summaries)
                .resolve(project_id)?;

            projects.delete(project_id)?;
            report
        };
        tx.commit()?;

        info!(
            "event=project_cascade module=service status=ok project_id={} detached_owners={}",
            project_id,
            report.total_owners()
        );
        Ok(())
    }
}
