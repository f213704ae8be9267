//! Person use-case service.
//!
//! # Invariants
//! - Person ids accept bare numbers and `EMP`/`MAN` codes.
//! - Only existing, active projects can be tagged to a person.

use crate::model::actor::{ActorContext, AuditStamp};
use crate::model::ident::{decode_for, EntityKind, IdInput};
use crate::model::person::{NewPerson, Person, PersonDraft, PersonPatch, Role};
use crate::model::project::ProjectId;
use crate::repo::person_repo::{PersonStore, SqlitePersonStore};
use crate::repo::project_repo::{ProjectStore, SqliteProjectStore};
use crate::service::error::{ServiceError, ServiceResult};
use crate::service::{guard, observe};
use rusqlite::{Connection, TransactionBehavior};
use std::time::Instant;

pub struct PersonService<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> PersonService<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }

    pub fn create(&mut self, ctx: &ActorContext, new: &NewPerson) -> ServiceResult<Person> {
        let started_at = Instant::now();
        let result = self.create_inner(ctx, new);
        observe("person_create", started_at, result)
    }

    pub fn get(&self, id: impl Into<IdInput>) -> ServiceResult<Person> {
        let person_id = decode_for(EntityKind::Person, id)?;
        let persons = SqlitePersonStore::try_new(self.conn)?;
        guard::require_existing(EntityKind::Person, person_id, |id| persons.find_by_id(id))
    }

    pub fn list(&self) -> ServiceResult<Vec<Person>> {
        let persons = SqlitePersonStore::try_new(self.conn)?;
        Ok(persons.find_all()?)
    }

    pub fn search_by_name(&self, fragment: &str) -> ServiceResult<Vec<Person>> {
        let persons = SqlitePersonStore::try_new(self.conn)?;
        Ok(persons.search_by_name(fragment)?)
    }

    pub fn list_by_role(&self, role: Role) -> ServiceResult<Vec<Person>> {
        let persons = SqlitePersonStore::try_new(self.conn)?;
        Ok(persons.find_by_role(role)?)
    }

    /// People tagged to one project.
    ///
    /// # Errors
    /// - `NotFound { Project }` when the project does not exist.
    pub fn list_by_project(&self, project_id: impl Into<IdInput>) -> ServiceResult<Vec<Person>> {
        let project_id = decode_for(EntityKind::Project, project_id)?;
        let projects = SqliteProjectStore::try_new(self.conn)?;
        guard::require_existing(EntityKind::Project, project_id, |id| projects.find_by_id(id))?;

        let persons = SqlitePersonStore::try_new(self.conn)?;
        Ok(persons.find_by_project(project_id)?)
    }

    pub fn update(
        &mut self,
        ctx: &ActorContext,
        id: impl Into<IdInput>,
        patch: &PersonPatch,
    ) -> ServiceResult<Person> {
        let started_at = Instant::now();
        let result = self.mutate(ctx, id.into(), |person, _| {
            if let Some(first_name) = patch.first_name.as_deref() {
                person.first_name = guard::normalize_name(EntityKind::Person, first_name)?;
            }
            if let Some(last_name) = patch.last_name.as_deref() {
                person.last_name = guard::normalize_name(EntityKind::Person, last_name)?;
            }
            if let Some(email) = patch.email.as_deref() {
                person.email = email.trim().to_string();
            }
            if let Some(role) = patch.role {
                person.role = role;
            }
            if let Some(tech_stack) = patch.tech_stack {
                person.tech_stack = tech_stack;
            }
            Ok(())
        });
        observe("person_update", started_at, result)
    }

    /// Adds projects to the person's set; already-tagged projects are kept.
    ///
    /// # Errors
    /// - `NotFound { Project }` when any project is missing or soft-deleted.
    pub fn tag_projects(
        &mut self,
        ctx: &ActorContext,
        id: impl Into<IdInput>,
        project_ids: &[ProjectId],
    ) -> ServiceResult<Person> {
        let started_at = Instant::now();
        let result = self.mutate(ctx, id.into(), |person, conn| {
            let projects = SqliteProjectStore::try_new(conn)?;
            for &project_id in project_ids {
                let project = guard::require_existing(EntityKind::Project, project_id, |id| {
                    projects.find_by_id(id)
                })?;
                if !project.is_active() {
                    return Err(ServiceError::NotFound {
                        kind: EntityKind::Project,
                        id: project_id,
                    });
                }
                person.project_ids.insert(project_id);
            }
            Ok(())
        });
        observe("person_tag_projects", started_at, result)
    }

    /// Removes the person together with its own project links.
    pub fn hard_delete(&mut self, id: impl Into<IdInput>) -> ServiceResult<()> {
        let started_at = Instant::now();
        let result = self.hard_delete_inner(id.into());
        observe("person_hard_delete", started_at, result)
    }

    fn create_inner(&mut self, ctx: &ActorContext, new: &NewPerson) -> ServiceResult<Person> {
        let person = NewPerson {
            first_name: guard::normalize_name(EntityKind::Person, &new.first_name)?,
            last_name: guard::normalize_name(EntityKind::Person, &new.last_name)?,
            email: new.email.trim().to_string(),
            role: new.role,
            tech_stack: new.tech_stack,
        };

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let created = {
            let persons = SqlitePersonStore::try_new(&tx)?;
            let person_id = persons.insert(&PersonDraft {
                person,
                audit: AuditStamp::created(ctx),
            })?;
            guard::require_existing(EntityKind::Person, person_id, |id| persons.find_by_id(id))?
        };
        tx.commit()?;
        Ok(created)
    }

    fn mutate(
        &mut self,
        ctx: &ActorContext,
        id: IdInput,
        apply: impl FnOnce(&mut Person, &Connection) -> ServiceResult<()>,
    ) -> ServiceResult<Person> {
        let person_id = decode_for(EntityKind::Person, id)?;
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let updated = {
            let conn: &Connection = &tx;
            let persons = SqlitePersonStore::try_new(conn)?;
            let mut person = guard::require_existing(EntityKind::Person, person_id, |id| {
                persons.find_by_id(id)
            })?;
            apply(&mut person, conn)?;
            person.audit.touch(ctx);
            persons.save(&person)?;
            person
        };
        tx.commit()?;
        Ok(updated)
    }

    fn hard_delete_inner(&mut self, id: IdInput) -> ServiceResult<()> {
        let person_id = decode_for(EntityKind::Person, id)?;
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        {
            let persons = SqlitePersonStore::try_new(&tx)?;
            guard::require_existing(EntityKind::Person, person_id, |id| persons.find_by_id(id))?;
            persons.delete(person_id)?;
        }
        tx.commit()?;
        Ok(())
    }
}
