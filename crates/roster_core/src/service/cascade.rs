//! Cascade resolution of inbound project references.
//!
//! # Responsibility
//! - Detach a project from every registered owner collection before the
//!   project row is physically removed.
//!
//! # Invariants
//! - Each relation runs the same protocol: find owners referencing the
//!   target, drop the reference, batch-save the owners.
//! - Relations touch disjoint owner sets, so processing order between them
//!   carries no meaning.
//! - The resolver writes through the caller's connection. Atomicity with the
//!   final delete comes from the caller's transaction, never from here.

use crate::model::project::ProjectId;
use crate::repo::{ProjectLinked, ProjectReferenceStore, RepoResult};
use log::debug;

/// Object-safe view of one relation that may reference projects.
pub trait ProjectCascade {
    fn label(&self) -> &'static str;
    /// Removes `project_id` from every owner in this relation.
    ///
    /// Returns the number of owners rewritten.
    fn detach_project(&self, project_id: ProjectId) -> RepoResult<usize>;
}

impl<S: ProjectReferenceStore> ProjectCascade for S {
    fn label(&self) -> &'static str {
        self.relation()
    }

    fn detach_project(&self, project_id: ProjectId) -> RepoResult<usize> {
        let mut owners = self.find_owners_referencing(project_id)?;
        owners.retain(|owner| owner.references_project(project_id));
        if owners.is_empty() {
            return Ok(0);
        }

        for owner in owners.iter_mut() {
            owner.unlink_project(project_id);
        }
        self.save_all(&owners)?;
        Ok(owners.len())
    }
}

/// Owners rewritten for one relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetachedRelation {
    pub relation: &'static str,
    pub owners: usize,
}

/// Outcome of one cascade run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeReport {
    pub detached: Vec<DetachedRelation>,
}

impl CascadeReport {
    pub fn total_owners(&self) -> usize {
        self.detached.iter().map(|relation| relation.owners).sum()
    }
}

/// Registry of relations to detach before a project hard delete.
#[derive(Default)]
pub struct CascadeResolver<'a> {
    relations: Vec<&'a dyn ProjectCascade>,
}

impl<'a> CascadeResolver<'a> {
    pub fn new() -> Self {
        Self {
            relations: Vec::new(),
        }
    }

    /// Adds one relation. New partner collections must be registered here.
    pub fn register(mut self, relation: &'a dyn ProjectCascade) -> Self {
        self.relations.push(relation);
        self
    }

    pub fn relation_labels(&self) -> Vec<&'static str> {
        self.relations.iter().map(|relation| relation.label()).collect()
    }

    /// Detaches `project_id` from every registered relation.
    ///
    /// Stops at the first failure; the caller must roll back its transaction.
    pub fn resolve(&self, project_id: ProjectId) -> RepoResult<CascadeReport> {
        let mut report = CascadeReport::default();
        for relation in &self.relations {
            let owners = relation.detach_project(project_id)?;
            debug!(
                "event=cascade_detach module=service relation={} project_id={} owners={}",
                relation.label(),
                project_id,
                owners
            );
            report.detached.push(DetachedRelation {
                relation: relation.label(),
                owners,
            });
        }
        Ok(report)
    }
}
