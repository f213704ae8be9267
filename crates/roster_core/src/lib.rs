//! Core domain logic for the project roster.
//! Owns project lifecycle rules and cross-entity referential integrity.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::{open_db, open_db_in_memory, DbError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::account::{Account, AccountId, AccountPatch};
pub use model::actor::{Actor, ActorContext, AuditStamp, SYSTEM_ACTOR};
pub use model::ident::{decode, decode_for, encode, EntityKind, IdInput, IdentifierError};
pub use model::person::{NewPerson, Person, PersonId, PersonPatch, Role, TechStack};
pub use model::project::{NewProject, Project, ProjectChanges, ProjectId, ProjectListQuery};
pub use model::weekly_summary::{NewWeeklySummary, WeeklySummary, WeeklySummaryId};
pub use repo::{RepoError, RepoResult};
pub use service::account_service::AccountService;
pub use service::cascade::{CascadeReport, CascadeResolver, ProjectCascade};
pub use service::error::{ServiceError, ServiceResult};
pub use service::person_service::PersonService;
pub use service::project_service::ProjectService;
pub use service::summary_service::WeeklySummaryService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
