//! Error taxonomy shared by lifecycle services.

use crate::model::ident::{EntityKind, IdentifierError};
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Caller-recoverable lifecycle failures.
#[derive(Debug)]
pub enum ServiceError {
    /// Id input was blank or malformed.
    InvalidIdentifier(IdentifierError),
    /// Referenced entity does not exist.
    NotFound { kind: EntityKind, id: i64 },
    /// An active entity with the same name already exists.
    DuplicateName { kind: EntityKind, name: String },
    /// Stored version differs from the version the caller worked from.
    Conflict {
        kind: EntityKind,
        id: i64,
        expected: i64,
        actual: Option<i64>,
    },
    /// Name is blank after trimming.
    InvalidName(EntityKind),
    /// Entity still has dependents and cannot be removed.
    InUse {
        kind: EntityKind,
        id: i64,
        dependents: u64,
    },
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidIdentifier(err) => write!(f, "{err}"),
            Self::NotFound { kind, id } => write!(f, "{kind} not found with id: {id}"),
            Self::DuplicateName { kind, name } => {
                write!(f, "a {kind} named `{name}` already exists")
            }
            Self::Conflict {
                kind,
                id,
                expected,
                actual: Some(actual),
            } => write!(
                f,
                "{kind} {id} was modified concurrently: expected version {expected}, found {actual}"
            ),
            Self::Conflict {
                kind,
                id,
                expected,
                actual: None,
            } => write!(
                f,
                "{kind} {id} was modified concurrently: expected version {expected}"
            ),
            Self::InvalidName(kind) => write!(f, "{kind} name must not be blank"),
            Self::InUse {
                kind,
                id,
                dependents,
            } => write!(f, "{kind} {id} is still referenced by {dependents} record(s)"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidIdentifier(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<IdentifierError> for ServiceError {
    fn from(value: IdentifierError) -> Self {
        Self::InvalidIdentifier(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { kind, id } => Self::NotFound { kind, id },
            RepoError::VersionConflict { kind, id, expected } => Self::Conflict {
                kind,
                id,
                expected,
                actual: None,
            },
            other => Self::Repo(other),
        }
    }
}

impl From<rusqlite::Error> for ServiceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(RepoError::from(value))
    }
}

impl ServiceError {
    /// Stable error code for structured log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidIdentifier(_) => "invalid_identifier",
            Self::NotFound { .. } => "not_found",
            Self::DuplicateName { .. } => "duplicate_name",
            Self::Conflict { .. } => "conflict",
            Self::InvalidName(_) => "invalid_name",
            Self::InUse { .. } => "in_use",
            Self::Repo(_) => "repo_error",
        }
    }
}
