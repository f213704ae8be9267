//! Pre-mutation integrity checks.
//!
//! # Invariants
//! - Guards never mutate state.
//! - Guards run before the first write of a unit of work.

use crate::model::ident::EntityKind;
use crate::repo::RepoResult;
use crate::service::error::{ServiceError, ServiceResult};

/// Trims `raw` and rejects blank names.
pub fn normalize_name(kind: EntityKind, raw: &str) -> ServiceResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::InvalidName(kind));
    }
    Ok(trimmed.to_string())
}

/// Fails with `DuplicateName` when `name_taken` reports an active holder.
///
/// `name_taken` is expected to compare case-insensitively and ignore
/// soft-deleted records.
pub fn assert_unique_name(
    kind: EntityKind,
    name: &str,
    name_taken: impl FnOnce(&str) -> RepoResult<bool>,
) -> ServiceResult<()> {
    if name_taken(name)? {
        return Err(ServiceError::DuplicateName {
            kind,
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Loads an entity or fails with `NotFound { kind, id }`.
pub fn require_existing<T>(
    kind: EntityKind,
    id: i64,
    lookup: impl FnOnce(i64) -> RepoResult<Option<T>>,
) -> ServiceResult<T> {
    lookup(id)?.ok_or(ServiceError::NotFound { kind, id })
}

#[cfg(test)]
mod tests {
    use super::{assert_unique_name, normalize_name, require_existing};
    use crate::model::ident::EntityKind;
    use crate::repo::{RepoError, RepoResult};
    use crate::service::error::ServiceError;

    #[test]
    fn normalize_name_trims_and_rejects_blank() {
        assert_eq!(
            normalize_name(EntityKind::Project, "  Alpha ").unwrap(),
            "Alpha"
        );
        assert!(matches!(
            normalize_name(EntityKind::Project, "   "),
            Err(ServiceError::InvalidName(EntityKind::Project))
        ));
    }

    #[test]
    fn assert_unique_name_reports_duplicates() {
        let taken = ["alpha"];
        let lookup = |name: &str| -> RepoResult<bool> {
            Ok(taken.contains(&name.to_lowercase().as_str()))
        };

        assert_unique_name(EntityKind::Project, "Beta", lookup).unwrap();
        let err = assert_unique_name(EntityKind::Project, "ALPHA", lookup).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::DuplicateName { kind: EntityKind::Project, ref name } if name == "ALPHA"
        ));
    }

    #[test]
    fn require_existing_maps_missing_to_not_found() {
        let found = require_existing(EntityKind::Account, 1, |id| Ok(Some(id * 10))).unwrap();
        assert_eq!(found, 10);

        let err = require_existing::<i64>(EntityKind::Account, 9999, |_| Ok(None)).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::NotFound {
                kind: EntityKind::Account,
                id: 9999
            }
        ));
    }

    #[test]
    fn lookup_failures_propagate_as_repo_errors() {
        let err = require_existing::<i64>(EntityKind::Project, 1, |_| {
            Err(RepoError::InvalidData("broken".to_string()))
        })
        .unwrap_err();
        assert!(matches!(err, ServiceError::Repo(_)));
    }
}
