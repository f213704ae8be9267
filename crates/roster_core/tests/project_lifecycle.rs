use roster_core::repo::project_repo::{ProjectStore, SqliteProjectStore};
use roster_core::{
    open_db_in_memory, AccountService, Actor, ActorContext, EntityKind, IdentifierError,
    NewPerson, NewProject, PersonService, ProjectChanges, ProjectListQuery, ProjectService,
    RepoError, Role, ServiceError, TechStack,
};
use rusqlite::Connection;

fn setup() -> (Connection, i64) {
    let mut conn = open_db_in_memory().expect("open in-memory db");
    let account = AccountService::new(&mut conn)
        .create(&ActorContext::system(), "Initech")
        .expect("create owning account");
    (conn, account.id)
}

fn alice() -> ActorContext {
    ActorContext::authenticated(Actor::new("Alice", "Smith"))
}

fn new_project(name: &str, account_id: i64) -> NewProject {
    NewProject {
        name: name.to_string(),
        account_id,
    }
}

#[test]
fn create_stamps_audit_and_starts_at_version_one() {
    let (mut conn, account_id) = setup();
    let mut service = ProjectService::new(&mut conn);

    let project = service
        .create(&alice(), &new_project("  Alpha  ", account_id))
        .unwrap();

    assert_eq!(project.name, "Alpha");
    assert_eq!(project.code(), "PJT001");
    assert_eq!(project.account_id, account_id);
    assert!(!project.is_deleted);
    assert_eq!(project.version, 1);
    assert_eq!(project.audit.created_by, "Alice Smith");
    assert!(project.audit.created_at > 0);
    assert_eq!(project.audit.updated_at, None);
    assert_eq!(project.audit.updated_by, None);
}

#[test]
fn create_without_actor_stamps_system() {
    let (mut conn, account_id) = setup();
    let project = ProjectService::new(&mut conn)
        .create(&ActorContext::default(), &new_project("Alpha", account_id))
        .unwrap();

    assert_eq!(project.audit.created_by, "System");
}

#[test]
fn duplicate_name_is_rejected_case_insensitively() {
    let (mut conn, account_id) = setup();
    let mut service = ProjectService::new(&mut conn);
    service
        .create(&alice(), &new_project("Alpha", account_id))
        .unwrap();

    let err = service
        .create(&alice(), &new_project("ALPHA", account_id))
        .unwrap_err();

    match err {
        ServiceError::DuplicateName { kind, name } => {
            assert_eq!(kind, EntityKind::Project);
            assert_eq!(name, "ALPHA");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn duplicate_name_check_folds_non_ascii_case() {
    let (mut conn, account_id) = setup();
    let mut service = ProjectService::new(&mut conn);
    let eclair = service
        .create(&alice(), &new_project("Éclair", account_id))
        .unwrap();

    let err = service
        .create(&alice(), &new_project("éCLAIR", account_id))
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::DuplicateName {
            kind: EntityKind::Project,
            ..
        }
    ));

    let other = service
        .create(&alice(), &new_project("Straße", account_id))
        .unwrap();
    let err = service
        .partial_update(
            &alice(),
            other.id,
            &ProjectChanges {
                name: Some("ÉCLAIR".to_string()),
                ..ProjectChanges::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, ServiceError::DuplicateName { .. }));

    let hits = service.search_by_name("ÉCLAIR").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, eclair.id);
}

#[test]
fn name_is_reusable_after_hard_delete() {
    let (mut conn, account_id) = setup();
    let mut service = ProjectService::new(&mut conn);
    let first = service
        .create(&alice(), &new_project("Alpha", account_id))
        .unwrap();

    service.hard_delete(first.id).unwrap();
    let second = service
        .create(&alice(), &new_project("alpha", account_id))
        .unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(second.name, "alpha");
}

#[test]
fn name_is_reusable_after_soft_delete() {
    let (mut conn, account_id) = setup();
    let mut service = ProjectService::new(&mut conn);
    let first = service
        .create(&alice(), &new_project("Alpha", account_id))
        .unwrap();

    service.soft_delete(&alice(), first.id).unwrap();
    service
        .create(&alice(), &new_project("Alpha", account_id))
        .unwrap();

    // Restoring the flagged project would now collide with the active one.
    let restore = ProjectChanges {
        is_deleted: Some(false),
        ..ProjectChanges::default()
    };
    let err = service
        .partial_update(&alice(), first.id, &restore)
        .unwrap_err();
    assert!(matches!(err, ServiceError::DuplicateName { .. }));
}

#[test]
fn create_with_missing_account_fails_not_found() {
    let (mut conn, _) = setup();
    let err = ProjectService::new(&mut conn)
        .create(&alice(), &new_project("Gamma", 9999))
        .unwrap_err();

    match err {
        ServiceError::NotFound { kind, id } => {
            assert_eq!(kind, EntityKind::Account);
            assert_eq!(id, 9999);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn create_with_blank_name_is_rejected() {
    let (mut conn, account_id) = setup();
    let err = ProjectService::new(&mut conn)
        .create(&alice(), &new_project("   ", account_id))
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidName(EntityKind::Project)));
}

#[test]
fn get_accepts_code_and_number_interchangeably() {
    let (mut conn, account_id) = setup();
    let mut service = ProjectService::new(&mut conn);
    let created = service
        .create(&alice(), &new_project("Alpha", account_id))
        .unwrap();

    assert_eq!(service.get(created.id).unwrap(), created);
    assert_eq!(service.get("PJT001").unwrap(), created);
    assert_eq!(service.get(" 1 ").unwrap(), created);
}

#[test]
fn get_rejects_malformed_identifiers() {
    let (mut conn, _) = setup();
    let service = ProjectService::new(&mut conn);

    assert!(matches!(
        service.get("").unwrap_err(),
        ServiceError::InvalidIdentifier(IdentifierError::EmptyIdentifier)
    ));
    assert!(matches!(
        service.get("XYZ9").unwrap_err(),
        ServiceError::InvalidIdentifier(IdentifierError::InvalidIdentifierFormat(_))
    ));
    assert!(matches!(
        service.get("ACC001").unwrap_err(),
        ServiceError::InvalidIdentifier(IdentifierError::InvalidIdentifierFormat(_))
    ));
    assert!(matches!(
        service.get("PJT042").unwrap_err(),
        ServiceError::NotFound {
            kind: EntityKind::Project,
            id: 42
        }
    ));
}

#[test]
fn soft_delete_keeps_row_and_relationships() {
    let (mut conn, account_id) = setup();
    let project = ProjectService::new(&mut conn)
        .create(&alice(), &new_project("Alpha", account_id))
        .unwrap();
    let person = {
        let mut people = PersonService::new(&mut conn);
        let person = people
            .create(
                &alice(),
                &NewPerson {
                    first_name: "Bob".to_string(),
                    last_name: "Jones".to_string(),
                    email: "bob@example.com".to_string(),
                    role: Role::Employee,
                    tech_stack: TechStack::Java,
                },
            )
            .unwrap();
        people.tag_projects(&alice(), person.id, &[project.id]).unwrap()
    };

    let mut service = ProjectService::new(&mut conn);
    let flagged = service.soft_delete(&alice(), "PJT001").unwrap();
    assert!(flagged.is_deleted);
    assert_eq!(flagged.audit.updated_by.as_deref(), Some("Alice Smith"));

    let reloaded = service.get(project.id).unwrap();
    assert!(reloaded.is_deleted);
    assert_eq!(reloaded.name, project.name);
    assert_eq!(reloaded.account_id, project.account_id);

    let active = service.list(&ProjectListQuery::default()).unwrap();
    assert!(active.is_empty());
    let all = service
        .list(&ProjectListQuery {
            include_deleted: true,
            ..ProjectListQuery::default()
        })
        .unwrap();
    assert_eq!(all.len(), 1);

    let person = PersonService::new(&mut conn).get(person.id).unwrap();
    assert!(person.project_ids.contains(&project.id));
}

#[test]
fn partial_update_changes_only_supplied_fields() {
    let (mut conn, account_id) = setup();
    let mut service = ProjectService::new(&mut conn);
    let created = service
        .create(&ActorContext::system(), &new_project("Alpha", account_id))
        .unwrap();

    let changes = ProjectChanges {
        name: Some("Beta".to_string()),
        ..ProjectChanges::default()
    };
    let updated = service
        .partial_update(&alice(), created.code(), &changes)
        .unwrap();

    assert_eq!(updated.name, "Beta");
    assert_eq!(updated.account_id, created.account_id);
    assert_eq!(updated.is_deleted, created.is_deleted);
    assert_eq!(updated.audit.created_at, created.audit.created_at);
    assert_eq!(updated.audit.created_by, "System");
    assert_eq!(updated.audit.updated_by.as_deref(), Some("Alice Smith"));
    assert!(updated.audit.updated_at.is_some());
    assert_eq!(updated.version, created.version + 1);
    assert_eq!(service.get(created.id).unwrap(), updated);
}

#[test]
fn partial_update_with_no_fields_is_a_no_op() {
    let (mut conn, account_id) = setup();
    let mut service = ProjectService::new(&mut conn);
    let created = service
        .create(&alice(), &new_project("Alpha", account_id))
        .unwrap();

    let unchanged = service
        .partial_update(&alice(), created.id, &ProjectChanges::default())
        .unwrap();

    assert_eq!(unchanged, created);
    assert_eq!(service.get(created.id).unwrap().version, 1);
}

#[test]
fn full_update_always_restamps_and_keeps_unsupplied_account() {
    let (mut conn, account_id) = setup();
    let mut service = ProjectService::new(&mut conn);
    let created = service
        .create(&ActorContext::system(), &new_project("Alpha", account_id))
        .unwrap();

    let renamed = service
        .update(
            &alice(),
            created.id,
            &ProjectChanges {
                name: Some("Beta".to_string()),
                ..ProjectChanges::default()
            },
        )
        .unwrap();
    assert_eq!(renamed.name, "Beta");
    assert_eq!(renamed.account_id, account_id);
    assert_eq!(renamed.audit.updated_by.as_deref(), Some("Alice Smith"));
    assert_eq!(renamed.version, 2);

    let restamped = service
        .update(&ActorContext::system(), created.id, &ProjectChanges::default())
        .unwrap();
    assert_eq!(restamped.name, "Beta");
    assert_eq!(restamped.audit.updated_by.as_deref(), Some("System"));
    assert_eq!(restamped.version, 3);
}

#[test]
fn update_reassigns_account_only_when_it_exists() {
    let (mut conn, account_id) = setup();
    let other_account = AccountService::new(&mut conn)
        .create(&alice(), "Globex")
        .unwrap();
    let mut service = ProjectService::new(&mut conn);
    let created = service
        .create(&alice(), &new_project("Alpha", account_id))
        .unwrap();

    let err = service
        .update(
            &alice(),
            created.id,
            &ProjectChanges {
                account_id: Some(9999),
                ..ProjectChanges::default()
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::NotFound {
            kind: EntityKind::Account,
            id: 9999
        }
    ));
    assert_eq!(service.get(created.id).unwrap().account_id, account_id);

    let moved = service
        .update(
            &alice(),
            created.id,
            &ProjectChanges {
                account_id: Some(other_account.id),
                ..ProjectChanges::default()
            },
        )
        .unwrap();
    assert_eq!(moved.account_id, other_account.id);
}

#[test]
fn update_to_a_name_taken_by_another_active_project_fails() {
    let (mut conn, account_id) = setup();
    let mut service = ProjectService::new(&mut conn);
    service
        .create(&alice(), &new_project("Alpha", account_id))
        .unwrap();
    let beta = service
        .create(&alice(), &new_project("Beta", account_id))
        .unwrap();

    let err = service
        .partial_update(
            &alice(),
            beta.id,
            &ProjectChanges {
                name: Some("alpha".to_string()),
                ..ProjectChanges::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, ServiceError::DuplicateName { .. }));

    // Keeping its own name under different case is not a collision.
    let recased = service
        .partial_update(
            &alice(),
            beta.id,
            &ProjectChanges {
                name: Some("BETA".to_string()),
                ..ProjectChanges::default()
            },
        )
        .unwrap();
    assert_eq!(recased.name, "BETA");
}

#[test]
fn stale_expected_version_fails_with_conflict() {
    let (mut conn, account_id) = setup();
    let mut service = ProjectService::new(&mut conn);
    let created = service
        .create(&alice(), &new_project("Alpha", account_id))
        .unwrap();
    service
        .partial_update(
            &alice(),
            created.id,
            &ProjectChanges {
                name: Some("Beta".to_string()),
                expected_version: Some(1),
                ..ProjectChanges::default()
            },
        )
        .unwrap();

    let err = service
        .update(
            &alice(),
            created.id,
            &ProjectChanges {
                name: Some("Gamma".to_string()),
                expected_version: Some(1),
                ..ProjectChanges::default()
            },
        )
        .unwrap_err();

    match err {
        ServiceError::Conflict {
            kind,
            id,
            expected,
            actual,
        } => {
            assert_eq!(kind, EntityKind::Project);
            assert_eq!(id, created.id);
            assert_eq!(expected, 1);
            assert_eq!(actual, Some(2));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(service.get(created.id).unwrap().name, "Beta");
}

#[test]
fn store_save_rejects_a_stale_copy() {
    let (mut conn, account_id) = setup();
    let created = ProjectService::new(&mut conn)
        .create(&alice(), &new_project("Alpha", account_id))
        .unwrap();
    ProjectService::new(&mut conn)
        .update(&alice(), created.id, &ProjectChanges::default())
        .unwrap();

    let store = SqliteProjectStore::try_new(&conn).unwrap();
    let mut stale = created.clone();
    stale.name = "Lost update".to_string();
    let err = store.save(&stale).unwrap_err();

    assert!(matches!(
        err,
        RepoError::VersionConflict {
            kind: EntityKind::Project,
            expected: 1,
            ..
        }
    ));
    assert_eq!(store.find_by_id(created.id).unwrap().unwrap().name, "Alpha");
}

#[test]
fn search_by_name_matches_exact_name_ignoring_case() {
    let (mut conn, account_id) = setup();
    let mut service = ProjectService::new(&mut conn);
    let alpha = service
        .create(&alice(), &new_project("Alpha", account_id))
        .unwrap();
    service
        .create(&alice(), &new_project("Alphabet", account_id))
        .unwrap();

    let hits = service.search_by_name("ALPHA").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, alpha.id);
}

#[test]
fn search_by_name_includes_soft_deleted_projects() {
    let (mut conn, account_id) = setup();
    let mut service = ProjectService::new(&mut conn);
    let alpha = service
        .create(&alice(), &new_project("Alpha", account_id))
        .unwrap();
    service.soft_delete(&alice(), alpha.id).unwrap();
    let reborn = service
        .create(&alice(), &new_project("ALPHA", account_id))
        .unwrap();

    let hits = service.search_by_name("alpha").unwrap();
    let flags: Vec<(i64, bool)> = hits.iter().map(|p| (p.id, p.is_deleted)).collect();
    assert_eq!(flags, vec![(alpha.id, true), (reborn.id, false)]);

    let active = service
        .list(&ProjectListQuery {
            name: Some("alpha".to_string()),
            include_deleted: false,
        })
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, reborn.id);
}

#[test]
fn project_serializes_with_audit_and_version() {
    let (mut conn, account_id) = setup();
    let project = ProjectService::new(&mut conn)
        .create(&alice(), &new_project("Alpha", account_id))
        .unwrap();

    let value = serde_json::to_value(&project).unwrap();
    assert_eq!(value["name"], "Alpha");
    assert_eq!(value["version"], 1);
    assert_eq!(value["audit"]["created_by"], "Alice Smith");
    assert!(value["audit"]["updated_at"].is_null());
}
