//! Person store contract and SQLite implementation.
//!
//! # Invariants
//! - A loaded person always carries its full project set.
//! - `save` rewrites the person row and replaces the whole project set.

use crate::model::ident::EntityKind;
use crate::model::person::{Person, PersonDraft, PersonId, Role, TechStack};
use crate::model::project::ProjectId;
use crate::repo::{
    ensure_connection_ready, name_key, parse_audit, ProjectLinkTable, ProjectLinked,
    ProjectReferenceStore, RepoError, RepoResult,
};
use rusqlite::{params, Connection, Row};

const PERSON_SELECT_SQL: &str = "SELECT
    id,
    first_name,
    last_name,
    email,
    role,
    tech_stack,
    created_at,
    created_by,
    updated_at,
    updated_by
FROM persons";

const PERSON_PROJECTS: ProjectLinkTable = ProjectLinkTable {
    table: "person_projects",
    owner_column: "person_id",
};

/// Store interface for person rows and their project links.
pub trait PersonStore {
    fn find_by_id(&self, id: PersonId) -> RepoResult<Option<Person>>;
    fn find_all(&self) -> RepoResult<Vec<Person>>;
    fn find_by_role(&self, role: Role) -> RepoResult<Vec<Person>>;
    /// People whose project set contains `project_id`, ascending by id.
    fn find_by_project(&self, project_id: ProjectId) -> RepoResult<Vec<Person>>;
    /// Case-insensitive substring match over first or last name.
    fn search_by_name(&self, fragment: &str) -> RepoResult<Vec<Person>>;
    fn insert(&self, draft: &PersonDraft) -> RepoResult<PersonId>;
    fn save(&self, person: &Person) -> RepoResult<()>;
    fn delete(&self, id: PersonId) -> RepoResult<()>;
}

pub struct SqlitePersonStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePersonStore<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["persons", "person_projects"])?;
        Ok(Self { conn })
    }

    fn query_people(&self, sql: &str, params: impl rusqlite::Params) -> RepoResult<Vec<Person>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut people = Vec::new();
        while let Some(row) = rows.next()? {
            people.push(self.parse_person_row(row)?);
        }
        Ok(people)
    }

    fn parse_person_row(&self, row: &Row<'_>) -> RepoResult<Person> {
        let id: PersonId = row.get("id")?;
        let role_text: String = row.get("role")?;
        let role = role_text.parse::<Role>().map_err(|_| {
            RepoError::InvalidData(format!("invalid role `{role_text}` in persons.role"))
        })?;
        let stack_text: String = row.get("tech_stack")?;
        let tech_stack = stack_text.parse::<TechStack>().map_err(|_| {
            RepoError::InvalidData(format!(
                "invalid tech stack `{stack_text}` in persons.tech_stack"
            ))
        })?;

        Ok(Person {
            id,
            first_name: row.get("first_name")?,
            last_name: row.get("last_name")?,
            email: row.get("email")?,
            role,
            tech_stack,
            project_ids: PERSON_PROJECTS.load(self.conn, id)?,
            audit: parse_audit(row)?,
        })
    }
}

impl PersonStore for SqlitePersonStore<'_> {
    fn find_by_id(&self, id: PersonId) -> RepoResult<Option<Person>> {
        let mut people =
            self.query_people(&format!("{PERSON_SELECT_SQL} WHERE id = ?1;"), [id])?;
        Ok(people.pop())
    }

    fn find_all(&self) -> RepoResult<Vec<Person>> {
        self.query_people(&format!("{PERSON_SELECT_SQL} ORDER BY id ASC;"), [])
    }

    fn find_by_role(&self, role: Role) -> RepoResult<Vec<Person>> {
        self.query_people(
            &format!("{PERSON_SELECT_SQL} WHERE role = ?1 ORDER BY id ASC;"),
            [role.as_str()],
        )
    }

    fn find_by_project(&self, project_id: ProjectId) -> RepoResult<Vec<Person>> {
        self.query_people(
            &format!(
                "{PERSON_SELECT_SQL}
                 WHERE id IN (
                    SELECT person_id FROM person_projects WHERE project_id = ?1
                 )
                 ORDER BY id ASC;"
            ),
            [project_id],
        )
    }

    fn search_by_name(&self, fragment: &str) -> RepoResult<Vec<Person>> {
        self.query_people(
            &format!(
                "{PERSON_SELECT_SQL}
                 WHERE instr(first_name_key, ?1) > 0
                    OR instr(last_name_key, ?1) > 0
                 ORDER BY id ASC;"
            ),
            [name_key(fragment)],
        )
    }

    fn insert(&self, draft: &PersonDraft) -> RepoResult<PersonId> {
        let person = &draft.person;
        self.conn.execute(
            "INSERT INTO persons (
                first_name,
                last_name,
                first_name_key,
                last_name_key,
                email,
                role,
                tech_stack,
                created_at,
                created_by,
                updated_at,
                updated_by
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11);",
            params![
                person.first_name.as_str(),
                person.last_name.as_str(),
                name_key(&person.first_name),
                name_key(&person.last_name),
                person.email.as_str(),
                person.role.as_str(),
                person.tech_stack.as_str(),
                draft.audit.created_at,
                draft.audit.created_by.as_str(),
                draft.audit.updated_at,
                draft.audit.updated_by.as_deref(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn save(&self, person: &Person) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE persons
             SET
                first_name = ?2,
                last_name = ?3,
                first_name_key = ?4,
                last_name_key = ?5,
                email = ?6,
                role = ?7,
                tech_stack = ?8,
                updated_at = ?9,
                updated_by = ?10
             WHERE id = ?1;",
            params![
                person.id,
                person.first_name.as_str(),
                person.last_name.as_str(),
                name_key(&person.first_name),
                name_key(&person.last_name),
                person.email.as_str(),
                person.role.as_str(),
                person.tech_stack.as_str(),
                person.audit.updated_at,
                person.audit.updated_by.as_deref(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: EntityKind::Person,
                id: person.id,
            });
        }
        PERSON_PROJECTS.replace(self.conn, person.id, &person.project_ids)
    }

    fn delete(&self, id: PersonId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM persons WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: EntityKind::Person,
                id,
            });
        }
        Ok(())
    }
}

impl ProjectLinked for Person {
    fn references_project(&self, project_id: ProjectId) -> bool {
        self.project_ids.contains(&project_id)
    }

    fn unlink_project(&mut self, project_id: ProjectId) -> bool {
        self.project_ids.remove(&project_id)
    }
}

impl ProjectReferenceStore for SqlitePersonStore<'_> {
    type Owner = Person;

    fn relation(&self) -> &'static str {
        "person.projects"
    }

    fn find_owners_referencing(&self, project_id: ProjectId) -> RepoResult<Vec<Person>> {
        self.find_by_project(project_id)
    }

    fn save_all(&self, owners: &[Person]) -> RepoResult<()> {
        for person in owners {
            self.save(person)?;
        }
        Ok(())
    }
}
