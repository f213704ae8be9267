//! Account store contract and SQLite implementation.

use crate::model::account::{Account, AccountDraft, AccountId};
use crate::model::ident::EntityKind;
use crate::repo::{
    bool_to_int, ensure_connection_ready, name_key, parse_audit, parse_flag, RepoError, RepoResult,
};
use rusqlite::{params, Connection, Row};

const ACCOUNT_SELECT_SQL: &str = "SELECT
    id,
    name,
    is_deleted,
    created_at,
    created_by,
    updated_at,
    updated_by
FROM accounts";

/// Store interface for account rows.
pub trait AccountStore {
    fn find_by_id(&self, id: AccountId) -> RepoResult<Option<Account>>;
    fn find_all(&self, include_deleted: bool) -> RepoResult<Vec<Account>>;
    /// Whether an active account other than `excluding` has this name, compared by `name_key`.
    fn exists_by_name(&self, name: &str, excluding: Option<AccountId>) -> RepoResult<bool>;
    fn insert(&self, draft: &AccountDraft) -> RepoResult<AccountId>;
    fn save(&self, account: &Account) -> RepoResult<()>;
    fn delete(&self, id: AccountId) -> RepoResult<()>;
    /// Number of projects (active or soft-deleted) owned by the account.
    fn count_projects(&self, id: AccountId) -> RepoResult<u64>;
}

pub struct SqliteAccountStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAccountStore<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["accounts", "projects"])?;
        Ok(Self { conn })
    }
}

impl AccountStore for SqliteAccountStore<'_> {
    fn find_by_id(&self, id: AccountId) -> RepoResult<Option<Account>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ACCOUNT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_account_row(row)?));
        }
        Ok(None)
    }

    fn find_all(&self, include_deleted: bool) -> RepoResult<Vec<Account>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ACCOUNT_SELECT_SQL}
             WHERE (?1 = 1 OR is_deleted = 0)
             ORDER BY id ASC;"
        ))?;
        let mut rows = stmt.query([bool_to_int(include_deleted)])?;
        let mut accounts = Vec::new();
        while let Some(row) = rows.next()? {
            accounts.push(parse_account_row(row)?);
        }
        Ok(accounts)
    }

    fn exists_by_name(&self, name: &str, excluding: Option<AccountId>) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM accounts
                WHERE name_key = ?1
                  AND is_deleted = 0
                  AND (?2 IS NULL OR id != ?2)
            );",
            params![name_key(name), excluding],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn insert(&self, draft: &AccountDraft) -> RepoResult<AccountId> {
        self.conn.execute(
            "INSERT INTO accounts (
                name,
                name_key,
                is_deleted,
                created_at,
                created_by,
                updated_at,
                updated_by
            ) VALUES (?1, ?2, 0, ?3, ?4, ?5, ?6);",
            params![
                draft.name.as_str(),
                name_key(&draft.name),
                draft.audit.created_at,
                draft.audit.created_by.as_str(),
                draft.audit.updated_at,
                draft.audit.updated_by.as_deref(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn save(&self, account: &Account) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE accounts
             SET
                name = ?2,
                name_key = ?3,
                is_deleted = ?4,
                updated_at = ?5,
                updated_by = ?6
             WHERE id = ?1;",
            params![
                account.id,
                account.name.as_str(),
                name_key(&account.name),
                bool_to_int(account.is_deleted),
                account.audit.updated_at,
                account.audit.updated_by.as_deref(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: EntityKind::Account,
                id: account.id,
            });
        }
        Ok(())
    }

    fn delete(&self, id: AccountId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM accounts WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                kind: EntityKind::Account,
                id,
            });
        }
        Ok(())
    }

    fn count_projects(&self, id: AccountId) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM projects WHERE account_id = ?1;",
            [id],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }
}

fn parse_account_row(row: &Row<'_>) -> RepoResult<Account> {
    Ok(Account {
        id: row.get("id")?,
        name: row.get("name")?,
        is_deleted: parse_flag(row, "is_deleted")?,
        audit: parse_audit(row)?,
    })
}
