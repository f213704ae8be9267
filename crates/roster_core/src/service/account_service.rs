//! Account lifecycle service.
//!
//! # Invariants
//! - Active account names are unique, compared case-insensitively.
//! - An account that still owns projects cannot be hard-deleted.

use crate::model::account::{Account, AccountDraft, AccountPatch};
use crate::model::actor::{ActorContext, AuditStamp};
use crate::model::ident::{decode_for, EntityKind, IdInput};
use crate::repo::account_repo::{AccountStore, SqliteAccountStore};
use crate::service::error::{ServiceError, ServiceResult};
use crate::service::{guard, observe};
use rusqlite::{Connection, TransactionBehavior};
use std::time::Instant;

pub struct AccountService<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> AccountService<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }

    pub fn create(&mut self, ctx: &ActorContext, name: &str) -> ServiceResult<Account> {
        let started_at = Instant::now();
        let result = self.create_inner(ctx, name);
        observe("account_create", started_at, result)
    }

    pub fn get(&self, id: impl Into<IdInput>) -> ServiceResult<Account> {
        let account_id = decode_for(EntityKind::Account, id)?;
        let accounts = SqliteAccountStore::try_new(self.conn)?;
        guard::require_existing(EntityKind::Account, account_id, |id| accounts.find_by_id(id))
    }

    pub fn list(&self, include_deleted: bool) -> ServiceResult<Vec<Account>> {
        let accounts = SqliteAccountStore::try_new(self.conn)?;
        Ok(accounts.find_all(include_deleted)?)
    }

    /// Merges supplied fields and stamps the update.
    pub fn update(
        &mut self,
        ctx: &ActorContext,
        id: impl Into<IdInput>,
        patch: &AccountPatch,
    ) -> ServiceResult<Account> {
        let started_at = Instant::now();
        let result = self.mutate(ctx, id.into(), |account| {
            if let Some(name) = patch.name.as_deref() {
                account.name = guard::normalize_name(EntityKind::Account, name)?;
            }
            Ok(())
        });
        observe("account_update", started_at, result)
    }

    pub fn soft_delete(
        &mut self,
        ctx: &ActorContext,
        id: impl Into<IdInput>,
    ) -> ServiceResult<Account> {
        let started_at = Instant::now();
        let result = self.mutate(ctx, id.into(), |account| {
            account.is_deleted = true;
            Ok(())
        });
        observe("account_soft_delete", started_at, result)
    }

    /// Removes the account row.
    ///
    /// # Errors
    /// - `InUse` while any project (active or soft-deleted) references it.
    pub fn hard_delete(&mut self, id: impl Into<IdInput>) -> ServiceResult<()> {
        let started_at = Instant::now();
        let result = self.hard_delete_inner(id.into());
        observe("account_hard_delete", started_at, result)
    }

    fn create_inner(&mut self, ctx: &ActorContext, name: &str) -> ServiceResult<Account> {
        let name = guard::normalize_name(EntityKind::Account, name)?;
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let created = {
            let accounts = SqliteAccountStore::try_new(&tx)?;
            guard::assert_unique_name(EntityKind::Account, &name, |name| {
                accounts.exists_by_name(name, None)
            })?;
            let account_id = accounts.insert(&AccountDraft {
                name,
                audit: AuditStamp::created(ctx),
            })?;
            guard::require_existing(EntityKind::Account, account_id, |id| {
                accounts.find_by_id(id)
            })?
        };
        tx.commit()?;
        Ok(created)
    }

    fn mutate(
        &mut self,
        ctx: &ActorContext,
        id: IdInput,
        apply: impl FnOnce(&mut Account) -> ServiceResult<()>,
    ) -> ServiceResult<Account> {
        let account_id = decode_for(EntityKind::Account, id)?;
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let updated = {
            let accounts = SqliteAccountStore::try_new(&tx)?;
            let mut account = guard::require_existing(EntityKind::Account, account_id, |id| {
                accounts.find_by_id(id)
            })?;
            apply(&mut account)?;
            if !account.is_deleted {
                guard::assert_unique_name(EntityKind::Account, &account.name, |name| {
                    accounts.exists_by_name(name, Some(account.id))
                })?;
            }
            account.audit.touch(ctx);
            accounts.save(&account)?;
            account
        };
        tx.commit()?;
        Ok(updated)
    }

    fn hard_delete_inner(&mut self, id: IdInput) -> ServiceResult<()> {
        let account_id = decode_for(EntityKind::Account, id)?;
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        {
            let accounts = SqliteAccountStore::try_new(&tx)?;
            guard::require_existing(EntityKind::Account, account_id, |id| {
                accounts.find_by_id(id)
            })?;
            let dependents = accounts.count_projects(account_id)?;
            if dependents > 0 {
                return Err(ServiceError::InUse {
                    kind: EntityKind::Account,
                    id: account_id,
                    dependents,
                });
            }
            accounts.delete(account_id)?;
        }
        tx.commit()?;
        Ok(())
    }
}
