//! Account domain model.

use crate::model::actor::AuditStamp;
use crate::model::ident::{encode, ACCOUNT_PREFIX, DEFAULT_CODE_WIDTH};
use serde::{Deserialize, Serialize};

pub type AccountId = i64;

/// Client organization owning zero or more projects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    /// Unique among active accounts, compared case-insensitively.
    pub name: String,
    pub is_deleted: bool,
    pub audit: AuditStamp,
}

impl Account {
    /// Formatted code, e.g. `ACC004`.
    pub fn code(&self) -> String {
        encode(self.id, ACCOUNT_PREFIX, DEFAULT_CODE_WIDTH)
    }
}

/// Insert payload for a new account row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountDraft {
    pub name: String,
    pub audit: AuditStamp,
}

/// Client-settable account fields; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountPatch {
    pub name: Option<String>,
}
