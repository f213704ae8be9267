//! Person domain model.
//!
//! # Invariants
//! - `project_ids` is a set; a project appears at most once per person.
//! - The formatted code prefix follows the role (`MAN` for managers,
//!   `EMP` otherwise).

use crate::model::actor::AuditStamp;
use crate::model::ident::{encode, DEFAULT_CODE_WIDTH, EMPLOYEE_PREFIX, MANAGER_PREFIX};
use crate::model::project::ProjectId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

pub type PersonId = i64;

/// Organizational role of a person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Employee,
    Manager,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Employee => "employee",
            Self::Manager => "manager",
        }
    }

    /// Prefix used when formatting person codes for this role.
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Employee => EMPLOYEE_PREFIX,
            Self::Manager => MANAGER_PREFIX,
        }
    }
}

/// Primary technology a person works in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TechStack {
    Java,
    DotNet,
    Python,
    Frontend,
    Mobile,
    Qa,
    DevOps,
}

impl TechStack {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Java => "java",
            Self::DotNet => "dot_net",
            Self::Python => "python",
            Self::Frontend => "frontend",
            Self::Mobile => "mobile",
            Self::Qa => "qa",
            Self::DevOps => "dev_ops",
        }
    }
}

/// Unknown enum literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl Display for UnknownVariant {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown {}: `{}`", self.kind, self.value)
    }
}

impl Error for UnknownVariant {}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "employee" => Ok(Self::Employee),
            "manager" => Ok(Self::Manager),
            other => Err(UnknownVariant {
                kind: "role",
                value: other.to_string(),
            }),
        }
    }
}

impl FromStr for TechStack {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "java" => Ok(Self::Java),
            "dot_net" | "dotnet" => Ok(Self::DotNet),
            "python" => Ok(Self::Python),
            "frontend" => Ok(Self::Frontend),
            "mobile" => Ok(Self::Mobile),
            "qa" => Ok(Self::Qa),
            "dev_ops" | "devops" => Ok(Self::DevOps),
            other => Err(UnknownVariant {
                kind: "tech stack",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    pub tech_stack: TechStack,
    /// Projects this person is tagged to.
    pub project_ids: BTreeSet<ProjectId>,
    pub audit: AuditStamp,
}

impl Person {
    /// Formatted code, e.g. `EMP008` or `MAN002`.
    pub fn code(&self) -> String {
        encode(self.id, self.role.code_prefix(), DEFAULT_CODE_WIDTH)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Creation payload for a person.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPerson {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    pub tech_stack: TechStack,
}

/// Insert payload for a new person row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonDraft {
    pub person: NewPerson,
    pub audit: AuditStamp,
}

/// Client-settable person fields; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub tech_stack: Option<TechStack>,
}
