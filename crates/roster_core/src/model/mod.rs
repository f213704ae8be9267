//! Domain model for accounts, projects, people and weekly summaries.
//!
//! # Responsibility
//! - Define canonical records used by repository and service layers.
//! - Own identifier formatting and acting-identity types.
//!
//! # Invariants
//! - Every record is identified by a store-assigned integer id.
//! - Project soft delete is a flag flip; relationships are kept.

pub mod account;
pub mod actor;
pub mod ident;
pub mod person;
pub mod project;
pub mod weekly_summary;
