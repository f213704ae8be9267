//! Dual-form identifier codec.
//!
//! # Responsibility
//! - Decode human-facing codes (`PJT003`, `EMP008`) and bare numbers into
//!   canonical integer ids.
//! - Format canonical ids back into prefixed, zero-padded codes.
//!
//! # Invariants
//! - Decoding is pure; no lookup is performed.
//! - A prefixed code is accepted only when its prefix is in the caller's
//!   accepted set (case-sensitive).
//! - `decode(encode(n, p), {p}) == n` for every non-negative `n`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Default zero-padding width for formatted codes.
pub const DEFAULT_CODE_WIDTH: usize = 3;

pub const ACCOUNT_PREFIX: &str = "ACC";
pub const PROJECT_PREFIX: &str = "PJT";
pub const EMPLOYEE_PREFIX: &str = "EMP";
pub const MANAGER_PREFIX: &str = "MAN";
pub const WEEKLY_SUMMARY_PREFIX: &str = "WKS";

static BARE_DIGITS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").expect("valid digits regex"));
static PREFIXED_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z]+)(\d+)$").expect("valid code regex"));

/// Entity families addressable by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Account,
    Project,
    Person,
    WeeklySummary,
}

impl EntityKind {
    /// Stable lowercase name used in logs and error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Account => "account",
            Self::Project => "project",
            Self::Person => "person",
            Self::WeeklySummary => "weekly_summary",
        }
    }

    /// Code prefixes accepted when decoding ids of this kind.
    pub fn accepted_prefixes(self) -> &'static [&'static str] {
        match self {
            Self::Account => &[ACCOUNT_PREFIX],
            Self::Project => &[PROJECT_PREFIX],
            Self::Person => &[EMPLOYEE_PREFIX, MANAGER_PREFIX],
            Self::WeeklySummary => &[WEEKLY_SUMMARY_PREFIX],
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier as received at the boundary: already numeric, or a raw string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdInput {
    Numeric(i64),
    Text(String),
}

impl From<i64> for IdInput {
    fn from(value: i64) -> Self {
        Self::Numeric(value)
    }
}

impl From<&str> for IdInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for IdInput {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for IdInput {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

/// Identifier decoding failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    /// Input was blank after trimming.
    EmptyIdentifier,
    /// Input is neither bare digits nor an accepted prefixed code.
    InvalidIdentifierFormat(String),
}

impl Display for IdentifierError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyIdentifier => write!(f, "identifier must not be blank"),
            Self::InvalidIdentifierFormat(raw) => write!(f, "invalid identifier format: `{raw}`"),
        }
    }
}

impl Error for IdentifierError {}

/// Decodes a numeric id or prefixed code into the canonical integer id.
///
/// Numeric input is returned unchanged. Text input is trimmed, then accepted
/// as bare digits or as `PREFIX` + digits for a prefix in `accepted_prefixes`.
pub fn decode(raw: impl Into<IdInput>, accepted_prefixes: &[&str]) -> Result<i64, IdentifierError> {
    let text = match raw.into() {
        IdInput::Numeric(value) => return Ok(value),
        IdInput::Text(text) => text,
    };

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(IdentifierError::EmptyIdentifier);
    }

    if BARE_DIGITS_RE.is_match(trimmed) {
        return parse_digits(trimmed, trimmed);
    }

    let invalid = || IdentifierError::InvalidIdentifierFormat(trimmed.to_string());
    let caps = PREFIXED_CODE_RE.captures(trimmed).ok_or_else(invalid)?;
    let prefix = caps.get(1).map_or("", |m| m.as_str());
    if !accepted_prefixes.contains(&prefix) {
        return Err(invalid());
    }

    let digits = caps.get(2).map_or("", |m| m.as_str());
    parse_digits(digits, trimmed)
}

/// Decodes an id for one entity kind using its accepted prefixes.
pub fn decode_for(kind: EntityKind, raw: impl Into<IdInput>) -> Result<i64, IdentifierError> {
    decode(raw, kind.accepted_prefixes())
}

/// Formats `id` as `prefix` followed by `id` zero-padded to `width` digits.
///
/// Ids wider than `width` are kept whole, never truncated.
pub fn encode(id: i64, prefix: &str, width: usize) -> String {
    format!("{prefix}{id:0width$}")
}

fn parse_digits(digits: &str, original: &str) -> Result<i64, IdentifierError> {
    digits
        .parse::<i64>()
        .map_err(|_| IdentifierError::InvalidIdentifierFormat(original.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{decode, decode_for, encode, EntityKind, IdentifierError, DEFAULT_CODE_WIDTH};

    #[test]
    fn decode_accepts_code_bare_digits_and_numeric_input() {
        assert_eq!(decode("PJT003", &["PJT"]).unwrap(), 3);
        assert_eq!(decode("3", &["PJT"]).unwrap(), 3);
        assert_eq!(decode(3_i64, &["PJT"]).unwrap(), 3);
        assert_eq!(decode("  PJT010 ", &["PJT"]).unwrap(), 10);
    }

    #[test]
    fn decode_rejects_blank_input() {
        assert_eq!(decode("", &["PJT"]), Err(IdentifierError::EmptyIdentifier));
        assert_eq!(decode("   ", &["PJT"]), Err(IdentifierError::EmptyIdentifier));
    }

    #[test]
    fn decode_rejects_unaccepted_prefix_and_garbage() {
        assert!(matches!(
            decode("XYZ9", &["PJT"]),
            Err(IdentifierError::InvalidIdentifierFormat(_))
        ));
        assert!(matches!(
            decode("pjt9", &["PJT"]),
            Err(IdentifierError::InvalidIdentifierFormat(_))
        ));
        assert!(matches!(
            decode("PJT", &["PJT"]),
            Err(IdentifierError::InvalidIdentifierFormat(_))
        ));
        assert!(matches!(
            decode("12a", &["PJT"]),
            Err(IdentifierError::InvalidIdentifierFormat(_))
        ));
    }

    #[test]
    fn decode_rejects_overflowing_digits() {
        let err = decode("99999999999999999999", &["PJT"]).unwrap_err();
        assert!(matches!(err, IdentifierError::InvalidIdentifierFormat(_)));
    }

    #[test]
    fn person_ids_accept_employee_and_manager_codes() {
        assert_eq!(decode_for(EntityKind::Person, "EMP008").unwrap(), 8);
        assert_eq!(decode_for(EntityKind::Person, "MAN012").unwrap(), 12);
        assert!(decode_for(EntityKind::Person, "PJT001").is_err());
    }

    #[test]
    fn encode_pads_without_truncating() {
        assert_eq!(encode(3, "PJT", DEFAULT_CODE_WIDTH), "PJT003");
        assert_eq!(encode(1234, "PJT", DEFAULT_CODE_WIDTH), "PJT1234");
        assert_eq!(encode(7, "EMP", 5), "EMP00007");
    }

    #[test]
    fn encoded_codes_decode_back_to_the_same_id() {
        for prefix in ["PJT", "EMP", "MAN", "ACC"] {
            for id in [0_i64, 1, 9, 42, 999, 1000, 123_456] {
                let code = encode(id, prefix, DEFAULT_CODE_WIDTH);
                assert_eq!(decode(code.as_str(), &[prefix]).unwrap(), id);
            }
        }
    }
}
