//! Lifecycle services.
//!
//! # Responsibility
//! - Orchestrate store calls into use-case level operations.
//! - Own transaction boundaries; stores only ever join them.
//! - Translate persistence failures into the caller-facing error taxonomy.

use crate::service::error::ServiceResult;
use log::{info, warn};
use std::time::Instant;

pub mod account_service;
pub mod cascade;
pub mod error;
pub mod guard;
pub mod person_service;
pub mod project_service;
pub mod summary_service;

/// Emits one metadata-only outcome line for a lifecycle operation.
pub(crate) fn observe<T>(
    event: &'static str,
    started_at: Instant,
    result: ServiceResult<T>,
) -> ServiceResult<T> {
    match &result {
        Ok(_) => info!(
            "event={event} module=service status=ok duration_ms={}",
            started_at.elapsed().as_millis()
        ),
        Err(err) => warn!(
            "event={event} module=service status=error duration_ms={} error_code={}",
            started_at.elapsed().as_millis(),
            err.code()
        ),
    }
    result
}
