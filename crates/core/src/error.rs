//! Domain error taxonomy.
//!
//! Persistence errors are deliberately not represented here: they stay as
//! `sqlx::Error` and are wrapped at the api layer, so callers can always
//! tell "the input was bad" apart from "the store was unavailable".

use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    /// Malformed or out-of-contract input (bad time format, wrong type for
    /// a boolean field, empty device token, invalid platform).
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
