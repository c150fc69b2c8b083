//! Service-level error taxonomy.
//!
//! Every operation fails with exactly one of these kinds: bad input
//! (`Validation`), missing entity (`NotFound`), lifecycle violation
//! (`InvalidState`), missing capability (`PermissionDenied`), or a storage
//! problem (`Infrastructure`). A failed mutation leaves state untouched.

use thiserror::Error;

use crate::db::DatabaseError;
use crate::models::enums::Role;
use crate::permissions::Action;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed or missing input. Recoverable by resubmission; the message
    /// names the offending field.
    #[error("{field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Operation illegal for the entity's current lifecycle state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("permission denied: {} may not {}", role.as_str(), action.as_str())]
    PermissionDenied { role: Role, action: Action },

    /// Storage failure or lock timeout. May be transient.
    #[error("storage failure: {0}")]
    Infrastructure(#[source] DatabaseError),
}

impl ServiceError {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }
}

/// Repository `NotFound` keeps its meaning at the service level; everything
/// else from the storage layer is an infrastructure failure.
impl From<DatabaseError> for ServiceError {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::NotFound { entity_type, id } => Self::NotFound {
                entity: entity_type,
                id,
            },
            other => Self::Infrastructure(other),
        }
    }
}

impl From<rusqlite::Error> for ServiceError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Infrastructure(DatabaseError::Sqlite(e))
    }
}
