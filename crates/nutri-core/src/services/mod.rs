//! Application services.
//!
//! Each service borrows the store (and, for accounts, the auth provider) plus the
//! resolved [`CoreConfig`](crate::config::CoreConfig). Embedded lists
//! (`consultas`, `tareas`) are edited read-modify-write on the parent document
//! with no concurrency check: two writers racing on the same parent can lose an
//! update.

mod accounts;
mod doctors;
mod patients;
mod stats;
mod tasks;

pub use accounts::*;
pub use doctors::*;
pub use patients::*;
pub use stats::*;
pub use tasks::*;

use serde_json::Value;
use thiserror::Error;

use crate::auth::AuthError;
use crate::store::{DocumentData, StoreError};
use crate::validation::ValidationError;

/// Service errors.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub(crate) fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        ServiceError::NotFound {
            entity,
            id: id.into(),
        }
    }
}

/// Log a failed store call and pass the error through.
pub(crate) fn log_store_error(operation: &'static str) -> impl Fn(StoreError) -> ServiceError {
    move |e| {
        tracing::error!(operation, error = %e, "document store call failed");
        ServiceError::Store(e)
    }
}

/// Log a rejected input and pass the error through.
pub(crate) fn log_validation_error(
    operation: &'static str,
) -> impl Fn(ValidationError) -> ServiceError {
    move |e| {
        tracing::debug!(operation, error = %e, "input rejected");
        ServiceError::Validation(e)
    }
}

/// Top-level fields of an object literal built with `json!`.
pub(crate) fn fields(value: Value) -> DocumentData {
    match value {
        Value::Object(map) => map,
        _ => DocumentData::new(),
    }
}
