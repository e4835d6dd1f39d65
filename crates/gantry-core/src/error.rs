//! Error surface shared by every engine in this crate.

use crate::store::StoreError;

/// Failure modes of the control-plane operations.
///
/// `Unauthorized` deliberately covers both "app does not exist" and "app is
/// not yours": callers cannot probe for foreign apps through error shapes.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Caller is not the owner of the app scoping the requested resource.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A referenced record id did not resolve.
    #[error("{0}")]
    NotFound(String),

    /// The (key, environment) pair is already taken within the app.
    #[error("environment variable \"{key}\" already exists for {environment}")]
    DuplicateKey { key: String, environment: String },

    /// Input rejected before any store mutation.
    #[error("invalid input: {0}")]
    Validation(String),

    /// The backing store failed.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}
