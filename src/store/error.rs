use thiserror::Error;

/// Failure reported by a document store. `Display` yields the store's own
/// message unchanged so it can be relayed to clients as-is.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unavailable(String),
}
