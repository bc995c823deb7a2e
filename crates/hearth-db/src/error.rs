use rusqlite::ErrorCode;
use thiserror::Error;

pub type Result<T, E = StoreError> = std::result::Result<T, E>;

/// Failures reported by the account store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The addressed record does not exist. An expected outcome.
    #[error("{0} not found")]
    NotFound(String),

    /// A write was rejected by a store constraint (e.g. duplicate login).
    #[error("constraint violated: {0}")]
    Constraint(String),

    /// The store could not be reached or failed the operation.
    #[error("store unavailable: {0}")]
    Unavailable(#[source] rusqlite::Error),

    #[error("database lock poisoned")]
    LockPoisoned,
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_constraint(&self) -> bool {
        matches!(self, Self::Constraint(_))
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        match e {
            rusqlite::Error::SqliteFailure(ref failure, ref msg)
                if failure.code == ErrorCode::ConstraintViolation =>
            {
                Self::Constraint(msg.clone().unwrap_or_else(|| failure.to_string()))
            }
            rusqlite::Error::QueryReturnedNoRows => Self::NotFound("row".into()),
            other => Self::Unavailable(other),
        }
    }
}
