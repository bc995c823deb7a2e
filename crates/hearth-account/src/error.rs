use hearth_db::StoreError;
use hearth_types::{CharacterId, FlagError, ForumId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("no account with login '{login}'")]
    NotFound { login: String },

    /// The operation needs a store-assigned id and the account has none yet.
    #[error("account '{login}' has not been saved")]
    Unsaved { login: String },

    #[error("unknown forum {0}")]
    UnknownForum(ForumId),

    #[error("autologin character {0} is not on the roster")]
    AutologinNotOnRoster(CharacterId),

    #[error(transparent)]
    InvalidFlag(#[from] FlagError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AccountError {
    /// True for every flavor of "the record isn't there".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Store(StoreError::NotFound(_)))
    }

    pub fn is_constraint(&self) -> bool {
        matches!(self, Self::Store(StoreError::Constraint(_)))
    }
}
