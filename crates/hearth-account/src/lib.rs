/// Hearth account layer.
///
/// An [`Account`] binds a login identity to the characters it may play and to
/// its read state on every discussion board. Both collections are loaded from
/// the store on first use and owned by the account for the rest of its life.

pub mod account;
pub mod cache;
pub mod error;
pub mod forums;
pub mod persist;
pub mod registry;
pub mod roster;

pub use account::Account;
pub use cache::Cache;
pub use error::AccountError;
pub use forums::{AccountForum, ForumStates, UNREAD};
pub use registry::ForumRegistry;
pub use roster::AccountPlayer;
