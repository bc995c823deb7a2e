/// Hearth shared value types.
///
/// Identifiers, behavior flags and the small board/note shapes that the
/// account layer exchanges with the rest of the game server.

pub mod flags;
pub mod ids;
pub mod models;

pub use flags::{ACCOUNT_FLAGS, AccountFlag, FlagError, Flags, Lookup};
pub use ids::{AccountId, CharacterId, ConnectionId, ForumId};
pub use models::{Forum, Note};
