pub mod errors;
pub mod id;

pub use errors::{ConfigError, PrismError};
pub use id::{new_id, MessageId, SessionId};

pub type Result<T> = std::result::Result<T, PrismError>;
