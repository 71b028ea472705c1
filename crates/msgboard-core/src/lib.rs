//! msgboard core library
//!
//! Message model, submission whitelisting and the create/list flow that
//! publishes every saved message on the real-time channel.

pub mod config;
pub mod error;
pub mod message;

pub use config::{BroadcastFailurePolicy, Config};
pub use error::{BoardError, BoardResult};
pub use message::model::{Message, MessageDraft};
pub use message::params::{permit_message_params, MessageParams};
pub use message::{MessageService, MESSAGE_TOPIC};
