//! Log relay wire protocol.
//!
//! Every frame is a JSON text message. Frames sent to viewers share the
//! envelope `{ path, data }`; frames sent by viewers carry a `command` tag.

pub mod codec;
pub mod error;
pub mod message;

use serde::{Deserialize, Serialize};

pub use codec::{ClientCodec, ServerCodec};
pub use message::{
    ControlLevel, Envelope, LogRecord, LoggerDirective, LoggingUpdate, LoggingUpdateData, Payload,
    Welcome,
};

/// Channel path the relay listens on and stamps into every log frame.
pub const RELAY_PATH: &str = "/cap-console/logs";

/// Logger name whose directives set the process-wide root level.
pub const ROOT_LOGGER: &str = "root";

/// Value of the `thread` field. Thread attribution is not supported.
pub const THREAD_PLACEHOLDER: &str = "not-supported";

/// Default text of the greeting sent to each new viewer.
pub const WELCOME_MESSAGE: &str = "Welcome to CAP console plugin";

/// Commands a viewer may send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Changes logger levels. Only the `root` logger is honored.
    #[serde(rename = "logging/update")]
    LoggingUpdate,
}

impl Command {
    pub fn as_str(self) -> &'static str {
        match self {
            Command::LoggingUpdate => "logging/update",
        }
    }
}
