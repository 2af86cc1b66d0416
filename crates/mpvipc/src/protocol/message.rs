// Wire codec for mpv's JSON IPC protocol
//
// Every message is one JSON object terminated by '\n'.
// - Outbound: {"command": [name, args...], "request_id": N}
// - Inbound result: {"error": "success", "data": ..., "request_id": N}
// - Inbound event: {"event": "name", ...optional fields}
//
// See: <https://mpv.io/manual/master/#json-ipc>

use crate::error::{Error, Result};
use crate::protocol::event::Event;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Status mpv reports for a command that completed successfully
pub const SUCCESS_STATUS: &str = "success";

/// Command sent to mpv
#[derive(Debug, Clone, Serialize)]
pub struct CommandRequest<'a> {
    /// Command name followed by its arguments
    #[serde(rename = "command")]
    pub arguments: &'a [Value],
    pub request_id: u64,
}

impl<'a> CommandRequest<'a> {
    pub fn new(request_id: u64, arguments: &'a [Value]) -> Self {
        Self {
            arguments,
            request_id,
        }
    }

    /// Serializes the request into one newline-terminated line
    pub fn encode_line(&self) -> Result<Vec<u8>> {
        let mut line = serde_json::to_vec(self).map_err(Error::Encode)?;
        line.push(b'\n');
        Ok(line)
    }
}

/// Reply from mpv to a command
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandResult {
    /// `"success"` or an error description
    #[serde(rename = "error", default, deserialize_with = "nullable_string")]
    pub status: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub request_id: u64,
}

impl CommandResult {
    /// Decodes a line as a command result.
    ///
    /// Returns `None` when the line is not valid JSON for a result or carries
    /// no status.
    pub fn decode(line: &str) -> Option<Self> {
        match serde_json::from_str::<Self>(line) {
            Ok(result) if !result.status.is_empty() => Some(result),
            Ok(_) => None,
            Err(e) => {
                tracing::trace!("Line is not a command result: {}", e);
                None
            }
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == SUCCESS_STATUS
    }

    /// Converts the reply into the value handed to the caller
    pub fn into_result(self) -> Result<Value> {
        if self.is_success() {
            Ok(self.data)
        } else {
            Err(Error::ProtocolError(self.status))
        }
    }
}

/// One inbound line, classified.
///
/// Both decodings are attempted independently, so a line may in principle be
/// an event and a result at once. mpv never sends such a line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Message {
    pub event: Option<Event>,
    pub result: Option<CommandResult>,
}

impl Message {
    pub fn parse(line: &str) -> Self {
        Self {
            event: Event::decode(line),
            result: CommandResult::decode(line),
        }
    }

    /// True if the line was neither an event nor a result
    pub fn is_empty(&self) -> bool {
        self.event.is_none() && self.result.is_none()
    }
}

/// Treats JSON `null` like a missing string field
pub(crate) fn nullable_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Deserialize::deserialize(deserializer)?;
    Ok(s.unwrap_or_default())
}
