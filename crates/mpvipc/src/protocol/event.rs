// Events pushed by mpv without a preceding request
//
// See: <https://mpv.io/manual/master/#list-of-events>

use crate::protocol::message::nullable_string;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An event received from mpv.
///
/// Only `name` is always present. The other fields are filled in depending on
/// the event and are left at their zero value otherwise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Name of the event, e.g. `"pause"` or `"property-change"`
    #[serde(rename = "event", default, deserialize_with = "nullable_string")]
    pub name: String,

    /// Why playback ended (`end-file` only).
    ///
    /// One of `"eof"`, `"stop"`, `"quit"`, `"error"`, `"redirect"`, `"unknown"`.
    #[serde(
        default,
        deserialize_with = "nullable_string",
        skip_serializing_if = "String::is_empty"
    )]
    pub reason: String,

    /// Module prefix of a `log-message`
    #[serde(
        default,
        deserialize_with = "nullable_string",
        skip_serializing_if = "String::is_empty"
    )]
    pub prefix: String,

    /// Log level of a `log-message`
    #[serde(
        default,
        deserialize_with = "nullable_string",
        skip_serializing_if = "String::is_empty"
    )]
    pub level: String,

    /// Text of a `log-message`
    #[serde(
        default,
        deserialize_with = "nullable_string",
        skip_serializing_if = "String::is_empty"
    )]
    pub text: String,

    /// User-chosen id passed to `observe_property`
    #[serde(default, skip_serializing_if = "is_zero")]
    pub id: u64,

    /// New property value (`property-change` only)
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub data: Value,

    /// Error description when `reason` is `"error"`
    #[serde(
        default,
        deserialize_with = "nullable_string",
        skip_serializing_if = "String::is_empty"
    )]
    pub error: String,
}

fn is_zero(id: &u64) -> bool {
    *id == 0
}

impl Event {
    /// Creates an event carrying only a name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Decodes a line as an event.
    ///
    /// Returns `None` when the line is not valid JSON for an event or has no name.
    pub fn decode(line: &str) -> Option<Self> {
        match serde_json::from_str::<Self>(line) {
            Ok(event) if !event.name.is_empty() => Some(event),
            Ok(_) => None,
            Err(e) => {
                tracing::trace!("Line is not an event: {}", e);
                None
            }
        }
    }

    /// Typed view of this event
    pub fn kind(&self) -> EventKind<'_> {
        match self.name.as_str() {
            "start-file" => EventKind::StartFile,
            "end-file" => EventKind::EndFile {
                reason: EndFileReason::parse(&self.reason),
                error: (!self.error.is_empty()).then_some(self.error.as_str()),
            },
            "file-loaded" => EventKind::FileLoaded,
            "seek" => EventKind::Seek,
            "playback-restart" => EventKind::PlaybackRestart,
            "shutdown" => EventKind::Shutdown,
            "idle" => EventKind::Idle,
            "video-reconfig" => EventKind::VideoReconfig,
            "audio-reconfig" => EventKind::AudioReconfig,
            "client-message" => EventKind::ClientMessage,
            "log-message" => EventKind::LogMessage {
                prefix: &self.prefix,
                level: &self.level,
                text: &self.text,
            },
            "property-change" => EventKind::PropertyChange {
                id: self.id,
                data: &self.data,
            },
            other => EventKind::Other(other),
        }
    }
}

/// Events mpv documents, with the fields each one carries
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventKind<'a> {
    StartFile,
    EndFile {
        reason: EndFileReason,
        error: Option<&'a str>,
    },
    FileLoaded,
    Seek,
    PlaybackRestart,
    Shutdown,
    Idle,
    VideoReconfig,
    AudioReconfig,
    ClientMessage,
    LogMessage {
        prefix: &'a str,
        level: &'a str,
        text: &'a str,
    },
    PropertyChange {
        id: u64,
        data: &'a Value,
    },
    /// Any event not listed above (including deprecated ones like `pause`)
    Other(&'a str),
}

/// Reason attached to an `end-file` event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndFileReason {
    Eof,
    Stop,
    Quit,
    Error,
    Redirect,
    Unknown,
}

impl EndFileReason {
    fn parse(reason: &str) -> Self {
        match reason {
            "eof" => EndFileReason::Eof,
            "stop" => EndFileReason::Stop,
            "quit" => EndFileReason::Quit,
            "error" => EndFileReason::Error,
            "redirect" => EndFileReason::Redirect,
            _ => EndFileReason::Unknown,
        }
    }
}
