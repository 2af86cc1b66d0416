// Protocol types - messages exchanged with mpv
//
// - message: command requests, command results and line classification
// - event: events pushed by mpv and their typed view
// - listener: the listener abstraction events are fanned out to

pub mod event;
pub mod listener;
pub mod message;

pub use event::{EndFileReason, Event, EventKind};
pub use listener::{ChannelListener, EventFilter, EventListener, FilteredListener};
pub use message::{CommandRequest, CommandResult, Message, SUCCESS_STATUS};
