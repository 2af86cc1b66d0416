//! Connection and transport layer
//!
//! This module owns the socket to mpv, the reader task, and the correlation of
//! command replies with their requests.

pub mod connection;
pub mod transport;
