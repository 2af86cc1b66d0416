// Public API types module
//
// Options and builder types used to configure a `Connection`.

pub mod connect_options;

pub use connect_options::{ConnectOptions, DEFAULT_SOCKET_PATH, SOCKET_ENV_VAR};
