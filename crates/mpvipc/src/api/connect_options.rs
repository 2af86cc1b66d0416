use std::path::PathBuf;
use std::time::Duration;

/// Environment variable consulted by [`ConnectOptions::from_env`]
pub const SOCKET_ENV_VAR: &str = "MPV_SOCKET";

/// Socket path used when nothing else is configured
#[cfg(not(windows))]
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/mpvsocket";

/// Socket path used when nothing else is configured
#[cfg(windows)]
pub const DEFAULT_SOCKET_PATH: &str = r"\\.\pipe\mpvsocket";

/// Options for `Connection::new`.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// Path of mpv's IPC socket, as passed to `--input-ipc-server`.
    pub socket_path: PathBuf,
    /// Default deadline for `call`, `get` and `set`.
    /// `None` waits for the reply indefinitely.
    pub call_timeout: Option<Duration>,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
            call_timeout: None,
        }
    }
}

impl ConnectOptions {
    /// Creates a new `ConnectOptions` with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the socket path from `MPV_SOCKET`, falling back to the default.
    pub fn from_env() -> Self {
        match std::env::var_os(SOCKET_ENV_VAR) {
            Some(path) if !path.is_empty() => Self::default().socket_path(path),
            _ => Self::default(),
        }
    }

    /// Set the IPC socket path.
    pub fn socket_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.socket_path = path.into();
        self
    }

    /// Set the default call timeout.
    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ConnectOptions::new();
        assert_eq!(options.socket_path, PathBuf::from(DEFAULT_SOCKET_PATH));
        assert_eq!(options.call_timeout, None);
    }

    #[test]
    fn test_builder() {
        let options = ConnectOptions::new()
            .socket_path("/run/user/1000/mpv.sock")
            .call_timeout(Duration::from_secs(5));

        assert_eq!(options.socket_path, PathBuf::from("/run/user/1000/mpv.sock"));
        assert_eq!(options.call_timeout, Some(Duration::from_secs(5)));
    }
}
