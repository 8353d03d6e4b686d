use crate::core::session::{ConnectionTarget, Phase};
use thiserror::Error;

/// Failure while bringing a session up to the `>` prompt
#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("Controller did not send the login banner in time")]
    LoginTimeout,

    #[error("Controller did not show the monitor prompt after login")]
    PromptTimeout,

    #[error("Cannot reach controller at {target}: {source}")]
    RefusedOrUnreachable {
        target: ConnectionTarget,
        #[source]
        source: std::io::Error,
    },

    #[error("Handshake failed while {phase}: {source}")]
    Handshake {
        phase: Phase,
        #[source]
        source: ReadError,
    },
}

/// Failure of a sentinel-delimited or opportunistic read
#[derive(Error, Debug)]
pub enum ReadError {
    #[error("Timed out waiting for controller response")]
    Timeout,

    #[error("Connection closed by controller")]
    Closed {
        /// Text received before the peer went away, never matched by a sentinel
        partial: String,
    },

    #[error("Socket error: {0}")]
    SocketError(#[from] std::io::Error),

    #[error("Session is not connected")]
    NotConnected,
}

/// Failure writing a line to the controller
#[derive(Error, Debug)]
pub enum SendError {
    #[error("Session is not connected")]
    NotConnected,

    #[error("Transmission error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of a variable round-trip
#[derive(Error, Debug)]
pub enum VarError {
    #[error("Variable '{name}' not found in controller response")]
    NotFound { name: String },

    #[error("Variable '{name}' has a malformed value '{raw}'")]
    Malformed { name: String, raw: String },

    #[error("Invalid variable name '{0}'")]
    InvalidName(String),

    #[error("Value {0} cannot be written to the controller")]
    InvalidValue(f64),

    #[error(transparent)]
    Read(#[from] ReadError),

    #[error(transparent)]
    Send(#[from] SendError),
}

/// KhiTerm unified error type
#[derive(Error, Debug)]
pub enum KhiTermError {
    #[error("Cannot establish connection with robot: {0}")]
    Connect(#[from] ConnectError),

    #[error("Read error: {0}")]
    Read(#[from] ReadError),

    #[error("Send error: {0}")]
    Send(#[from] SendError),

    #[error("Variable error: {0}")]
    Variable(#[from] VarError),

    #[error("Network error: {0}")]
    Network(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Output error: {0}")]
    Output(String),
}

pub type KhiTermResult<T> = Result<T, KhiTermError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_error_display() {
        assert!(ConnectError::LoginTimeout.to_string().contains("login"));
        assert!(ConnectError::PromptTimeout.to_string().contains("prompt"));

        let err = ConnectError::Handshake {
            phase: Phase::AwaitingPrompt,
            source: ReadError::Closed { partial: String::new() },
        };
        let text = err.to_string();
        assert!(text.contains("awaiting prompt"));
        assert!(text.contains("closed"));
    }

    #[test]
    fn test_var_error_wraps_read_error() {
        let err: VarError = ReadError::Timeout.into();
        assert!(matches!(err, VarError::Read(ReadError::Timeout)));
        assert_eq!(err.to_string(), "Timed out waiting for controller response");
    }

    #[test]
    fn test_unified_error_prefix() {
        let err: KhiTermError = ConnectError::LoginTimeout.into();
        assert!(err.to_string().starts_with("Cannot establish connection with robot"));
    }
}
