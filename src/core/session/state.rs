use serde::{Deserialize, Serialize};

/// Where a session connects to. Fixed for the lifetime of the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionTarget {
    pub host: String,
    pub port: u16,
}

impl ConnectionTarget {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl std::fmt::Display for ConnectionTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Session lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Disconnected,
    Connecting,
    /// Waiting for `login:`
    AwaitingLogin,
    /// Credentials sent, waiting for `>`
    AwaitingPrompt,
    Ready,
    Closed,
}

impl Phase {
    /// Only a ready session may carry traffic
    pub fn is_ready(&self) -> bool {
        matches!(self, Phase::Ready)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Disconnected => write!(f, "disconnected"),
            Phase::Connecting => write!(f, "connecting"),
            Phase::AwaitingLogin => write!(f, "awaiting login"),
            Phase::AwaitingPrompt => write!(f, "awaiting prompt"),
            Phase::Ready => write!(f, "ready"),
            Phase::Closed => write!(f, "closed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::AwaitingLogin.to_string(), "awaiting login");
        assert_eq!(Phase::Ready.to_string(), "ready");
    }

    #[test]
    fn test_only_ready_is_ready() {
        assert!(Phase::Ready.is_ready());
        assert!(!Phase::AwaitingPrompt.is_ready());
        assert!(!Phase::Closed.is_ready());
    }

    #[test]
    fn test_target_display() {
        let target = ConnectionTarget::new("192.168.1.100", 23);
        assert_eq!(target.to_string(), "192.168.1.100:23");
    }
}
