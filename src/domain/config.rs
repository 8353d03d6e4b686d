use crate::core::session::ConnectionTarget;
use crate::domain::error::{KhiTermError, KhiTermResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// KhiTerm configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KhiTermConfig {
    /// Global configuration
    #[serde(default)]
    pub global: GlobalConfig,
    /// Controller connection settings
    #[serde(default)]
    pub controller: ControllerConfig,
    /// Variables the CLI knows how to nudge
    #[serde(default)]
    pub variables: Vec<VariablePreset>,
}

/// Global configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Default log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Period between poller ticks in milliseconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

/// Controller connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// TCP connect timeout
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,
    /// Wait for the `login:` banner
    #[serde(default = "default_login_timeout")]
    pub login_timeout_ms: u64,
    /// Wait for the `>` prompt after sending credentials
    #[serde(default = "default_prompt_timeout")]
    pub prompt_timeout_ms: u64,
    /// Wait for the prompt after a variable command
    #[serde(default = "default_response_timeout")]
    pub response_timeout_ms: u64,
    /// Readiness check inside a poller tick
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_ms: u64,
}

/// Named controller variable with its nudge step
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VariablePreset {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_step")]
    pub step: f64,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_poll_interval() -> u64 {
    100
}

fn default_host() -> String {
    "192.168.1.100".to_string()
}

fn default_port() -> u16 {
    23
}

fn default_connect_timeout() -> u64 {
    3000
}

fn default_login_timeout() -> u64 {
    5000
}

fn default_prompt_timeout() -> u64 {
    5000
}

fn default_response_timeout() -> u64 {
    1000
}

fn default_poll_timeout() -> u64 {
    10
}

fn default_step() -> f64 {
    1.0
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            connect_timeout_ms: default_connect_timeout(),
            login_timeout_ms: default_login_timeout(),
            prompt_timeout_ms: default_prompt_timeout(),
            response_timeout_ms: default_response_timeout(),
            poll_timeout_ms: default_poll_timeout(),
        }
    }
}

impl ControllerConfig {
    /// Defaults pointed at a specific controller
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    pub fn target(&self) -> ConnectionTarget {
        ConnectionTarget::new(self.host.clone(), self.port)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn login_timeout(&self) -> Duration {
        Duration::from_millis(self.login_timeout_ms)
    }

    pub fn prompt_timeout(&self) -> Duration {
        Duration::from_millis(self.prompt_timeout_ms)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    /// Host must be set and every handshake/response wait must be non-zero
    pub fn validate(&self) -> KhiTermResult<()> {
        if self.host.trim().is_empty() {
            return Err(invalid("controller.host must not be empty"));
        }
        let waits = [
            ("connect_timeout_ms", self.connect_timeout_ms),
            ("login_timeout_ms", self.login_timeout_ms),
            ("prompt_timeout_ms", self.prompt_timeout_ms),
            ("response_timeout_ms", self.response_timeout_ms),
        ];
        for (key, value) in waits {
            if value == 0 {
                return Err(invalid(&format!("controller.{} must be greater than zero", key)));
            }
        }
        Ok(())
    }
}

fn invalid(message: &str) -> KhiTermError {
    KhiTermError::Config {
        message: message.to_string(),
    }
}

impl VariablePreset {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            step: default_step(),
        }
    }
}

impl KhiTermConfig {
    /// Look up a preset by variable name
    pub fn preset(&self, name: &str) -> Option<&VariablePreset> {
        self.variables.iter().find(|preset| preset.name == name)
    }

    /// Check values the engine cannot run with
    pub fn validate(&self) -> KhiTermResult<()> {
        if self.global.poll_interval_ms == 0 {
            return Err(invalid("global.poll_interval_ms must be greater than zero"));
        }
        self.controller.validate()
    }

    /// Paint compensation variables the monitor shell exposes on a stock cell
    pub fn compensation_presets() -> Vec<VariablePreset> {
        [
            ("white_comp", "White paint compensation"),
            ("green_comp", "Green paint compensation"),
            ("red_comp", "Red paint compensation"),
            ("blue_comp", "Blue paint compensation"),
            ("black_comp", "Black paint compensation"),
            ("yellow_comp", "Yellow paint compensation"),
            ("canvas_comp", "Canvas compensation"),
            ("water_comp", "Water compensation"),
        ]
        .into_iter()
        .map(|(name, description)| VariablePreset::new(name, description))
        .collect()
    }
}
