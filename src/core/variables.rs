// Variable accessor - named numeric registers read and written through the monitor shell
use crate::core::framer::{self, SentinelSet};
use crate::core::session::Session;
use crate::domain::error::VarError;
use tracing::{debug, info};

/// Command that lists one real variable
pub fn read_command(name: &str) -> String {
    format!("list /r {}", name)
}

/// Assignment typed into the shell
pub fn write_command(name: &str, value: f64) -> String {
    format!("{} = {}", name, format_value(value))
}

/// Render a value the way the shell echoes it back.
///
/// Integral values keep one decimal (`3.0`); everything else uses the
/// shortest representation that parses back to the same `f64`.
pub fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// Pull `name`'s value out of a `list /r` response.
///
/// The first line containing `"<name> ="` wins and its last token is parsed.
pub fn parse_listing(name: &str, response: &str) -> Result<f64, VarError> {
    let marker = format!("{} =", name);
    let line = framer::split_lines(response)
        .find(|line| line.contains(&marker))
        .ok_or_else(|| VarError::NotFound {
            name: name.to_string(),
        })?;

    let raw = line
        .split_whitespace()
        .last()
        .unwrap_or_default()
        .trim_end_matches('>');

    raw.parse::<f64>().map_err(|_| VarError::Malformed {
        name: name.to_string(),
        raw: raw.to_string(),
    })
}

fn validate_name(name: &str) -> Result<(), VarError> {
    if name.is_empty() || name.chars().any(|c| c.is_whitespace() || c.is_control() || c == '=') {
        return Err(VarError::InvalidName(name.to_string()));
    }
    Ok(())
}

impl Session {
    /// Query the controller for the current value of `name`. Nothing is cached.
    pub async fn read_variable(&mut self, name: &str) -> Result<f64, VarError> {
        validate_name(name)?;

        self.send_line(&read_command(name)).await?;
        let response = self
            .read_until(&SentinelSet::prompt(), self.response_timeout())
            .await?;

        let value = parse_listing(name, &framer::decode(&response))?;
        debug!("Session '{}' read {} = {}", self.id(), name, value);
        Ok(value)
    }

    /// Assign `value` to `name` and wait for the next prompt.
    ///
    /// The controller's acceptance is not checked; read the variable back to confirm.
    pub async fn write_variable(&mut self, name: &str, value: f64) -> Result<(), VarError> {
        validate_name(name)?;
        if !value.is_finite() {
            return Err(VarError::InvalidValue(value));
        }

        self.send_line(&write_command(name, value)).await?;
        self.read_until(&SentinelSet::prompt(), self.response_timeout())
            .await?;

        info!("Session '{}' wrote {} = {}", self.id(), name, format_value(value));
        Ok(())
    }

    /// Read, add `delta`, write, then read back what the controller holds
    pub async fn adjust_variable(&mut self, name: &str, delta: f64) -> Result<f64, VarError> {
        let current = self.read_variable(name).await?;
        self.write_variable(name, current + delta).await?;
        self.read_variable(name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::Phase;
    use crate::core::testing::{accept_logged_in, fake_controller, read_line};
    use crate::domain::error::ReadError;
    use tokio::io::AsyncWriteExt;

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(-1.5), "-1.5");
        assert_eq!(format_value(3.0), "3.0");
        assert_eq!(format_value(0.1), "0.1");
        assert_eq!(write_command("water_comp", -1.5), "water_comp = -1.5");
    }

    #[test]
    fn test_parse_listing() {
        let response = "list /r white_comp\r\nwhite_comp = 3.50\r\n>";
        assert_eq!(parse_listing("white_comp", response).unwrap(), 3.5);
    }

    #[test]
    fn test_parse_listing_not_found() {
        let result = parse_listing("white_comp", "list /r white_comp\r\n>");
        assert!(matches!(result, Err(VarError::NotFound { .. })));
    }

    #[test]
    fn test_parse_listing_malformed() {
        match parse_listing("red_comp", "red_comp = ???\r\n>") {
            Err(VarError::Malformed { name, raw }) => {
                assert_eq!(name, "red_comp");
                assert_eq!(raw, "???");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("green_comp").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("a b").is_err());
        assert!(validate_name("a\r\nkill").is_err());
    }

    #[tokio::test]
    async fn test_read_variable_round_trip() {
        let (listener, config) = fake_controller().await;

        let peer = tokio::spawn(async move {
            let mut socket = accept_logged_in(&listener).await;
            let command = read_line(&mut socket).await;
            socket.write_all(b"white_comp = 3.50\r\n>").await.unwrap();
            (socket, command)
        });

        let mut session = Session::connect(&config).await.unwrap();
        let value = session.read_variable("white_comp").await.unwrap();
        let (_socket, command) = peer.await.unwrap();

        assert_eq!(command, "list /r white_comp");
        assert_eq!(value, 3.5);
        assert!(session.is_ready());
    }

    #[tokio::test]
    async fn test_read_variable_not_found() {
        let (listener, config) = fake_controller().await;

        let peer = tokio::spawn(async move {
            let mut socket = accept_logged_in(&listener).await;
            read_line(&mut socket).await;
            socket.write_all(b"\r\n>").await.unwrap();
            socket
        });

        let mut session = Session::connect(&config).await.unwrap();
        let result = session.read_variable("white_comp").await;
        let _socket = peer.await.unwrap();

        assert!(matches!(result, Err(VarError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_read_variable_timeout() {
        let (listener, mut config) = fake_controller().await;
        config.response_timeout_ms = 50;

        let peer = tokio::spawn(async move {
            let mut socket = accept_logged_in(&listener).await;
            read_line(&mut socket).await;
            socket
        });

        let mut session = Session::connect(&config).await.unwrap();
        let result = session.read_variable("white_comp").await;
        let _socket = peer.await.unwrap();

        assert!(matches!(result, Err(VarError::Read(ReadError::Timeout))));
        assert_eq!(session.phase(), Phase::Closed);
    }

    #[tokio::test]
    async fn test_write_variable_waits_for_prompt() {
        let (listener, config) = fake_controller().await;

        let peer = tokio::spawn(async move {
            let mut socket = accept_logged_in(&listener).await;
            let command = read_line(&mut socket).await;
            socket.write_all(b"\r\n>").await.unwrap();
            (socket, command)
        });

        let mut session = Session::connect(&config).await.unwrap();
        session.write_variable("water_comp", -1.5).await.unwrap();
        let (_socket, command) = peer.await.unwrap();

        assert_eq!(command, "water_comp = -1.5");
    }

    #[tokio::test]
    async fn test_write_variable_rejects_nan() {
        let (listener, config) = fake_controller().await;

        let peer = tokio::spawn(async move { accept_logged_in(&listener).await });

        let mut session = Session::connect(&config).await.unwrap();
        let _socket = peer.await.unwrap();

        let result = session.write_variable("water_comp", f64::NAN).await;
        assert!(matches!(result, Err(VarError::InvalidValue(_))));
        assert!(session.is_ready());
    }

    #[tokio::test]
    async fn test_adjust_variable() {
        let (listener, config) = fake_controller().await;

        let peer = tokio::spawn(async move {
            let mut socket = accept_logged_in(&listener).await;
            let mut commands = Vec::new();

            commands.push(read_line(&mut socket).await);
            socket.write_all(b"blue_comp = 2.0\r\n>").await.unwrap();
            commands.push(read_line(&mut socket).await);
            socket.write_all(b"\r\n>").await.unwrap();
            commands.push(read_line(&mut socket).await);
            socket.write_all(b"blue_comp = 3.0\r\n>").await.unwrap();

            (socket, commands)
        });

        let mut session = Session::connect(&config).await.unwrap();
        let value = session.adjust_variable("blue_comp", 1.0).await.unwrap();
        let (_socket, commands) = peer.await.unwrap();

        assert_eq!(value, 3.0);
        assert_eq!(
            commands,
            vec!["list /r blue_comp", "blue_comp = 3.0", "list /r blue_comp"]
        );
    }
}
