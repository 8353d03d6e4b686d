use crate::core::framer;
use crate::core::session::Session;
use crate::core::terminal::channel::{CommandSender, CommandSlot};
use crate::core::terminal::sink::OutputSink;
use crate::domain::{
    config::ControllerConfig,
    error::{ConnectError, ReadError, VarError},
};
use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

const MIN_POLL_PERIOD: Duration = Duration::from_millis(1);

/// Interactive terminal over one logged-in session.
///
/// Owns the session, the pending-command slot and the output sink. Every
/// operation takes `&mut self`, so polling and variable round-trips on the
/// same session can never interleave.
pub struct Terminal<S: OutputSink> {
    session: Session,
    slot: CommandSlot,
    sink: S,
    poll_timeout: Duration,
}

impl<S: OutputSink> Terminal<S> {
    /// Connect, log in and hand the banner to the sink
    pub async fn connect(config: &ControllerConfig, sink: S) -> Result<Self, ConnectError> {
        let session = Session::connect(config).await?;
        sink.on_text(session.banner());

        Ok(Self {
            session,
            slot: CommandSlot::new(),
            sink,
            poll_timeout: config.poll_timeout(),
        })
    }

    /// Queue a command for the next tick, replacing any unsent one
    pub fn submit(&self, command: impl Into<String>) {
        self.slot.submit(command);
    }

    /// Handle for submitting from another task or thread
    pub fn sender(&self) -> CommandSender {
        self.slot.sender()
    }

    /// One poll step: flush the pending command, then forward whatever output
    /// is waiting. Errors go to the sink as text and never end polling.
    pub async fn tick(&mut self) {
        if let Some(command) = self.slot.take() {
            if let Err(e) = self.session.send_line(&command).await {
                warn!("Failed to send {:?}: {}", command, e);
                self.report(&e.to_string());
            }
        }

        if !self.session.is_ready() {
            return;
        }

        match self.session.read_available(self.poll_timeout).await {
            Ok(Some(bytes)) => self.sink.on_text(&framer::decode(&bytes)),
            Ok(None) => {}
            Err(e @ ReadError::Closed { .. }) => self.report(&e.to_string()),
            Err(e) => {
                warn!("Poll on session '{}' failed: {}", self.session.id(), e);
                self.report(&format!("Transmission error: {}", e));
            }
        }
    }

    /// Drive `tick` every `period` until `shutdown` resolves or the session closes.
    ///
    /// A zero period is raised to one millisecond.
    pub async fn run_until<F>(&mut self, period: Duration, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let period = period.max(MIN_POLL_PERIOD);
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!("Polling session '{}' every {:?}", self.session.id(), period);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    debug!("Poller shutdown requested");
                    break;
                }
                _ = interval.tick() => {
                    self.tick().await;
                    if !self.session.is_ready() {
                        break;
                    }
                }
            }
        }
    }

    pub async fn read_variable(&mut self, name: &str) -> Result<f64, VarError> {
        self.session.read_variable(name).await
    }

    pub async fn write_variable(&mut self, name: &str, value: f64) -> Result<(), VarError> {
        self.session.write_variable(name, value).await
    }

    pub async fn adjust_variable(&mut self, name: &str, delta: f64) -> Result<f64, VarError> {
        self.session.adjust_variable(name, delta).await
    }

    /// Close the session. Safe to call repeatedly.
    pub async fn close(&mut self) {
        self.session.close().await;
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn report(&self, message: &str) {
        self.sink.on_text(&format!("\r\n{}\r\n", message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::{accept_logged_in, fake_controller, read_line};
    use tokio::io::AsyncWriteExt;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_banner_goes_to_sink() {
        let (listener, config) = fake_controller().await;
        let peer = tokio::spawn(async move { accept_logged_in(&listener).await });

        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let _terminal = Terminal::connect(&config, tx).await.unwrap();
        let _socket = peer.await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), "login:\r\n>");
    }

    #[tokio::test]
    async fn test_tick_sends_only_last_submitted_command() {
        let (listener, config) = fake_controller().await;

        let peer = tokio::spawn(async move {
            let mut socket = accept_logged_in(&listener).await;
            let first = read_line(&mut socket).await;
            let extra = timeout(Duration::from_millis(200), read_line(&mut socket)).await;
            (first, extra.is_err())
        });

        let (tx, _rx) = mpsc::unbounded_channel::<String>();
        let mut terminal = Terminal::connect(&config, tx).await.unwrap();
        terminal.submit("X");
        terminal.submit("Y");
        terminal.tick().await;
        terminal.tick().await;

        let (first, nothing_more) = peer.await.unwrap();
        assert_eq!(first, "Y");
        assert!(nothing_more);
    }

    #[tokio::test]
    async fn test_empty_command_sends_bare_terminator() {
        let (listener, config) = fake_controller().await;

        let peer = tokio::spawn(async move {
            let mut socket = accept_logged_in(&listener).await;
            read_line(&mut socket).await
        });

        let (tx, _rx) = mpsc::unbounded_channel::<String>();
        let mut terminal = Terminal::connect(&config, tx).await.unwrap();
        terminal.sender().submit("");
        terminal.tick().await;

        assert_eq!(peer.await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_tick_forwards_output() {
        let (listener, config) = fake_controller().await;

        let peer = tokio::spawn(async move {
            let mut socket = accept_logged_in(&listener).await;
            socket.write_all(b"Program running\r\n>").await.unwrap();
            socket
        });

        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let mut terminal = Terminal::connect(&config, tx).await.unwrap();
        let _socket = peer.await.unwrap();
        rx.recv().await.unwrap();

        let mut output = String::new();
        for _ in 0..50 {
            terminal.tick().await;
            while let Ok(text) = rx.try_recv() {
                output.push_str(&text);
            }
            if output.ends_with('>') {
                break;
            }
        }

        assert_eq!(output, "Program running\r\n>");
    }

    #[tokio::test]
    async fn test_tick_after_peer_close_reports_and_keeps_going() {
        let (listener, config) = fake_controller().await;
        let peer = tokio::spawn(async move { accept_logged_in(&listener).await });

        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let mut terminal = Terminal::connect(&config, tx).await.unwrap();
        drop(peer.await.unwrap());
        rx.recv().await.unwrap();

        for _ in 0..50 {
            terminal.tick().await;
            if !terminal.session().is_ready() {
                break;
            }
        }
        let notice = rx.recv().await.unwrap();
        assert!(notice.contains("Connection closed by controller"));

        terminal.submit("here");
        terminal.tick().await;
        let notice = rx.recv().await.unwrap();
        assert!(notice.contains("not connected"));
    }

    #[tokio::test]
    async fn test_run_until_stops_on_shutdown() {
        let (listener, config) = fake_controller().await;

        let peer = tokio::spawn(async move {
            let mut socket = accept_logged_in(&listener).await;
            let line = read_line(&mut socket).await;
            (line, socket)
        });

        let (tx, _rx) = mpsc::unbounded_channel::<String>();
        let mut terminal = Terminal::connect(&config, tx).await.unwrap();
        terminal.submit("status");

        terminal
            .run_until(
                Duration::from_millis(10),
                tokio::time::sleep(Duration::from_millis(100)),
            )
            .await;

        let (line, _socket) = peer.await.unwrap();
        assert_eq!(line, "status");
        assert!(terminal.session().is_ready());

        terminal
            .run_until(Duration::ZERO, tokio::time::sleep(Duration::from_millis(20)))
            .await;
        assert!(terminal.session().is_ready());

        terminal.close().await;
        terminal.close().await;
        assert!(!terminal.session().is_ready());
    }
}
