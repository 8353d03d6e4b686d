use crate::core::framer::{self, SentinelSet, LINE_END};
use crate::core::session::state::{ConnectionTarget, Phase};
use crate::domain::{
    config::ControllerConfig,
    error::{ConnectError, ReadError, SendError},
};
use std::io;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// User name the AS monitor accepts without a password
pub const CREDENTIAL: &[u8] = b"as";

/// Largest chunk taken by an opportunistic read
const READ_CHUNK: usize = 4096;

/// Logged-in connection to one controller.
///
/// A session is either ready for traffic or closed; a failed handshake never
/// hands out a half-open session. Dropping it closes the socket.
pub struct Session {
    id: String,
    target: ConnectionTarget,
    stream: Option<TcpStream>,
    phase: Phase,
    banner: String,
    response_timeout: Duration,
}

impl Session {
    /// Open the TCP stream and run the login handshake
    pub async fn connect(config: &ControllerConfig) -> Result<Self, ConnectError> {
        let target = config.target();
        let id = format!("khi_{}", uuid::Uuid::new_v4().simple());
        debug!("Session '{}' connecting to {}", id, target);

        let attempt = timeout(
            config.connect_timeout(),
            TcpStream::connect((target.host.as_str(), target.port)),
        )
        .await;

        let stream = match attempt {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => return Err(ConnectError::RefusedOrUnreachable { target, source }),
            Err(_) => {
                let source = io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("no answer within {} ms", config.connect_timeout_ms),
                );
                return Err(ConnectError::RefusedOrUnreachable { target, source });
            }
        };

        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY: {}", e);
        }

        let mut session = Self {
            id,
            target,
            stream: Some(stream),
            phase: Phase::Connecting,
            banner: String::new(),
            response_timeout: config.response_timeout(),
        };

        if let Err(e) = session.handshake(config).await {
            warn!("Session '{}' handshake failed: {}", session.id, e);
            session.close().await;
            return Err(e);
        }

        info!("Session '{}' logged in to {}", session.id, session.target);
        Ok(session)
    }

    async fn handshake(&mut self, config: &ControllerConfig) -> Result<(), ConnectError> {
        self.phase = Phase::AwaitingLogin;
        let login = self
            .read_until(&SentinelSet::login(), config.login_timeout())
            .await
            .map_err(|e| match e {
                ReadError::Timeout => ConnectError::LoginTimeout,
                source => ConnectError::Handshake {
                    phase: Phase::AwaitingLogin,
                    source,
                },
            })?;
        self.banner.push_str(&framer::decode(&login));

        self.write_raw(CREDENTIAL)
            .await
            .map_err(|e| ConnectError::Handshake {
                phase: Phase::AwaitingLogin,
                source: ReadError::SocketError(e),
            })?;

        self.phase = Phase::AwaitingPrompt;
        let prompt = self
            .read_until(&SentinelSet::prompt(), config.prompt_timeout())
            .await
            .map_err(|e| match e {
                ReadError::Timeout => ConnectError::PromptTimeout,
                source => ConnectError::Handshake {
                    phase: Phase::AwaitingPrompt,
                    source,
                },
            })?;
        self.banner.push_str(&framer::decode(&prompt));

        self.phase = Phase::Ready;
        Ok(())
    }

    /// Write `text` followed by the line terminator.
    ///
    /// An empty string sends a bare terminator, the same as pressing Enter.
    pub async fn send_line(&mut self, text: &str) -> Result<(), SendError> {
        if !self.phase.is_ready() {
            return Err(SendError::NotConnected);
        }

        if let Err(e) = self.write_raw(text.as_bytes()).await {
            warn!("Session '{}' write failed: {}", self.id, e);
            self.close().await;
            return Err(SendError::Io(e));
        }

        debug!("Session '{}' sent line {:?}", self.id, text);
        Ok(())
    }

    async fn write_raw(&mut self, payload: &[u8]) -> io::Result<()> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "socket closed"))?;

        let mut line = Vec::with_capacity(payload.len() + LINE_END.len());
        line.extend_from_slice(payload);
        line.extend_from_slice(LINE_END);

        stream.write_all(&line).await?;
        stream.flush().await
    }

    /// Read until a sentinel shows up, the peer hangs up, or `limit` elapses.
    ///
    /// Bytes are taken off the socket one at a time so nothing past the
    /// sentinel is consumed. Any failure closes the session.
    pub async fn read_until(
        &mut self,
        sentinels: &SentinelSet,
        limit: Duration,
    ) -> Result<Vec<u8>, ReadError> {
        let stream = self.stream.as_mut().ok_or(ReadError::NotConnected)?;

        let mut buffer = Vec::new();
        let outcome = match timeout(limit, read_framed(stream, sentinels, &mut buffer)).await {
            Ok(result) => result,
            Err(_) => Err(ReadError::Timeout),
        };

        match outcome {
            Ok(()) => {
                debug!("Session '{}' rx {}", self.id, hex::encode(&buffer));
                Ok(buffer)
            }
            Err(e) => {
                debug!(
                    "Session '{}' read for {} failed after {} bytes: {}",
                    self.id,
                    sentinels,
                    buffer.len(),
                    e
                );
                self.close().await;
                Err(e)
            }
        }
    }

    /// Take whatever the controller has sent so far without waiting on a sentinel.
    ///
    /// Waits at most `wait` for the socket to turn readable. `Ok(None)` means
    /// nothing arrived. Peer close shuts the session down; other socket errors
    /// leave it open.
    pub async fn read_available(&mut self, wait: Duration) -> Result<Option<Vec<u8>>, ReadError> {
        let stream = self.stream.as_mut().ok_or(ReadError::NotConnected)?;

        match timeout(wait, stream.readable()).await {
            Err(_) => return Ok(None),
            Ok(Err(e)) => return Err(ReadError::SocketError(e)),
            Ok(Ok(())) => {}
        }

        let mut chunk = [0u8; READ_CHUNK];
        match stream.try_read(&mut chunk) {
            Ok(0) => {
                info!("Session '{}' closed by controller", self.id);
                self.close().await;
                Err(ReadError::Closed {
                    partial: String::new(),
                })
            }
            Ok(n) => {
                debug!("Session '{}' rx {}", self.id, hex::encode(&chunk[..n]));
                Ok(Some(chunk[..n].to_vec()))
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(ReadError::SocketError(e)),
        }
    }

    /// Close the socket. Safe to call any number of times.
    pub async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                debug!("Session '{}' shutdown: {}", self.id, e);
            }
            info!("Session '{}' closed", self.id);
        }
        self.phase = Phase::Closed;
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn target(&self) -> &ConnectionTarget {
        &self.target
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_ready(&self) -> bool {
        self.phase.is_ready()
    }

    /// Banner and prompt text seen during the handshake
    pub fn banner(&self) -> &str {
        &self.banner
    }

    /// How long a command round-trip may wait for the next prompt
    pub fn response_timeout(&self) -> Duration {
        self.response_timeout
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.stream.is_some() {
            debug!("Session '{}' dropped while open, closing socket", self.id);
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("target", &self.target)
            .field("phase", &self.phase)
            .finish()
    }
}

async fn read_framed(
    stream: &mut TcpStream,
    sentinels: &SentinelSet,
    buffer: &mut Vec<u8>,
) -> Result<(), ReadError> {
    let mut byte = [0u8; 1];
    loop {
        if stream.read(&mut byte).await? == 0 {
            return Err(ReadError::Closed {
                partial: framer::decode(buffer),
            });
        }
        buffer.push(byte[0]);

        if framer::matches(buffer, sentinels) {
            return Ok(());
        }
    }
}
