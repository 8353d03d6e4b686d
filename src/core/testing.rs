// Fake controller peers for unit tests
use crate::domain::config::ControllerConfig;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Listener on an ephemeral port and a config with short timeouts pointing at it
pub(crate) async fn fake_controller() -> (TcpListener, ControllerConfig) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let config = ControllerConfig {
        connect_timeout_ms: 1000,
        login_timeout_ms: 200,
        prompt_timeout_ms: 200,
        response_timeout_ms: 1000,
        poll_timeout_ms: 50,
        ..ControllerConfig::new("127.0.0.1", port)
    };

    (listener, config)
}

/// Accept one client and walk it through the login handshake
pub(crate) async fn accept_logged_in(listener: &TcpListener) -> TcpStream {
    let (mut socket, _) = listener.accept().await.unwrap();
    socket.write_all(b"login:").await.unwrap();
    assert_eq!(read_line(&mut socket).await, "as");
    socket.write_all(b"\r\n>").await.unwrap();
    socket
}

/// Read one CRLF-terminated line, returned without the terminator
pub(crate) async fn read_line(socket: &mut TcpStream) -> String {
    let mut line = Vec::new();
    let mut byte = [0u8; 1];
    while !line.ends_with(b"\r\n") {
        if socket.read(&mut byte).await.unwrap() == 0 {
            break;
        }
        line.push(byte[0]);
    }
    String::from_utf8_lossy(line.strip_suffix(b"\r\n").unwrap_or(&line)).into_owned()
}
