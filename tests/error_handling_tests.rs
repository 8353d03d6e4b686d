use khiterm::{ConnectError, KhiTermError, KhiTermResult, Phase, ReadError, SendError, VarError};
use std::error::Error;

/// Error handling tests
#[cfg(test)]
mod error_handling_tests {
    use super::*;

    #[test]
    fn test_error_types() {
        let errors: Vec<KhiTermError> = vec![
            ConnectError::LoginTimeout.into(),
            ConnectError::PromptTimeout.into(),
            ReadError::Timeout.into(),
            ReadError::NotConnected.into(),
            SendError::NotConnected.into(),
            VarError::NotFound { name: "white_comp".to_string() }.into(),
            KhiTermError::Config { message: "Config error".to_string() },
            KhiTermError::Output("Output error".to_string()),
        ];

        for error in errors {
            // All errors end up in a scrollback, so they must read as text
            let display = error.to_string();
            assert!(!display.is_empty(), "Error display should not be empty");
        }

        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<KhiTermError>();
    }

    #[test]
    fn test_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let read_error: ReadError = io_error.into();
        assert!(matches!(read_error, ReadError::SocketError(_)));

        let var_error: VarError = read_error.into();
        assert!(matches!(var_error, VarError::Read(ReadError::SocketError(_))));
    }

    #[test]
    fn test_error_chain() {
        let root_cause = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let connect = ConnectError::RefusedOrUnreachable {
            target: khiterm::ConnectionTarget::new("192.168.1.100", 23),
            source: root_cause,
        };
        let error: KhiTermError = connect.into();

        let mut current_error: &dyn Error = &error;
        let mut depth = 0;
        while let Some(source) = current_error.source() {
            current_error = source;
            depth += 1;
            if depth > 10 {
                break;
            }
        }

        assert_eq!(depth, 2);
        assert!(error.to_string().contains("192.168.1.100:23"));
    }

    #[test]
    fn test_handshake_error_names_phase() {
        let error = ConnectError::Handshake {
            phase: Phase::AwaitingLogin,
            source: ReadError::Closed { partial: "Kawa".to_string() },
        };

        let display = error.to_string();
        assert!(display.contains("awaiting login"));
        assert!(display.contains("closed by controller"));
    }

    #[tokio::test]
    async fn test_async_error_propagation() {
        async fn failing_read() -> Result<f64, VarError> {
            Err(ReadError::Timeout.into())
        }

        async fn calling_function() -> KhiTermResult<f64> {
            Ok(failing_read().await?)
        }

        let error = calling_function().await.unwrap_err();
        assert!(matches!(error, KhiTermError::Variable(VarError::Read(ReadError::Timeout))));
        assert!(error.to_string().contains("Timed out"));
    }

    #[test]
    fn test_error_size() {
        use std::mem;

        let error_size = mem::size_of::<KhiTermError>();
        assert!(error_size <= 128, "KhiTermError too large: {} bytes", error_size);
    }
}
