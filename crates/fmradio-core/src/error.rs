//! Error types for fmradio.
//!
//! All fallible operations across the library return [`Result<T>`], which
//! uses [`Error`] as the error type. Peripheral failures, protocol
//! violations, and network errors are all captured here.

/// The error type for all fmradio operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The tuner peripheral failed to read or apply a register change.
    #[error("tuner error: {0}")]
    Tuner(String),

    /// A protocol-level error (malformed frame, out-of-direction event).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Timed out waiting for data from the peer.
    #[error("timeout waiting for response")]
    Timeout,

    /// An invalid parameter was passed to a configuration or tuner call.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The server could not bind or listen on its configured address.
    ///
    /// This is fatal: the server never enters its main loop.
    #[error("unable to listen on {addr}: {source}")]
    Bind {
        /// The address that was requested.
        addr: String,
        /// The underlying socket error.
        #[source]
        source: std::io::Error,
    },

    /// No connection has been established.
    #[error("not connected")]
    NotConnected,

    /// The connection was closed by the peer.
    #[error("connection lost")]
    ConnectionLost,

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_tuner() {
        let e = Error::Tuner("i2c write failed".into());
        assert_eq!(e.to_string(), "tuner error: i2c write failed");
    }

    #[test]
    fn error_display_protocol() {
        let e = Error::Protocol("unknown event id 9".into());
        assert_eq!(e.to_string(), "protocol error: unknown event id 9");
    }

    #[test]
    fn error_display_timeout() {
        assert_eq!(Error::Timeout.to_string(), "timeout waiting for response");
    }

    #[test]
    fn error_display_bind() {
        let e = Error::Bind {
            addr: "0.0.0.0:9502".into(),
            source: std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use"),
        };
        assert_eq!(e.to_string(), "unable to listen on 0.0.0.0:9502: address in use");
        assert!(std::error::Error::source(&e).is_some());
    }

    #[test]
    fn error_display_connection_lost() {
        assert_eq!(Error::ConnectionLost.to_string(), "connection lost");
    }

    #[test]
    fn error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe broken");
        let e: Error = io_err.into();
        assert!(matches!(e, Error::Io(_)));
        assert!(e.to_string().contains("pipe broken"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
