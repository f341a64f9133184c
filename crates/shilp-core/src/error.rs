//! Error types for the Shilp client.

use thiserror::Error;

/// Result type alias using the Shilp client's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for Shilp client operations.
///
/// Every failure is surfaced to the caller; nothing is converted into a
/// degraded success. Match on the variant to decide between retry, fallback
/// and abort.
#[derive(Error, Debug)]
pub enum Error {
    /// Client-side pre-flight check failed. No request was sent.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Server answered with status >= 400. `body` is the raw response text.
    #[error("API error: {body} (status: {status})")]
    Api { status: u16, body: String },

    /// Response did not match the expected shape or carried an unknown enum value.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Connection-level failure (DNS, refused, reset, TLS).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The per-call timeout elapsed.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Heartbeat LSN went backwards for a replica/collection pair.
    #[error(
        "Invalid LSN {lsn} for replica {replica_id} on collection {collection}: last acknowledged LSN is {last_acked}"
    )]
    InvalidLsn {
        replica_id: String,
        collection: String,
        lsn: u64,
        last_acked: u64,
    },

    /// Resource not known to the server (unregistered service, unknown address).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// HTTP status carried by an [`Error::Api`], if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether a caller may reasonably retry an idempotent call that failed
    /// with this error. No retries are performed by the client itself.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport(_) | Error::Timeout(_) => true,
            Error::Api { status, .. } => *status == 429 || (500..=599).contains(status),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Decode(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::Timeout(e.to_string())
        } else if e.is_decode() {
            Error::Decode(e.to_string())
        } else {
            Error::Transport(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_validation() {
        let err = Error::Validation("collection name cannot be empty".to_string());
        assert_eq!(
            err.to_string(),
            "Validation error: collection name cannot be empty"
        );
    }

    #[test]
    fn test_error_display_api_keeps_body_verbatim() {
        let err = Error::Api {
            status: 500,
            body: "Internal Server Error".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "API error: Internal Server Error (status: 500)"
        );
    }

    #[test]
    fn test_error_display_invalid_lsn() {
        let err = Error::InvalidLsn {
            replica_id: "replica-1".to_string(),
            collection: "docs".to_string(),
            lsn: 3,
            last_acked: 5,
        };
        let msg = err.to_string();
        assert!(msg.contains("Invalid LSN 3"));
        assert!(msg.contains("replica-1"));
        assert!(msg.contains("last acknowledged LSN is 5"));
    }

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("service svc-1".to_string());
        assert_eq!(err.to_string(), "Not found: service svc-1");
    }

    #[test]
    fn test_error_display_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::Io(io_err);
        assert!(err.to_string().contains("I/O error:"));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Decode(msg) => assert!(!msg.is_empty()),
            other => panic!("Expected Decode error, got {:?}", other),
        }
    }

    #[test]
    fn test_status_only_for_api_errors() {
        let api = Error::Api {
            status: 404,
            body: String::new(),
        };
        assert_eq!(api.status(), Some(404));
        assert_eq!(Error::Decode("x".to_string()).status(), None);
    }

    #[test]
    fn test_retryable_classification() {
        assert!(Error::Transport("reset".to_string()).is_retryable());
        assert!(Error::Timeout("30s".to_string()).is_retryable());
        assert!(Error::Api {
            status: 503,
            body: String::new()
        }
        .is_retryable());
        assert!(Error::Api {
            status: 429,
            body: String::new()
        }
        .is_retryable());
        assert!(!Error::Api {
            status: 400,
            body: String::new()
        }
        .is_retryable());
        assert!(!Error::Validation("empty".to_string()).is_retryable());
        assert!(!Error::Decode("bad".to_string()).is_retryable());
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
