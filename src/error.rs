//! Error types for pipelined HTTP calls.
//!
//! Errors fall into two groups. Construction, mutator and cancellation errors
//! end a call immediately. Transport and decode errors are retried by the
//! engine until the attempt budget runs out, and only the last one is returned.

use http::StatusCode;
use std::fmt;

/// Boxed error used to carry an underlying parser failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Body formats understood by the structured decoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// `serde_json`
    Json,
    /// `serde_yaml`
    Yaml,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Json => f.write_str("json"),
            Format::Yaml => f.write_str("yaml"),
        }
    }
}

/// The main error type for pipelined HTTP calls.
///
/// # Examples
///
/// ```no_run
/// use fetchline::{execute, CallConfig, Context, Error, JsonDecoder};
///
/// # async fn example() -> Result<(), Error> {
/// let config = CallConfig::new("https://api.example.com/items", JsonDecoder::<serde_json::Value>::new());
///
/// match execute(&config, &Context::background()).await {
///     Ok(value) => println!("Success: {value}"),
///     Err(Error::Deserialization { type_name, raw_body, source, .. }) => {
///         eprintln!("Could not decode {type_name}: {source}");
///         eprintln!("Raw body: {raw_body}");
///     }
///     Err(Error::Status { status, .. }) => eprintln!("Rejected status {status}"),
///     Err(e) => eprintln!("Other error: {e}"),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The request could not be built from the configured method and target,
    /// or the per-attempt client could not be created.
    #[error("Invalid request: {0}")]
    Construction(String),

    /// A request mutator rejected its input (bad proxy address, bad header).
    #[error("Request mutator failed: {0}")]
    Mutator(String),

    /// A network-level error occurred (connection refused, DNS, TLS, timeout).
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response status is not in the decoder's accepted set.
    ///
    /// The body is not read when this happens.
    #[error("Unexpected status {status} (accepted: {})", format_statuses(.accepted))]
    Status {
        /// The status the server answered with
        status: StatusCode,
        /// The statuses the decoder would have read
        accepted: Vec<StatusCode>,
    },

    /// The status was accepted but reading the body failed.
    #[error("Failed to read response body (status {status}): {source}")]
    Body {
        /// The HTTP status code
        status: StatusCode,
        /// The underlying read failure
        #[source]
        source: reqwest::Error,
    },

    /// The body was read but could not be parsed into the target type.
    ///
    /// Carries everything needed to diagnose the mismatch: the parser error,
    /// the Rust type that was requested and the raw body text.
    #[error("Failed to decode {format} body into {type_name} (status {status}): {source}; body: {raw_body}")]
    Deserialization {
        /// Which structured format was expected
        format: Format,
        /// `std::any::type_name` of the target type
        type_name: &'static str,
        /// The HTTP status code
        status: StatusCode,
        /// The raw body, lossily converted to UTF-8
        raw_body: String,
        /// The parser error
        #[source]
        source: BoxError,
    },

    /// A request payload could not be serialized.
    #[error("Failed to serialize request: {0}")]
    Serialization(String),

    /// The call's context was cancelled.
    #[error("Call cancelled")]
    Cancelled,

    /// The call's context deadline passed.
    #[error("Call deadline exceeded")]
    DeadlineExceeded,
}

fn format_statuses(statuses: &[StatusCode]) -> String {
    statuses
        .iter()
        .map(|s| s.as_u16().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl Error {
    /// Returns `true` for the failures the engine retries.
    ///
    /// Transport failures and decode failures (status rejection, body read,
    /// parse) are retryable. Everything else ends the call.
    ///
    /// # Examples
    ///
    /// ```
    /// use fetchline::Error;
    /// use http::StatusCode;
    ///
    /// let err = Error::Status {
    ///     status: StatusCode::INTERNAL_SERVER_ERROR,
    ///     accepted: vec![StatusCode::OK],
    /// };
    /// assert!(err.is_retryable());
    ///
    /// let err = Error::Mutator("bad proxy".to_string());
    /// assert!(!err.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport(_) => true,
            Error::Status { .. } => true,
            Error::Body { .. } => true,
            Error::Deserialization { .. } => true,
            Error::Construction(_) => false,
            Error::Mutator(_) => false,
            Error::Serialization(_) => false,
            Error::Cancelled => false,
            Error::DeadlineExceeded => false,
        }
    }

    /// Returns `true` if the error came from the call's context.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Error::Cancelled | Error::DeadlineExceeded)
    }

    /// Returns the HTTP status code if this error has one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Status { status, .. } => Some(*status),
            Error::Body { status, .. } => Some(*status),
            Error::Deserialization { status, .. } => Some(*status),
            Error::Transport(e) => e.status(),
            _ => None,
        }
    }

    /// Returns the raw response body if this error has one.
    pub fn raw_body(&self) -> Option<&str> {
        match self {
            Error::Deserialization { raw_body, .. } => Some(raw_body),
            _ => None,
        }
    }
}

/// A specialized `Result` type for pipelined HTTP calls.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_message_lists_accepted() {
        let err = Error::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            accepted: vec![StatusCode::OK, StatusCode::NOT_FOUND],
        };
        assert_eq!(
            err.to_string(),
            "Unexpected status 500 Internal Server Error (accepted: 200, 404)"
        );
        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[test]
    fn test_retry_classification() {
        assert!(!Error::Construction("bad".into()).is_retryable());
        assert!(!Error::Cancelled.is_retryable());
        assert!(Error::DeadlineExceeded.is_cancellation());

        let parse = serde_json::from_str::<u32>("nope").unwrap_err();
        let err = Error::Deserialization {
            format: Format::Json,
            type_name: "u32",
            status: StatusCode::OK,
            raw_body: "nope".into(),
            source: Box::new(parse),
        };
        assert!(err.is_retryable());
        assert_eq!(err.raw_body(), Some("nope"));
        assert!(err.to_string().contains("into u32"));
    }
}
