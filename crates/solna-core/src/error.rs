#![forbid(unsafe_code)]

use std::time::Duration;

/// Errors produced by the Solna crates.
///
/// Local failures (`Config`, `Credential`, `Signing` and the XML/crypto
/// variants) always happen before any network activity. `Transport` and
/// `Protocol` keep whatever the remote side sent back so callers can
/// inspect it. A SOAP fault returned by the service is not an error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("credential error: {0}")]
    Credential(String),

    #[error("signing error: {0}")]
    Signing(String),

    #[error("XML parsing error: {0}")]
    XmlParse(String),

    #[error("invalid XML structure: {0}")]
    XmlStructure(String),

    #[error("canonicalization error: {0}")]
    Canonicalization(String),

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("cryptographic error: {0}")]
    Crypto(String),

    #[error("base64 decode error: {0}")]
    Base64(String),

    #[error("certificate error: {0}")]
    Certificate(String),

    #[error("transport timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error{}: {message}", http_status_suffix(.status))]
    Transport {
        message: String,
        status: Option<u16>,
        body: Option<Vec<u8>>,
    },

    #[error("malformed response (HTTP {status}): {reason}")]
    Protocol {
        reason: String,
        status: u16,
        body: Vec<u8>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// HTTP status attached to a transport or protocol failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            Self::Protocol { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw response body attached to a transport or protocol failure.
    pub fn raw_body(&self) -> Option<&[u8]> {
        match self {
            Self::Transport { body, .. } => body.as_deref(),
            Self::Protocol { body, .. } => Some(body),
            _ => None,
        }
    }

    /// True for failures that happened before anything was sent.
    pub fn is_local(&self) -> bool {
        !matches!(
            self,
            Self::Timeout(_) | Self::Transport { .. } | Self::Protocol { .. }
        )
    }
}

fn http_status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_keeps_diagnostics() {
        let err = Error::Protocol {
            reason: "unexpected end of input".into(),
            status: 200,
            body: b"<soap:Envelope".to_vec(),
        };
        assert_eq!(err.status(), Some(200));
        assert_eq!(err.raw_body(), Some(&b"<soap:Envelope"[..]));
        assert!(!err.is_local());
        assert_eq!(
            err.to_string(),
            "malformed response (HTTP 200): unexpected end of input"
        );
    }

    #[test]
    fn test_transport_error_display() {
        let with_status = Error::Transport {
            message: "service unavailable".into(),
            status: Some(503),
            body: Some(b"busy".to_vec()),
        };
        assert_eq!(
            with_status.to_string(),
            "transport error (HTTP 503): service unavailable"
        );

        let without_status = Error::Transport {
            message: "connection refused".into(),
            status: None,
            body: None,
        };
        assert_eq!(without_status.to_string(), "transport error: connection refused");
        assert_eq!(without_status.raw_body(), None);
    }

    #[test]
    fn test_local_errors() {
        assert!(Error::Config("merchant id is required".into()).is_local());
        assert!(Error::Signing("SOAP Body not found".into()).is_local());
        assert!(!Error::Timeout(Duration::from_secs(1)).is_local());
    }
}
