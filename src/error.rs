//! Error classification shared by every data client.
//!
//! Clients never decide HTTP statuses. They report what went wrong as an
//! [`ErrorKind`] and each route maps kinds to responses.

use std::fmt;

/// Coarse failure category reported by a data client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The dependency did not answer within its deadline.
    Timeout,
    /// The dependency could not be reached at all.
    Unreachable,
    /// The dependency answered with a non-success status code.
    UpstreamStatus(u16),
    /// The dependency answered, but the operation failed.
    Dependency,
    /// Nothing the handler knows how to attribute; escapes to the middleware.
    Unclassified,
}

impl ErrorKind {
    /// Whether a handler is expected to map this kind itself.
    pub fn is_classified(self) -> bool {
        !matches!(self, ErrorKind::Unclassified)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Timeout => f.write_str("timeout"),
            ErrorKind::Unreachable => f.write_str("unreachable"),
            ErrorKind::UpstreamStatus(code) => write!(f, "upstream_status_{}", code),
            ErrorKind::Dependency => f.write_str("dependency"),
            ErrorKind::Unclassified => f.write_str("unclassified"),
        }
    }
}

/// Implemented by every client error type.
pub trait Classify: std::error::Error {
    fn kind(&self) -> ErrorKind;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_unclassified_escapes() {
        assert!(ErrorKind::Timeout.is_classified());
        assert!(ErrorKind::UpstreamStatus(503).is_classified());
        assert!(ErrorKind::Dependency.is_classified());
        assert!(!ErrorKind::Unclassified.is_classified());
    }

    #[test]
    fn test_display_is_label_friendly() {
        assert_eq!(ErrorKind::UpstreamStatus(503).to_string(), "upstream_status_503");
        assert_eq!(ErrorKind::Unreachable.to_string(), "unreachable");
    }
}
