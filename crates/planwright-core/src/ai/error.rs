//! Generation failures

use thiserror::Error;

/// Why a call to the text-generation service failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    /// Service unreachable, rejected the request, or rate limited us.
    #[error("{}", upstream_message(.status, .message))]
    Upstream {
        status: Option<u16>,
        message: String,
    },

    /// Service answered, but not with a text block.
    #[error("Unexpected response type: {0}")]
    UnexpectedResponseShape(String),
}

fn upstream_message(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(status) => format!("HTTP {}: {}", status, message),
        None => message.to_string(),
    }
}

impl GenerationError {
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            status: None,
            message: message.into(),
        }
    }

    pub fn upstream_status(status: u16, message: impl Into<String>) -> Self {
        Self::Upstream {
            status: Some(status),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_display_includes_status() {
        let err = GenerationError::upstream_status(529, "overloaded");
        assert_eq!(err.to_string(), "HTTP 529: overloaded");
        assert!(matches!(
            err,
            GenerationError::Upstream {
                status: Some(529),
                ..
            }
        ));
    }

    #[test]
    fn upstream_display_without_status() {
        let err = GenerationError::upstream("Connection failed: refused");
        assert_eq!(err.to_string(), "Connection failed: refused");
    }
}
