//! Error kinds shared by every backend call.
//!
//! Each variant carries the reason string shown to the user. Servers report
//! failures as `{"error": "<reason>"}`; [`ApiError::from_status`] classifies
//! such a payload by HTTP status only as far as the session logic needs it
//! (auth vs. missing record vs. everything else).

/// A failed backend call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// Bad credentials, or a missing, invalid or expired token.
    #[error("{0}")]
    Auth(String),
    /// Malformed registration or contact fields.
    #[error("{0}")]
    Validation(String),
    /// The record does not exist (or no longer does).
    #[error("{0}")]
    NotFound(String),
    /// The request never produced a response.
    #[error("{0}")]
    Network(String),
    /// The response could not be understood.
    #[error("{0}")]
    Parse(String),
}

impl ApiError {
    /// Classify a server-reported error reason by status code.
    pub fn from_status(status: u16, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        match status {
            401 | 403 => ApiError::Auth(reason),
            404 => ApiError::NotFound(reason),
            _ => ApiError::Validation(reason),
        }
    }

    pub fn not_authenticated() -> Self {
        ApiError::Auth("Not authenticated".to_string())
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Auth(_))
    }

    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network(_))
    }

    pub fn reason(&self) -> &str {
        match self {
            ApiError::Auth(reason)
            | ApiError::Validation(reason)
            | ApiError::NotFound(reason)
            | ApiError::Network(reason)
            | ApiError::Parse(reason) => reason,
        }
    }

    /// Short machine-readable kind, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Auth(_) => "auth",
            ApiError::Validation(_) => "validation",
            ApiError::NotFound(_) => "not_found",
            ApiError::Network(_) => "network",
            ApiError::Parse(_) => "parse",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(ApiError::from_status(401, "expired").is_auth());
        assert!(ApiError::from_status(403, "nope").is_auth());
        assert_eq!(ApiError::from_status(404, "gone"), ApiError::NotFound("gone".into()));
        assert_eq!(ApiError::from_status(400, "bad"), ApiError::Validation("bad".into()));
        assert_eq!(ApiError::from_status(500, "boom").reason(), "boom");
    }
}
