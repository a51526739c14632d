/// Reporter Error Types
#[derive(Debug, thiserror::Error)]
pub enum ReporterError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A repository record did not yield both a project/workspace key and a slug
    #[error(
        "Could not resolve repository identity (tried {}): {record}",
        .strategies.join(", ")
    )]
    Identity {
        strategies: Vec<&'static str>,
        record: String,
    },

    /// Non-2xx response from Bitbucket
    #[error("Bitbucket request to {url} failed with status {status}: {body}")]
    Transport {
        url: String,
        status: u16,
        body: String,
    },

    /// Network errors
    #[error("Network error: {0}")]
    Network(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),
}

impl ReporterError {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        ReporterError::Config(msg.into())
    }

    pub fn network<S: Into<String>>(msg: S) -> Self {
        ReporterError::Network(msg.into())
    }

    pub fn validation<S: Into<String>>(msg: S) -> Self {
        ReporterError::Validation(msg.into())
    }

    pub fn identity<S: Into<String>>(strategies: Vec<&'static str>, record: S) -> Self {
        ReporterError::Identity {
            strategies,
            record: record.into(),
        }
    }

    pub fn transport<S: Into<String>>(url: S, status: u16, body: String) -> Self {
        ReporterError::Transport {
            url: url.into(),
            status,
            body,
        }
    }

    /// HTTP status of a failed request, if the error came from a response
    pub fn status(&self) -> Option<u16> {
        match self {
            ReporterError::Transport { status, .. } => Some(*status),
            ReporterError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether a Server API 2.0 request failing with this error may be retried
    /// against the API 1.0 endpoints.
    pub fn is_fallback_candidate(&self) -> bool {
        matches!(
            self,
            ReporterError::Transport { .. } | ReporterError::Network(_) | ReporterError::Http(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ReporterError>;
