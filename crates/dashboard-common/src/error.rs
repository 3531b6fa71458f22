/// Error types shared across the dashboard crates.
///
/// `ApiError` covers failures reported by (or on the way to) the backend.
/// `ValidationError` covers input rejected before any request is sent.
/// Application crates wrap both via `#[from]`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("backend returned error: status={status} message={message}")]
    Upstream { status: u16, message: String },

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

impl ApiError {
    /// The message to show the user: the server-provided one when there is
    /// one, otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Upstream { message, .. } if !message.trim().is_empty() => message.clone(),
            ApiError::NotFound { kind, .. } => format!("{kind} not found"),
            _ => fallback.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("unknown category: {0}")]
    UnknownCategory(String),

    #[error("unknown language: {0}")]
    UnknownLanguage(String),

    #[error("unknown severity: {0}")]
    UnknownSeverity(String),
}

pub type ApiResult<T> = Result<T, ApiError>;
