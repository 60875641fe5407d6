use thiserror::Error;

/// Failures surfaced by the weather service layer. Callers branch on the
/// variant and turn it into exactly one user-facing notice.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("{label}: transport failure: {message}")]
    Network { label: String, message: String },
    #[error("{label}: HTTP {status}")]
    Http {
        label: String,
        status: u16,
        body: Option<String>,
    },
    #[error("{label}: malformed payload: {message}")]
    Parse { label: String, message: String },
    #[error("no geocoding result for {city}")]
    NotFound { city: String },
    #[error("unable to resolve current coordinates")]
    Coords,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Http,
    Parse,
    NotFound,
    Coords,
}

pub const MSG_UNEXPECTED: &str = "Unexpected error";

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network { .. } => ErrorKind::Network,
            Self::Http { .. } => ErrorKind::Http,
            Self::Parse { .. } => ErrorKind::Parse,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Coords => ErrorKind::Coords,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[must_use]
pub fn format_service_error(err: &ServiceError) -> String {
    match err {
        ServiceError::Network { .. } => "Network error - check your connection".to_string(),
        ServiceError::Http { status, .. } => format!("Request failed ({status})"),
        ServiceError::Parse { .. } => "Data format error".to_string(),
        ServiceError::NotFound { .. } => "City not found".to_string(),
        ServiceError::Coords => "Unable to get current coordinates".to_string(),
    }
}

/// Like [`format_service_error`], with a generic sentence for anything that
/// is not a [`ServiceError`].
#[must_use]
pub fn format_error(err: &anyhow::Error) -> String {
    err.downcast_ref::<ServiceError>()
        .map_or_else(|| MSG_UNEXPECTED.to_string(), format_service_error)
}
