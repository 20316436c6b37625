use crate::types::{CatalogEntry, PartialReason};

pub type Result<T, E = CatalogError> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug, Clone)]
pub enum CatalogError {
    #[error("catalog source unavailable (status {status:?}): {message}")]
    RemoteUnavailable {
        status: Option<u16>,
        message: String,
    },

    #[error("catalog source rejected the credentials")]
    AuthenticationFailed,

    #[error("catalog fetch incomplete after {} entries: {reason}", entries.len())]
    PartialCatalog {
        entries: Vec<CatalogEntry>,
        reason: PartialReason,
    },

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("could not decode catalog response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return CatalogError::Decode(err.to_string());
        }

        CatalogError::RemoteUnavailable {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

impl From<url::ParseError> for CatalogError {
    fn from(err: url::ParseError) -> Self {
        CatalogError::InvalidUrl(err.to_string())
    }
}
