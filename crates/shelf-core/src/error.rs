use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShelfError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Ambiguous: {0}")]
    Ambiguous(String),

    #[error("Destination already exists: {}", .0.display())]
    DestinationExists(PathBuf),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Image error: {0}")]
    Image(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ShelfError {
    /// Returns `true` when the error only concerns the document being processed,
    /// so the run should log it and continue with the next one.
    ///
    /// Configuration problems (missing credentials, unreadable config) abort the run.
    pub fn skips_document(&self) -> bool {
        !matches!(self, Self::Config(_))
    }

    /// Returns `true` for the "nothing to do" outcomes that are not failures:
    /// no search results, or an ambiguity the user (or batch mode) declined.
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Ambiguous(_))
    }
}

pub type Result<T> = std::result::Result<T, ShelfError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_aborts_run() {
        let err = ShelfError::Config("TMDB_API_KEY not set".into());
        assert!(!err.skips_document());
        assert!(!err.is_skip());
    }

    #[test]
    fn test_provider_error_skips_document() {
        let err = ShelfError::Provider("TMDB API error 503: service unavailable".into());
        assert!(err.skips_document());
        assert!(!err.is_skip());
    }

    #[test]
    fn test_not_found_is_skip() {
        let err = ShelfError::NotFound("no results for 'Inception'".into());
        assert!(err.skips_document());
        assert!(err.is_skip());
    }

    #[test]
    fn test_destination_exists_message() {
        let err = ShelfError::DestinationExists(PathBuf::from("/vault/Inception (2010).md"));
        assert_eq!(
            err.to_string(),
            "Destination already exists: /vault/Inception (2010).md"
        );
        assert!(!err.is_skip());
    }
}
