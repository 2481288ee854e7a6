use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response format: missing {0}")]
    MissingField(&'static str),

    #[error("Not authorized: no token at {}. Run 'memvault login' first.", .0.display())]
    NotAuthorized(PathBuf),

    #[error("Authorization was denied: {0}")]
    AuthorizationDenied(String),

    #[error("Invalid client secrets: {0}")]
    Secrets(String),
}
