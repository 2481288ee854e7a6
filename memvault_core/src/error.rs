use std::path::PathBuf;

use thiserror::Error;

/// Failure of a single backup step.
#[derive(Debug, Error)]
pub enum BackupError {
    #[error("failed to read source file {}", .path.display())]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to find or create folder '{name}'")]
    FolderResolution {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to look up '{name}' in the destination folder")]
    RemoteQuery {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("remote {operation} failed")]
    RemoteWrite {
        operation: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to render document")]
    Render(#[from] serde_json::Error),
}

impl BackupError {
    pub(crate) fn remote_write(operation: &'static str, source: anyhow::Error) -> Self {
        Self::RemoteWrite { operation, source }
    }
}

/// Top-level error of a backup run. The failing step is chained as the source.
#[derive(Debug, Error)]
#[error("backup failed")]
pub struct BackupFailed(#[from] BackupError);

impl BackupFailed {
    #[must_use]
    pub const fn kind(&self) -> &BackupError {
        &self.0
    }
}

/// A source line that could not be decoded. Logged and skipped, never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedRecord {
    /// 1-based line number in the source file
    pub line: usize,
    pub reason: String,
}
