use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("invalid timestamp `{value}`: {reason}")]
    InvalidTimestamp { value: String, reason: String },
    #[error("invalid batch payload: {0}")]
    InvalidBatchPayload(String),
    #[error("invalid upload event: {0}")]
    InvalidEvent(String),
    #[error("record store {} is corrupt: {reason}", .path.display())]
    CorruptStore { path: PathBuf, reason: String },
    #[error("fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },
    #[error("{action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl UploadError {
    pub fn io(action: &'static str, path: &Path, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn fetch(url: &str, reason: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    /// Pipeline stage the error belongs to, used in diagnostics.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::InvalidTimestamp { .. } | Self::InvalidBatchPayload(_) | Self::InvalidEvent(_) => {
                "validate"
            }
            Self::CorruptStore { .. } => "store",
            Self::Fetch { .. } => "fetch",
            Self::Io { .. } => "io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::UploadError;
    use std::path::Path;

    #[test]
    fn io_error_message_names_action_and_path() {
        let err = UploadError::io(
            "failed to write",
            Path::new("/tmp/upload_records.json"),
            std::io::Error::other("disk full"),
        );
        assert_eq!(
            err.to_string(),
            "failed to write /tmp/upload_records.json: disk full"
        );
        assert_eq!(err.stage(), "io");
    }

    #[test]
    fn validation_errors_share_stage() {
        let err = UploadError::InvalidBatchPayload("empty".into());
        assert_eq!(err.stage(), "validate");
        let err = UploadError::InvalidTimestamp {
            value: "x".into(),
            reason: "bad".into(),
        };
        assert_eq!(err.stage(), "validate");
    }
}
