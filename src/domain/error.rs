use std::path::PathBuf;
use thiserror::Error;

/// Domain-level errors for fixture and keyring operations
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Temporary resource failure at {}: {source}", .path.display())]
    TempResource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Pipeline stage '{stage}' failed: {source:#}")]
    PipelineStage {
        stage: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Client context has already been configured")]
    PipelineReused,

    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    #[error("Failed to write keyring {}: {source}", .path.display())]
    Serialization {
        path: PathBuf,
        #[source]
        source: SerializationError,
    },

    #[error("Secure random source failed: {0}")]
    RandomSource(#[from] rand::Error),

    #[error("Invalid keyring: {reason}")]
    InvalidKeyring {
        reason: String,
    },

    #[error("GPG invocation failed: {gpg_error}")]
    GpgTool {
        gpg_error: String,
    },
}

/// Distinguishes filesystem failures from packet encoding failures while
/// writing a keyring
#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("encoding error: {0}")]
    Encoding(String),
}

impl DomainError {
    pub(crate) fn temp_resource(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::TempResource {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid_keyring(reason: impl Into<String>) -> Self {
        Self::InvalidKeyring {
            reason: reason.into(),
        }
    }

    /// Name of the pipeline stage that failed, if this is a stage error
    pub fn failed_stage(&self) -> Option<&str> {
        match self {
            Self::PipelineStage { stage, .. } => Some(stage),
            _ => None,
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_error_names_stage_and_cause() {
        let err = DomainError::PipelineStage {
            stage: "config".to_string(),
            source: anyhow::anyhow!("bad json"),
        };

        assert_eq!(err.failed_stage(), Some("config"));
        let message = err.to_string();
        assert!(message.contains("'config'"));
        assert!(message.contains("bad json"));
    }

    #[test]
    fn test_serialization_error_kinds() {
        let io = SerializationError::from(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert!(matches!(io, SerializationError::Io(_)));

        let err = DomainError::Serialization {
            path: PathBuf::from("/tmp/pubring.gpg"),
            source: SerializationError::Encoding("user id too long".to_string()),
        };
        assert!(err.to_string().contains("pubring.gpg"));
        assert!(err.failed_stage().is_none());
    }
}
