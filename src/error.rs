use std::path::PathBuf;

use thiserror::Error;

/// Failure taxonomy for the patch pipeline. Every variant aborts the whole
/// run; there is no partial-success mode and no automatic retry.
#[derive(Debug, Error)]
pub enum PatchError {
    /// A required input path does not exist. Checked before any external
    /// process is invoked.
    #[error("input file not found: {}", path.display())]
    MissingInputFile { path: PathBuf },

    /// The image-inspection tool failed to run, or its report did not
    /// contain a recognizable validation-hash line.
    #[error("could not extract validation fingerprint: {reason}")]
    FingerprintUnavailable { reason: String },

    /// The external diff engine exited with failure or could not be spawned.
    #[error("diff engine failed: {reason}")]
    DiffEngineFailure { reason: String },

    /// A header field would be written at the wrong size, e.g. a fingerprint
    /// string that is not exactly 64 hex characters.
    #[error("container format violation: {reason}")]
    FormatViolation { reason: String },

    /// A zero-length target image makes the compression ratio undefined.
    #[error("target image is zero-length; compression ratio is undefined")]
    ZeroLengthTarget,

    /// A filesystem operation failed.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl PatchError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        PatchError::Io {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PatchError>;
