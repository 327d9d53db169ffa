use thiserror::Error;

/// Errors raised on the control path. The audio path never returns these.
#[derive(Debug, Error)]
pub enum VcfError {
    #[error("unknown parameter '{0}'")]
    UnknownParameter(String),

    #[error("unsupported patch version {found} (expected at most {supported})")]
    UnsupportedPatchVersion { found: i32, supported: i32 },

    #[error("invalid sample rate {0}")]
    InvalidSampleRate(f32),

    #[error("patch serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type VcfResult<T> = Result<T, VcfError>;
