use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrateError {
    #[error("configuration file {} not found", .0.display())]
    ConfigMissing(PathBuf),

    #[error("failed to log in to the source tracker")]
    SourceLogin,

    #[error("unrecognized legacy ticket status '{0}'")]
    UnknownStatus(String),

    #[error("cache version mismatch: found {found}, expected {expected}")]
    CacheVersion { found: u32, expected: u32 },

    #[error("malformed source tracker response: {0}")]
    Protocol(String),

    #[error("target api error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("cannot build session for acting user: {0}")]
    Session(String),

    #[error("snapshot is missing {0}")]
    SnapshotGap(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

impl MigrateError {
    /// Process exit code for this failure. The config-missing and
    /// source-login codes are part of the tool's contract; everything
    /// else is a generic fatal error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConfigMissing(_) => 1,
            Self::SourceLogin => 2,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, MigrateError>;
