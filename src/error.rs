//! Error type shared by every operation, with its exit status mapping.

use std::{io, path::PathBuf, process::ExitCode};

use thiserror::Error;

/// Everything that can end a run early.
#[derive(Debug, Error)]
pub enum WpcError {
    /// `HOME` is unset, so the state root cannot be located.
    #[error("HOME environment variable not set")]
    MissingHome,
    /// The state root does not exist.
    #[error("wallpaper directory {} does not exist", .0.display())]
    MissingRoot(PathBuf),
    /// `config.toml` could not be parsed.
    #[error("invalid settings in {}: {source}", .path.display())]
    Settings {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// The lock marker is present.
    #[error("currently locked, bailing out")]
    Locked,
    /// No pool entry survives the active filters.
    #[error("no matching wallpaper in {} (category: {category}, resolution: {resolution})", .pool.display())]
    NoMatch {
        pool: PathBuf,
        category: String,
        resolution: String,
    },
    /// `--previous` with nothing to go back to.
    #[error("no previous wallpaper in history")]
    EmptyHistory,
    /// The setter binary could not be started.
    #[error("failed to launch {program}: {source}")]
    SetterSpawn { program: String, source: io::Error },
    /// The setter ran but reported failure.
    #[error("{program} exited with {status}")]
    SetterStatus { program: String, status: String },
    /// The setter command line is empty.
    #[error("no wallpaper setter configured")]
    SetterMissing,
    /// Reading or writing a state file failed.
    #[error("{}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
}

pub type Result<T, E = WpcError> = std::result::Result<T, E>;

impl WpcError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Process exit status for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Locked => 1,
            Self::NoMatch { .. } | Self::EmptyHistory => 5,
            Self::SetterSpawn { .. } | Self::SetterStatus { .. } | Self::SetterMissing => 3,
            Self::MissingHome | Self::MissingRoot(_) | Self::Settings { .. } | Self::Io { .. } => 4,
        }
    }
}

impl From<&WpcError> for ExitCode {
    fn from(err: &WpcError) -> Self {
        ExitCode::from(err.exit_code())
    }
}
