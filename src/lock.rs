use std::{
    fs::OpenOptions,
    io,
    path::{Path, PathBuf},
};

use crate::{
    error::{Result, WpcError},
    store::remove_if_exists,
};

/// Sentinel file whose presence pins the current wallpaper.
#[derive(Debug, Clone)]
pub struct LockMarker {
    path: PathBuf,
}

impl LockMarker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the marker. Returns `false` when it already existed.
    pub fn lock(&self) -> Result<bool> {
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => Ok(false),
            Err(err) => Err(WpcError::io(&self.path, err)),
        }
    }

    pub fn unlock(&self) -> Result<()> {
        remove_if_exists(&self.path)
    }

    pub fn is_locked(&self) -> Result<bool> {
        self.path
            .try_exists()
            .map_err(|err| WpcError::io(&self.path, err))
    }
}
