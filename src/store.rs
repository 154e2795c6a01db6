//! Key-value access to the single-line state files.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use crate::{
    config::Layout,
    error::{Result, WpcError},
};

/// Named values persisted between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateKey {
    Category,
    Resolution,
    Current,
}

impl StateKey {
    pub fn name(self) -> &'static str {
        match self {
            StateKey::Category => "category",
            StateKey::Resolution => "resolution",
            StateKey::Current => "current",
        }
    }
}

pub trait StateStore {
    fn get(&self, key: StateKey) -> Result<Option<String>>;

    fn set(&mut self, key: StateKey, value: &str) -> Result<()>;

    /// Remove a value; clearing an unset key succeeds.
    fn clear(&mut self, key: StateKey) -> Result<()>;
}

/// Store backed by one plain-text file per key.
#[derive(Debug, Clone)]
pub struct FileStore {
    category: PathBuf,
    resolution: PathBuf,
    current: PathBuf,
}

impl FileStore {
    pub fn new(layout: &Layout) -> Self {
        Self {
            category: layout.category.clone(),
            resolution: layout.resolution.clone(),
            current: layout.current.clone(),
        }
    }

    fn path(&self, key: StateKey) -> &Path {
        match key {
            StateKey::Category => &self.category,
            StateKey::Resolution => &self.resolution,
            StateKey::Current => &self.current,
        }
    }
}

impl StateStore for FileStore {
    fn get(&self, key: StateKey) -> Result<Option<String>> {
        let value = read_optional(self.path(key))?;
        Ok(value
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty()))
    }

    fn set(&mut self, key: StateKey, value: &str) -> Result<()> {
        write_atomic(self.path(key), &format!("{}\n", value.trim()))
    }

    fn clear(&mut self, key: StateKey) -> Result<()> {
        remove_if_exists(self.path(key))
    }
}

/// Read a file, mapping "not found" to `None`.
pub(crate) fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(WpcError::io(path, err)),
    }
}

/// Replace a file's contents through a sibling temp file and rename.
pub(crate) fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    fs::write(&tmp, contents).map_err(|err| WpcError::io(&tmp, err))?;
    fs::rename(&tmp, path).map_err(|err| {
        let _ = fs::remove_file(&tmp);
        WpcError::io(path, err)
    })
}

pub(crate) fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(WpcError::io(path, err)),
    }
}
