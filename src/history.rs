use std::path::{Path, PathBuf};

use crate::{
    error::Result,
    store::{read_optional, remove_if_exists, write_atomic},
};

/// Newline-separated record of applied wallpapers, oldest first.
#[derive(Debug, Clone)]
pub struct History {
    path: PathBuf,
}

impl History {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> Result<Vec<String>> {
        let text = read_optional(&self.path)?.unwrap_or_default();
        Ok(text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Newest entry that differs from `skip`; the newest entry when `skip` is `None`.
    pub fn last_except(&self, skip: Option<&str>) -> Result<Option<String>> {
        let skip = skip.map(str::trim);
        Ok(self
            .entries()?
            .into_iter()
            .rev()
            .find(|entry| Some(entry.as_str()) != skip))
    }

    pub fn append(&self, entry: &str) -> Result<()> {
        let mut entries = self.entries()?;
        entries.push(entry.trim().to_string());

        let mut contents = entries.join("\n");
        contents.push('\n');
        write_atomic(&self.path, &contents)
    }

    /// Drop every recorded entry.
    pub fn flush(&self) -> Result<()> {
        remove_if_exists(&self.path)
    }
}
