use std::{
    env, fs, io,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, WpcError};

pub const STATE_DIR: &str = ".wallpapers2";
pub const DEFAULT_CATEGORY: &str = "all";
pub const DEFAULT_SETTER: &[&str] = &["fbsetbg", "-a"];

/// Every state path the tool touches, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Layout {
    pub root: PathBuf,
    pub lock: PathBuf,
    pub history: PathBuf,
    pub category: PathBuf,
    pub resolution: PathBuf,
    pub current: PathBuf,
    pub wallpapers: PathBuf,
    pub log: PathBuf,
    pub settings: PathBuf,
}

impl Layout {
    /// Resolve ~/.wallpapers2 from the HOME environment variable.
    pub fn from_env() -> Result<Self> {
        let home = env::var_os("HOME").ok_or(WpcError::MissingHome)?;
        Ok(Self::under_home(Path::new(&home)))
    }

    pub fn under_home(home: &Path) -> Self {
        Self::at(home.join(STATE_DIR))
    }

    pub fn at(root: PathBuf) -> Self {
        Self {
            lock: root.join("lock"),
            history: root.join("history.db"),
            category: root.join("category"),
            resolution: root.join("resolution"),
            current: root.join("current"),
            wallpapers: root.join("Wallpapers"),
            log: root.join("log"),
            settings: root.join("config.toml"),
            root,
        }
    }

    /// Fail early when the state directory has not been set up.
    pub fn ensure_root(&self) -> Result<()> {
        match fs::metadata(&self.root) {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(WpcError::MissingRoot(self.root.clone())),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(WpcError::MissingRoot(self.root.clone()))
            }
            Err(err) => Err(WpcError::io(&self.root, err)),
        }
    }
}

/// Optional overrides read from config.toml inside the state directory.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Settings {
    /// Setter command line; the wallpaper path is appended as the last argument.
    pub setter: Vec<String>,
    /// Pool directory, defaults to <root>/Wallpapers.
    pub pool: Option<PathBuf>,
    /// Skip the wallpaper on screen when another candidate exists.
    pub avoid_repeat: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            setter: DEFAULT_SETTER.iter().map(|arg| arg.to_string()).collect(),
            pool: None,
            avoid_repeat: true,
        }
    }
}

impl Settings {
    /// Read settings for a layout, falling back to defaults when the file is absent.
    pub fn load(layout: &Layout) -> Result<Self> {
        let data = match fs::read_to_string(&layout.settings) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("No settings at {}, using defaults", layout.settings.display());
                return Ok(Self::default());
            }
            Err(err) => return Err(WpcError::io(&layout.settings, err)),
        };

        toml::from_str(&data).map_err(|source| WpcError::Settings {
            path: layout.settings.clone(),
            source,
        })
    }

    /// Pool directory with ~ and $VAR prefixes expanded.
    pub fn pool_dir(&self, layout: &Layout) -> PathBuf {
        match &self.pool {
            Some(path) => normalize_user_path(path, &layout.root),
            None => layout.wallpapers.clone(),
        }
    }
}

/// Expand a leading ~ or environment variable and anchor relative paths at `base`.
pub fn normalize_user_path(path: &Path, base: &Path) -> PathBuf {
    let raw = path
        .to_str()
        .map(expand_leading_tokens)
        .unwrap_or_else(|| path.to_path_buf());

    if raw.is_absolute() {
        raw
    } else {
        base.join(raw)
    }
}

fn expand_leading_tokens(value: &str) -> PathBuf {
    let expanded = expand_home_prefix(value)
        .or_else(|| expand_env_prefix(value))
        .unwrap_or_else(|| value.to_string());
    PathBuf::from(expanded)
}

fn expand_home_prefix(value: &str) -> Option<String> {
    if value == "~" {
        return env::var("HOME").ok();
    }

    let rest = value.strip_prefix("~/")?;
    let home = env::var("HOME").ok()?;
    Some(PathBuf::from(home).join(rest).to_string_lossy().into_owned())
}

fn expand_env_prefix(value: &str) -> Option<String> {
    if let Some(rest) = value.strip_prefix("${") {
        let end = rest.find('}')?;
        let var = &rest[..end];
        if var.is_empty() {
            return None;
        }
        let val = env::var(var).ok()?;
        return Some(format!("{}{}", val, &rest[end + 1..]));
    }

    let rest = value.strip_prefix('$')?;
    let len = rest
        .find(|ch: char| ch != '_' && !ch.is_ascii_alphanumeric())
        .unwrap_or(rest.len());
    if len == 0 {
        return None;
    }

    let (var, remainder) = rest.split_at(len);
    let val = env::var(var).ok()?;
    Some(format!("{}{}", val, remainder))
}
