use std::path::{Path, PathBuf};

use rand::seq::IndexedRandom;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::DEFAULT_CATEGORY;

const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "bmp", "gif", "webp", "tif", "tiff", "jxl", "avif",
];

/// Active category and resolution selectors. `None` means unfiltered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolFilter {
    pub category: Option<String>,
    pub resolution: Option<String>,
}

impl PoolFilter {
    /// Build a filter from stored selector values, treating "all" as unset.
    pub fn new(category: Option<String>, resolution: Option<String>) -> Self {
        let active = |value: Option<String>| {
            value.filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case(DEFAULT_CATEGORY))
        };
        Self {
            category: active(category),
            resolution: active(resolution),
        }
    }

    pub fn matches(&self, relative: &Path) -> bool {
        let dirs: Vec<&str> = relative
            .parent()
            .map(|parent| parent.iter().filter_map(|c| c.to_str()).collect())
            .unwrap_or_default();

        if let Some(category) = &self.category {
            if !dirs.iter().any(|dir| dir.eq_ignore_ascii_case(category)) {
                return false;
            }
        }

        if let Some(resolution) = &self.resolution {
            let needle = resolution.to_ascii_lowercase();
            let in_dirs = dirs.iter().any(|dir| dir.eq_ignore_ascii_case(resolution));
            let in_stem = relative
                .file_stem()
                .and_then(|stem| stem.to_str())
                .map(|stem| stem.to_ascii_lowercase().contains(&needle))
                .unwrap_or(false);
            if !in_dirs && !in_stem {
                return false;
            }
        }

        true
    }

    pub fn category_label(&self) -> &str {
        self.category.as_deref().unwrap_or(DEFAULT_CATEGORY)
    }

    pub fn resolution_label(&self) -> &str {
        self.resolution.as_deref().unwrap_or(DEFAULT_CATEGORY)
    }
}

/// Walk the pool and return every image accepted by `filter`, sorted.
pub fn scan(pool: &Path, filter: &PoolFilter) -> Vec<PathBuf> {
    let mut found = Vec::new();

    for entry in WalkDir::new(pool).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("Skipping unreadable pool entry: {}", err);
                continue;
            }
        };

        if !entry.file_type().is_file() || !is_image(entry.path()) {
            continue;
        }

        if entry.path().to_str().is_none() {
            warn!("Skipping non UTF-8 path {}", entry.path().display());
            continue;
        }

        let relative = entry.path().strip_prefix(pool).unwrap_or(entry.path());
        if filter.matches(relative) {
            found.push(entry.into_path());
        }
    }

    found.sort();
    debug!("{} candidate(s) in {}", found.len(), pool.display());
    found
}

/// Pick a random candidate, skipping `current` when anything else is available.
pub fn choose<'a>(candidates: &'a [PathBuf], current: Option<&Path>) -> Option<&'a PathBuf> {
    let fresh: Vec<&PathBuf> = candidates
        .iter()
        .filter(|path| Some(path.as_path()) != current)
        .collect();

    let mut rng = rand::rng();
    if fresh.is_empty() {
        candidates.choose(&mut rng)
    } else {
        fresh.choose(&mut rng).copied()
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let lower = ext.to_ascii_lowercase();
            IMAGE_EXTENSIONS.contains(&lower.as_str())
        })
        .unwrap_or(false)
}
