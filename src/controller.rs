use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::{
    cli::Action,
    config::{DEFAULT_CATEGORY, Layout, Settings},
    error::{Result, WpcError},
    history::History,
    lock::LockMarker,
    pool::{self, PoolFilter},
    setter::Setter,
    store::{StateKey, StateStore},
};

/// Runs one action against the state directory and reports lines for stdout.
pub struct Controller<S, W> {
    store: S,
    setter: W,
    history: History,
    lock: LockMarker,
    pool: PathBuf,
    avoid_repeat: bool,
}

impl<S: StateStore, W: Setter> Controller<S, W> {
    pub fn new(layout: &Layout, settings: &Settings, store: S, setter: W) -> Self {
        Self {
            store,
            setter,
            history: History::new(&layout.history),
            lock: LockMarker::new(&layout.lock),
            pool: settings.pool_dir(layout),
            avoid_repeat: settings.avoid_repeat,
        }
    }

    pub fn run(&mut self, action: &Action) -> Result<Vec<String>> {
        match action {
            Action::Lock => self.lock_wallpaper(),
            Action::Unlock => self.unlock_wallpaper(),
            Action::Clear => self.clear_filters(),
            Action::Category(value) => self.selector(StateKey::Category, value.as_deref()),
            Action::Resolution(value) => self.selector(StateKey::Resolution, value.as_deref()),
            Action::DumpCache => self.history.entries(),
            Action::FlushCache => self.flush(),
            Action::Previous => self.previous(),
            Action::Rotate => self.rotate(),
        }
    }

    fn lock_wallpaper(&self) -> Result<Vec<String>> {
        if self.lock.lock()? {
            info!("Locked wallpaper");
        }
        Ok(vec!["wallpaper locked".into()])
    }

    fn unlock_wallpaper(&self) -> Result<Vec<String>> {
        self.lock.unlock()?;
        info!("Unlocked wallpaper");
        Ok(vec!["wallpaper unlocked".into()])
    }

    /// Refuse wallpaper changes while the marker exists.
    fn ensure_unlocked(&self) -> Result<()> {
        let locked = self.lock.is_locked()?;
        if locked {
            info!("Change refused, {} present", self.lock.path().display());
            return Err(WpcError::Locked);
        }
        Ok(())
    }

    fn selector(&mut self, key: StateKey, value: Option<&str>) -> Result<Vec<String>> {
        let Some(value) = value else {
            let active = self.store.get(key)?;
            return Ok(vec![active.unwrap_or_else(|| DEFAULT_CATEGORY.into())]);
        };

        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case(DEFAULT_CATEGORY) {
            self.store.clear(key)?;
            info!("Reset {} filter", key.name());
            return Ok(vec![format!("{}: {}", key.name(), DEFAULT_CATEGORY)]);
        }

        self.store.set(key, value)?;
        info!("Set {} filter to {}", key.name(), value);
        Ok(vec![format!("{}: {}", key.name(), value)])
    }

    fn clear_filters(&mut self) -> Result<Vec<String>> {
        self.store.clear(StateKey::Category)?;
        self.store.clear(StateKey::Resolution)?;
        info!("Cleared category and resolution filters");
        Ok(vec!["category and resolution cleared".into()])
    }

    fn flush(&self) -> Result<Vec<String>> {
        self.history.flush()?;
        info!("Flushed {}", self.history.path().display());
        Ok(Vec::new())
    }

    fn previous(&mut self) -> Result<Vec<String>> {
        self.ensure_unlocked()?;

        let current = self.store.get(StateKey::Current)?;
        let previous = self
            .history
            .last_except(current.as_deref())?
            .ok_or(WpcError::EmptyHistory)?;
        self.store.set(StateKey::Current, &previous)?;
        self.apply(Path::new(&previous))?;

        Ok(vec![previous])
    }

    fn rotate(&mut self) -> Result<Vec<String>> {
        self.ensure_unlocked()?;

        let filter = PoolFilter::new(
            self.store.get(StateKey::Category)?,
            self.store.get(StateKey::Resolution)?,
        );
        let candidates = pool::scan(&self.pool, &filter);

        let current = if self.avoid_repeat {
            self.store.get(StateKey::Current)?.map(PathBuf::from)
        } else {
            None
        };
        let chosen = pool::choose(&candidates, current.as_deref())
            .cloned()
            .ok_or_else(|| WpcError::NoMatch {
                pool: self.pool.clone(),
                category: filter.category_label().to_string(),
                resolution: filter.resolution_label().to_string(),
            })?;

        let entry = chosen.to_string_lossy().into_owned();
        self.store.set(StateKey::Current, &entry)?;
        self.history.append(&entry)?;
        self.apply(&chosen)?;

        Ok(vec![entry])
    }

    fn apply(&self, wallpaper: &Path) -> Result<()> {
        match self.setter.apply(wallpaper) {
            Ok(()) => {
                info!("Wallpaper set to {}", wallpaper.display());
                Ok(())
            }
            Err(err) => {
                warn!("Setter failed for {}: {}", wallpaper.display(), err);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FileStore;
    use std::{cell::RefCell, fs};
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingSetter {
        applied: RefCell<Vec<PathBuf>>,
        fail: bool,
    }

    impl Setter for RecordingSetter {
        fn apply(&self, wallpaper: &Path) -> Result<()> {
            self.applied.borrow_mut().push(wallpaper.to_path_buf());
            if self.fail {
                return Err(WpcError::SetterStatus {
                    program: "fake".into(),
                    status: "exit status: 1".into(),
                });
            }
            Ok(())
        }
    }

    struct Fixture {
        _dir: TempDir,
        layout: Layout,
        setter: RecordingSetter,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let layout = Layout::under_home(dir.path());
            fs::create_dir_all(&layout.wallpapers).unwrap();
            Self {
                _dir: dir,
                layout,
                setter: RecordingSetter::default(),
            }
        }

        fn image(&self, relative: &str) -> PathBuf {
            let path = self.layout.wallpapers.join(relative);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, b"img").unwrap();
            path
        }

        fn run(&self, action: Action) -> Result<Vec<String>> {
            let settings = Settings::default();
            let mut controller = Controller::new(
                &self.layout,
                &settings,
                FileStore::new(&self.layout),
                &self.setter,
            );
            controller.run(&action)
        }

        fn read(&self, path: &Path) -> Option<String> {
            fs::read_to_string(path).ok()
        }

        fn history(&self) -> Vec<String> {
            History::new(&self.layout.history).entries().unwrap()
        }
    }

    #[test]
    fn lock_twice_then_unlock_twice() {
        let fx = Fixture::new();
        fx.run(Action::Lock).unwrap();
        fx.run(Action::Lock).unwrap();
        assert!(fx.layout.lock.exists());

        fx.run(Action::Unlock).unwrap();
        fx.run(Action::Unlock).unwrap();
        assert!(!fx.layout.lock.exists());
    }

    #[test]
    fn locked_rotate_changes_nothing() {
        let fx = Fixture::new();
        fx.image("a.jpg");
        fs::write(&fx.layout.current, "/old.jpg\n").unwrap();
        fs::write(&fx.layout.history, "/old.jpg\n").unwrap();
        fx.run(Action::Lock).unwrap();

        let err = fx.run(Action::Rotate).unwrap_err();
        assert!(matches!(err, WpcError::Locked));
        assert_eq!(err.exit_code(), 1);
        assert_eq!(fx.read(&fx.layout.current).as_deref(), Some("/old.jpg\n"));
        assert_eq!(fx.history(), vec!["/old.jpg"]);
        assert!(fx.setter.applied.borrow().is_empty());
    }

    #[test]
    fn locked_previous_changes_nothing() {
        let fx = Fixture::new();
        fs::write(&fx.layout.history, "/a.jpg\n/b.jpg\n").unwrap();
        fx.run(Action::Lock).unwrap();

        assert!(matches!(fx.run(Action::Previous), Err(WpcError::Locked)));
        assert!(!fx.layout.current.exists());
        assert!(fx.setter.applied.borrow().is_empty());
    }

    #[test]
    fn category_then_rotate_records_one_entry() {
        let fx = Fixture::new();
        let a = fx.image("nature/a.jpg");
        let b = fx.image("nature/b.jpg");
        fx.image("city/c.jpg");

        fx.run(Action::Category(Some("nature".into()))).unwrap();
        let shown = fx.run(Action::Rotate).unwrap();

        let chosen = PathBuf::from(&shown[0]);
        assert!(chosen == a || chosen == b);
        let current = fx.read(&fx.layout.current).unwrap();
        assert_eq!(current.trim(), shown[0]);
        assert_eq!(fx.history(), shown);
        assert_eq!(*fx.setter.applied.borrow(), vec![chosen]);
    }

    #[test]
    fn category_without_value_reports_active_filter() {
        let fx = Fixture::new();
        assert_eq!(fx.run(Action::Category(None)).unwrap(), vec!["all"]);
        fx.run(Action::Resolution(Some("1920x1080".into()))).unwrap();
        assert_eq!(
            fx.run(Action::Resolution(None)).unwrap(),
            vec!["1920x1080"]
        );
    }

    #[test]
    fn setting_all_removes_selector() {
        let fx = Fixture::new();
        fx.run(Action::Category(Some("nature".into()))).unwrap();
        fx.run(Action::Category(Some("all".into()))).unwrap();
        assert!(!fx.layout.category.exists());
    }

    #[test]
    fn clear_restores_full_pool() {
        let fx = Fixture::new();
        let only = fx.image("city/c.jpg");
        fx.run(Action::Category(Some("nature".into()))).unwrap();
        fx.run(Action::Resolution(Some("800x600".into()))).unwrap();

        assert!(matches!(fx.run(Action::Rotate), Err(WpcError::NoMatch { .. })));

        fx.run(Action::Clear).unwrap();
        assert!(!fx.layout.category.exists());
        assert!(!fx.layout.resolution.exists());
        assert_eq!(
            fx.run(Action::Rotate).unwrap(),
            vec![only.to_string_lossy().into_owned()]
        );
    }

    #[test]
    fn no_match_leaves_state_untouched() {
        let fx = Fixture::new();
        let err = fx.run(Action::Rotate).unwrap_err();
        assert_eq!(err.exit_code(), 5);
        assert!(!fx.layout.current.exists());
        assert!(!fx.layout.history.exists());
        assert!(fx.setter.applied.borrow().is_empty());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn non_utf8_pool_entry_is_never_recorded() {
        use std::{ffi::OsStr, os::unix::ffi::OsStrExt};

        let fx = Fixture::new();
        let bad = fx.layout.wallpapers.join(OsStr::from_bytes(b"caf\xE9.jpg"));
        fs::write(&bad, b"img").unwrap();

        assert!(matches!(fx.run(Action::Rotate), Err(WpcError::NoMatch { .. })));
        assert!(!fx.layout.history.exists());
        assert!(fx.setter.applied.borrow().is_empty());
    }

    #[test]
    fn flush_then_dump_is_empty() {
        let fx = Fixture::new();
        fx.image("a.jpg");
        fx.run(Action::Rotate).unwrap();
        assert_eq!(fx.run(Action::DumpCache).unwrap().len(), 1);

        fx.run(Action::FlushCache).unwrap();
        assert!(fx.run(Action::DumpCache).unwrap().is_empty());
    }

    #[test]
    fn previous_reapplies_newest_entry_without_appending() {
        let fx = Fixture::new();
        fs::write(&fx.layout.history, "a.jpg\nb.jpg\n").unwrap();

        assert_eq!(fx.run(Action::Previous).unwrap(), vec!["b.jpg"]);
        assert_eq!(*fx.setter.applied.borrow(), vec![PathBuf::from("b.jpg")]);
        assert_eq!(fx.read(&fx.layout.current).as_deref(), Some("b.jpg\n"));
        assert_eq!(fx.history(), vec!["a.jpg", "b.jpg"]);
    }

    #[test]
    fn previous_goes_back_to_the_wallpaper_before_current() {
        let fx = Fixture::new();
        let a = fx.image("a.jpg");
        assert_eq!(
            fx.run(Action::Rotate).unwrap(),
            vec![a.to_string_lossy().into_owned()]
        );
        let b = fx.image("b.jpg");
        assert_eq!(
            fx.run(Action::Rotate).unwrap(),
            vec![b.to_string_lossy().into_owned()]
        );

        let shown = fx.run(Action::Previous).unwrap();
        assert_eq!(shown, vec![a.to_string_lossy().into_owned()]);
        assert_eq!(fx.setter.applied.borrow().last(), Some(&a));
        assert_eq!(
            fx.read(&fx.layout.current).unwrap().trim(),
            a.to_string_lossy()
        );
        assert_eq!(fx.history().len(), 2);
    }

    #[test]
    fn previous_with_only_current_in_history_is_selection_error() {
        let fx = Fixture::new();
        fs::write(&fx.layout.history, "/w/a.jpg\n").unwrap();
        fs::write(&fx.layout.current, "/w/a.jpg\n").unwrap();

        let err = fx.run(Action::Previous).unwrap_err();
        assert!(matches!(err, WpcError::EmptyHistory));
        assert!(fx.setter.applied.borrow().is_empty());
    }

    #[test]
    fn previous_with_empty_history_is_selection_error() {
        let fx = Fixture::new();
        let err = fx.run(Action::Previous).unwrap_err();
        assert!(matches!(err, WpcError::EmptyHistory));
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn rotate_moves_away_from_current() {
        let fx = Fixture::new();
        let a = fx.image("a.jpg");
        let b = fx.image("b.jpg");
        fs::write(&fx.layout.current, format!("{}\n", a.display())).unwrap();

        for _ in 0..5 {
            let shown = fx.run(Action::Rotate).unwrap();
            let expected = if fx.history().len() % 2 == 1 { &b } else { &a };
            assert_eq!(PathBuf::from(&shown[0]), *expected);
        }
    }

    #[test]
    fn setter_failure_keeps_recorded_selection() {
        let mut fx = Fixture::new();
        fx.setter.fail = true;
        let a = fx.image("a.jpg");

        let err = fx.run(Action::Rotate).unwrap_err();
        assert_eq!(err.exit_code(), 3);
        assert_eq!(fx.history(), vec![a.to_string_lossy().into_owned()]);
        assert!(fx.layout.current.exists());
    }
}
