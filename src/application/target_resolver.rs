//! Decides which target file a source file exports to.

use std::path::{Path, PathBuf};

use crate::domain::{AppError, Result};
use crate::infrastructure::SettingsStore;

/// Answer to the "reuse remembered target?" prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReuseChoice {
    #[default]
    Reuse,
    ChooseNew,
}

impl ReuseChoice {
    /// The two options, in display order; the first is the default.
    pub const OPTIONS: [Self; 2] = [Self::Reuse, Self::ChooseNew];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Reuse => "Reuse",
            Self::ChooseNew => "ChooseNew",
        }
    }
}

/// Interactive questions asked while resolving a target.
///
/// `None` from either method means the user cancelled.
pub trait TargetPrompter {
    /// Offer to reuse `remembered`.
    fn choose_reuse(&mut self, remembered: &Path, options: &[ReuseChoice; 2]) -> Option<ReuseChoice>;

    /// Ask for a target file, starting in `start_dir`.
    fn choose_target(&mut self, start_dir: Option<&Path>) -> Option<PathBuf>;
}

/// Resolve the target for `source`, prompting as needed.
///
/// Returns `None` if the user cancelled at any step.
pub fn resolve_target(
    source: &Path,
    store: &SettingsStore,
    prompter: &mut dyn TargetPrompter,
) -> Option<PathBuf> {
    let settings = store.load();

    if let Some(memory) = settings.target_for(source) {
        if memory.last_target.exists() {
            match prompter.choose_reuse(&memory.last_target, &ReuseChoice::OPTIONS)? {
                ReuseChoice::Reuse => return Some(memory.last_target.clone()),
                ReuseChoice::ChooseNew => {}
            }
        } else {
            tracing::info!(
                target = %memory.last_target.display(),
                "Remembered target no longer exists"
            );
        }
    }

    let chosen = prompter.choose_target(settings.last_directory.as_deref())?;

    if let Some(dir) = chosen.parent().filter(|d| !d.as_os_str().is_empty()) {
        if let Err(e) = store.remember_directory(dir) {
            tracing::warn!(error = %e, "Failed to remember target directory");
        }
    }

    Some(chosen)
}

/// Remembered target for `source`, without prompting.
///
/// # Errors
/// Returns `NoRememberedTarget` or `TargetMissing` when there is no usable
/// memory.
pub fn remembered_target(source: &Path, store: &SettingsStore) -> Result<PathBuf> {
    let settings = store.load();
    let memory = settings
        .target_for(source)
        .ok_or_else(|| AppError::NoRememberedTarget {
            source_file: source.display().to_string(),
        })?;

    if !memory.last_target.exists() {
        return Err(AppError::TargetMissing {
            path: memory.last_target.clone(),
        });
    }
    Ok(memory.last_target.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::fs;
    use tempfile::tempdir;

    /// Scripted answers plus a log of what was asked.
    #[derive(Default)]
    struct Script {
        reuse: Option<ReuseChoice>,
        target: Option<PathBuf>,
        offered: Vec<(PathBuf, [ReuseChoice; 2])>,
        browsed_from: Vec<Option<PathBuf>>,
    }

    impl TargetPrompter for Script {
        fn choose_reuse(&mut self, remembered: &Path, options: &[ReuseChoice; 2]) -> Option<ReuseChoice> {
            self.offered.push((remembered.to_path_buf(), *options));
            self.reuse
        }

        fn choose_target(&mut self, start_dir: Option<&Path>) -> Option<PathBuf> {
            self.browsed_from.push(start_dir.map(Path::to_path_buf));
            self.target.clone()
        }
    }

    #[test]
    fn test_no_memory_goes_to_file_chooser() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        let target = dir.path().join("targets").join("part.step");
        let mut script = Script {
            reuse: Some(ReuseChoice::Reuse),
            target: Some(target.clone()),
            ..Default::default()
        };

        let resolved = resolve_target(Path::new("/m/a.3dm"), &store, &mut script);

        assert_eq!(resolved, Some(target));
        assert!(script.offered.is_empty());
        assert_eq!(script.browsed_from, vec![None]);
        assert_eq!(store.load().last_directory, Some(dir.path().join("targets")));
    }

    #[test]
    fn test_existing_memory_offers_reuse_first() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        let target = dir.path().join("part.step");
        fs::write(&target, "").unwrap();
        store.remember_target(Path::new("/m/a.3dm"), &target, Utc::now()).unwrap();

        let mut script = Script {
            reuse: Some(ReuseChoice::default()),
            ..Default::default()
        };
        let resolved = resolve_target(Path::new("/m/a.3dm"), &store, &mut script);

        assert_eq!(resolved, Some(target.clone()));
        assert_eq!(script.offered.len(), 1);
        assert_eq!(script.offered[0].1[0], ReuseChoice::Reuse);
        assert_eq!(script.offered[0].0, target);
        assert!(script.browsed_from.is_empty());
    }

    #[test]
    fn test_choose_new_uses_last_directory() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        let old = dir.path().join("old.step");
        fs::write(&old, "").unwrap();
        store.remember_target(Path::new("/m/a.3dm"), &old, Utc::now()).unwrap();
        store.remember_directory(dir.path()).unwrap();

        let new = dir.path().join("new.step");
        let mut script = Script {
            reuse: Some(ReuseChoice::ChooseNew),
            target: Some(new.clone()),
            ..Default::default()
        };
        let resolved = resolve_target(Path::new("/m/a.3dm"), &store, &mut script);

        assert_eq!(resolved, Some(new));
        assert_eq!(script.browsed_from, vec![Some(dir.path().to_path_buf())]);
    }

    #[test]
    fn test_deleted_target_is_not_reused() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        store
            .remember_target(Path::new("/m/a.3dm"), &dir.path().join("gone.step"), Utc::now())
            .unwrap();

        let mut script = Script {
            reuse: Some(ReuseChoice::Reuse),
            target: None,
            ..Default::default()
        };
        let resolved = resolve_target(Path::new("/m/a.3dm"), &store, &mut script);

        assert_eq!(resolved, None);
        assert!(script.offered.is_empty());
        assert_eq!(script.browsed_from.len(), 1);
    }

    #[test]
    fn test_cancel_at_reuse_prompt() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        let target = dir.path().join("part.step");
        fs::write(&target, "").unwrap();
        store.remember_target(Path::new("/m/a.3dm"), &target, Utc::now()).unwrap();

        let mut script = Script::default();
        assert_eq!(resolve_target(Path::new("/m/a.3dm"), &store, &mut script), None);
        assert!(script.browsed_from.is_empty());
    }

    #[test]
    fn test_remembered_target_errors() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        let source = Path::new("/m/a.3dm");

        assert!(matches!(
            remembered_target(source, &store),
            Err(AppError::NoRememberedTarget { .. })
        ));

        let target = dir.path().join("part.step");
        store.remember_target(source, &target, Utc::now()).unwrap();
        assert!(matches!(
            remembered_target(source, &store),
            Err(AppError::TargetMissing { .. })
        ));

        fs::write(&target, "").unwrap();
        assert_eq!(remembered_target(source, &store).unwrap(), target);
    }
}
