//! Watches a sync folder for a newer export document.
//!
//! [`ChangePoller`] is the state machine; [`AutoSync`] drives its ticks from
//! a tokio interval.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime};

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::domain::export_path;

use super::import_trigger::{ImportRequest, ImportTrigger};

/// Poller state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PollState {
    #[default]
    Idle,
    Watching {
        folder: PathBuf,
        /// Modification time of the last export that fired an import.
        last_seen: Option<SystemTime>,
    },
}

/// Owned poll state plus the trigger it fires.
pub struct ChangePoller {
    state: PollState,
    trigger: Box<dyn ImportTrigger>,
}

impl ChangePoller {
    #[must_use]
    pub fn new(trigger: Box<dyn ImportTrigger>) -> Self {
        Self {
            state: PollState::Idle,
            trigger,
        }
    }

    /// Watch `folder`. Any export already present counts as new.
    pub fn start(&mut self, folder: impl Into<PathBuf>) {
        let folder = folder.into();
        tracing::info!(folder = %folder.display(), "Watching sync folder");
        self.state = PollState::Watching {
            folder,
            last_seen: None,
        };
    }

    pub fn stop(&mut self) {
        if let PollState::Watching { folder, .. } = &self.state {
            tracing::info!(folder = %folder.display(), "Stopped watching");
        }
        self.state = PollState::Idle;
    }

    #[must_use]
    pub fn current_folder(&self) -> Option<&Path> {
        match &self.state {
            PollState::Idle => None,
            PollState::Watching { folder, .. } => Some(folder),
        }
    }

    #[must_use]
    pub const fn state(&self) -> &PollState {
        &self.state
    }

    /// Check once for a newer export. Returns whether an import fired.
    ///
    /// Filesystem errors are logged and treated as "nothing new".
    pub fn tick(&mut self) -> bool {
        let PollState::Watching { folder, last_seen } = &mut self.state else {
            return false;
        };

        let export_file = export_path(folder);
        let modified = match std::fs::metadata(&export_file).and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return false,
            Err(e) => {
                tracing::warn!(file = %export_file.display(), error = %e, "Failed to stat export");
                return false;
            }
        };

        if last_seen.is_some_and(|seen| modified <= seen) {
            return false;
        }
        *last_seen = Some(modified);

        tracing::info!(file = %export_file.display(), "Newer export detected");
        self.trigger.trigger(ImportRequest {
            folder: folder.clone(),
            export_file,
            detected_at: Utc::now(),
        });
        true
    }
}

/// Runs a [`ChangePoller`] on a fixed interval.
///
/// `start` must be called from within a tokio runtime.
pub struct AutoSync {
    poller: Arc<Mutex<ChangePoller>>,
    interval: Duration,
    task: Option<JoinHandle<()>>,
}

impl AutoSync {
    /// Zero intervals are raised to one millisecond.
    #[must_use]
    pub fn new(poller: ChangePoller, interval: Duration) -> Self {
        Self {
            poller: Arc::new(Mutex::new(poller)),
            interval: interval.max(Duration::from_millis(1)),
            task: None,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ChangePoller> {
        self.poller.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start watching `folder`, replacing any previous watch.
    pub fn start(&mut self, folder: impl Into<PathBuf>) {
        self.stop();
        self.lock().start(folder);

        let poller = Arc::clone(&self.poller);
        let period = self.interval;
        self.task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                poller.lock().unwrap_or_else(PoisonError::into_inner).tick();
            }
        }));
    }

    /// Stop the timer and reset the poller. No tick fires after this returns.
    pub fn stop(&mut self) {
        let mut poller = self.poller.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = self.task.take() {
            task.abort();
        }
        poller.stop();
    }

    #[must_use]
    pub fn current_folder(&self) -> Option<PathBuf> {
        self.lock().current_folder().map(Path::to_path_buf)
    }

    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }
}

impl Drop for AutoSync {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::QueueTrigger;
    use std::fs::{self, File};
    use tempfile::tempdir;

    fn set_mtime(path: &Path, time: SystemTime) {
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(time)
            .unwrap();
    }

    fn write_export(folder: &Path, time: SystemTime) -> PathBuf {
        let file = export_path(folder);
        fs::write(&file, "{}").unwrap();
        set_mtime(&file, time);
        file
    }

    #[test]
    fn test_idle_tick_is_noop() {
        let (trigger, mut rx) = QueueTrigger::channel();
        let mut poller = ChangePoller::new(Box::new(trigger));
        assert!(!poller.tick());
        assert!(rx.try_recv().is_err());
        assert_eq!(poller.current_folder(), None);
    }

    #[test]
    fn test_missing_export_is_noop() {
        let dir = tempdir().unwrap();
        let (trigger, mut rx) = QueueTrigger::channel();
        let mut poller = ChangePoller::new(Box::new(trigger));
        poller.start(dir.path());

        assert!(!poller.tick());
        assert!(rx.try_recv().is_err());
        assert_eq!(poller.current_folder(), Some(dir.path()));
    }

    #[test]
    fn test_fires_once_per_newer_mtime() {
        let dir = tempdir().unwrap();
        let base = SystemTime::now() - Duration::from_secs(60);
        let file = write_export(dir.path(), base);

        let (trigger, mut rx) = QueueTrigger::channel();
        let mut poller = ChangePoller::new(Box::new(trigger));
        poller.start(dir.path());

        assert!(poller.tick());
        assert!(!poller.tick());
        let request = rx.try_recv().unwrap();
        assert_eq!(request.export_file, file);
        assert_eq!(request.folder, dir.path());
        assert!(rx.try_recv().is_err());

        set_mtime(&file, base - Duration::from_secs(10));
        assert!(!poller.tick());

        set_mtime(&file, base + Duration::from_secs(10));
        assert!(poller.tick());
        assert!(!poller.tick());
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_stop_resets_state() {
        let dir = tempdir().unwrap();
        write_export(dir.path(), SystemTime::now());

        let (trigger, mut rx) = QueueTrigger::channel();
        let mut poller = ChangePoller::new(Box::new(trigger));
        poller.start(dir.path());
        assert!(poller.tick());
        poller.stop();

        assert_eq!(poller.state(), &PollState::Idle);
        assert!(!poller.tick());

        // Restarting forgets the last-seen time.
        poller.start(dir.path());
        assert!(poller.tick());
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_unreadable_folder_keeps_watching() {
        let dir = tempdir().unwrap();
        // A regular file where the folder should be fails the stat with
        // something other than NotFound.
        let folder = dir.path().join("part_step");
        fs::write(&folder, "not a folder").unwrap();

        let (trigger, mut rx) = QueueTrigger::channel();
        let mut poller = ChangePoller::new(Box::new(trigger));
        poller.start(&folder);

        assert!(!poller.tick());
        assert!(!poller.tick());
        assert!(rx.try_recv().is_err());
        assert_eq!(
            poller.state(),
            &PollState::Watching {
                folder: folder.clone(),
                last_seen: None,
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_sync_recovers_after_stat_error() {
        let dir = tempdir().unwrap();
        let folder = dir.path().join("part_step");
        fs::write(&folder, "not a folder").unwrap();

        let (trigger, mut rx) = QueueTrigger::channel();
        let mut auto = AutoSync::new(ChangePoller::new(Box::new(trigger)), Duration::from_millis(1000));
        auto.start(&folder);

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(auto.current_folder(), Some(folder.clone()));

        fs::remove_file(&folder).unwrap();
        fs::create_dir(&folder).unwrap();
        let file = write_export(&folder, SystemTime::now());

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(rx.try_recv().unwrap().export_file, file);
        assert!(rx.try_recv().is_err());

        auto.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_sync_picks_up_updates() {
        let dir = tempdir().unwrap();
        let base = SystemTime::now() - Duration::from_secs(60);
        let file = write_export(dir.path(), base);

        let (trigger, mut rx) = QueueTrigger::channel();
        let mut auto = AutoSync::new(ChangePoller::new(Box::new(trigger)), Duration::from_millis(1000));
        auto.start(dir.path());

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(rx.try_recv().is_ok());

        set_mtime(&file, base + Duration::from_secs(5));
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());

        auto.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_imports_after_stop() {
        let dir = tempdir().unwrap();
        let base = SystemTime::now() - Duration::from_secs(60);
        let file = write_export(dir.path(), base);

        let (trigger, mut rx) = QueueTrigger::channel();
        let mut auto = AutoSync::new(ChangePoller::new(Box::new(trigger)), Duration::from_millis(1000));
        auto.start(dir.path());
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(rx.try_recv().is_ok());

        auto.stop();
        assert_eq!(auto.current_folder(), None);

        set_mtime(&file, base + Duration::from_secs(5));
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
    }
}
