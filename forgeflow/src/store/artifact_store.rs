use super::clock::{Clock, SystemClock};
use crate::core::{validate_artifact_name, Artifact};
use crate::errors::ArtifactError;
use crate::events::{EventSink, NoOpEventSink};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::json;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

// Starts with a dot so it can never collide with a valid artifact name.
const TEMP_PREFIX: &str = ".forgeflow-tmp-";

type Slot = Arc<Mutex<Option<DateTime<Utc>>>>;

/// File-backed artifact store with a retention window.
///
/// Each name has its own lock; writes and age-based deletes of one name are
/// serialized and the last one to complete wins. Content is written to a
/// temporary file in the same directory and renamed into place, so readers
/// see either the previous or the new content in full.
pub struct ArtifactStore {
    root: PathBuf,
    retention: chrono::Duration,
    clock: Arc<dyn Clock>,
    entries: DashMap<String, Slot>,
    events: Arc<dyn EventSink>,
}

impl ArtifactStore {
    /// Opens (creating if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>, retention: Duration) -> Result<Self, ArtifactError> {
        Self::open_with_clock(root, retention, Arc::new(SystemClock))
    }

    /// Opens a store that reads time from `clock`.
    ///
    /// Files already in the directory are indexed by modification time and
    /// leftover temporary files are removed.
    pub fn open_with_clock(
        root: impl Into<PathBuf>,
        retention: Duration,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ArtifactError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| ArtifactError::Directory {
            path: root.display().to_string(),
            source,
        })?;

        let store = Self {
            retention: chrono::Duration::from_std(retention)
                .unwrap_or_else(|_| chrono::Duration::days(365_000)),
            root,
            clock,
            entries: DashMap::new(),
            events: Arc::new(NoOpEventSink),
        };
        store.index_existing()?;
        Ok(store)
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Returns the store directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the retention window.
    #[must_use]
    pub fn retention(&self) -> chrono::Duration {
        self.retention
    }

    /// Writes `content` under `name`, replacing any previous content.
    pub fn write(&self, name: &str, content: &str) -> Result<Artifact, ArtifactError> {
        validate_artifact_name(name)?;
        let slot = self.slot(name);
        let mut written_at = slot.lock();

        self.publish(name, content)?;
        let now = self.clock.now();
        *written_at = Some(now);
        drop(written_at);

        info!(artifact = name, bytes = content.len(), "Artifact written");
        self.events.try_emit(
            "artifact.written",
            Some(json!({"artifact": name, "bytes": content.len()})),
        );
        Ok(Artifact::new(name, content, now))
    }

    /// Reads the content stored under `name`.
    pub fn read(&self, name: &str) -> Result<String, ArtifactError> {
        self.get(name).map(|artifact| artifact.content)
    }

    /// Reads the artifact stored under `name`.
    ///
    /// Artifacts past the retention window are reported as not found even
    /// if the sweep has not removed them yet.
    pub fn get(&self, name: &str) -> Result<Artifact, ArtifactError> {
        validate_artifact_name(name)?;
        let Some(slot) = self.entries.get(name).map(|entry| Arc::clone(entry.value())) else {
            return Err(ArtifactError::not_found(name));
        };
        let guard = slot.lock();
        let Some(written_at) = *guard else {
            return Err(ArtifactError::not_found(name));
        };
        if self.is_expired(written_at, self.clock.now()) {
            return Err(ArtifactError::not_found(name));
        }

        match fs::read_to_string(self.path(name)) {
            Ok(content) => Ok(Artifact::new(name, content, written_at)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(ArtifactError::not_found(name)),
            Err(source) => Err(ArtifactError::Read {
                name: name.to_string(),
                source,
            }),
        }
    }

    /// Deletes the artifact stored under `name`, if any.
    ///
    /// Returns whether a live artifact was removed.
    pub fn remove(&self, name: &str) -> Result<bool, ArtifactError> {
        validate_artifact_name(name)?;
        let Some(slot) = self.entries.get(name).map(|entry| Arc::clone(entry.value())) else {
            return Ok(false);
        };
        let mut guard = slot.lock();
        let Some(written_at) = *guard else {
            return Ok(false);
        };

        match fs::remove_file(self.path(name)) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(ArtifactError::Write {
                    name: name.to_string(),
                    source,
                })
            }
        }
        *guard = None;
        drop(guard);

        let was_live = !self.is_expired(written_at, self.clock.now());
        info!(artifact = name, "Artifact removed");
        self.events.try_emit("artifact.removed", Some(json!({"artifact": name})));
        Ok(was_live)
    }

    /// Returns the names of live artifacts, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let now = self.clock.now();
        let mut names: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| matches!(*entry.value().lock(), Some(t) if !self.is_expired(t, now)))
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }

    /// Deletes every artifact older than the retention window.
    ///
    /// Each candidate is re-checked under its name lock, so a write that
    /// lands after the sweep started is never deleted. Returns the removed
    /// names.
    pub fn sweep_once(&self) -> Vec<String> {
        let now = self.clock.now();
        let candidates: Vec<(String, Slot)> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect();

        let mut removed = Vec::new();
        for (name, slot) in candidates {
            let mut guard = slot.lock();
            let Some(written_at) = *guard else {
                continue;
            };
            if !self.is_expired(written_at, now) {
                continue;
            }

            match fs::remove_file(self.path(&name)) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(artifact = %name, error = %e, "Failed to remove expired artifact");
                    continue;
                }
            }
            *guard = None;
            drop(guard);

            info!(artifact = %name, "Artifact expired");
            self.events.try_emit("artifact.expired", Some(json!({"artifact": name})));
            removed.push(name);
        }
        removed
    }

    fn is_expired(&self, written_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(written_at) > self.retention
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn slot(&self, name: &str) -> Slot {
        Arc::clone(self.entries.entry(name.to_string()).or_default().value())
    }

    fn publish(&self, name: &str, content: &str) -> Result<(), ArtifactError> {
        let write_err = |source: io::Error| ArtifactError::Write {
            name: name.to_string(),
            source,
        };

        let mut tmp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile_in(&self.root)
            .map_err(write_err)?;
        tmp.write_all(content.as_bytes()).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(self.path(name)).map_err(|e| write_err(e.error))?;
        Ok(())
    }

    fn index_existing(&self) -> Result<(), ArtifactError> {
        let dir_err = |source: io::Error| ArtifactError::Directory {
            path: self.root.display().to_string(),
            source,
        };

        for entry in fs::read_dir(&self.root).map_err(dir_err)? {
            let entry = entry.map_err(dir_err)?;
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };

            if name.starts_with(TEMP_PREFIX) {
                if let Err(e) = fs::remove_file(entry.path()) {
                    warn!(file = name, error = %e, "Failed to remove leftover temp file");
                }
                continue;
            }

            let Ok(metadata) = entry.metadata() else {
                continue;
            };
            if !metadata.is_file() || validate_artifact_name(name).is_err() {
                continue;
            }
            let written_at = metadata
                .modified()
                .map_or_else(|_| self.clock.now(), DateTime::<Utc>::from);
            self.entries
                .insert(name.to_string(), Arc::new(Mutex::new(Some(written_at))));
            debug!(artifact = name, %written_at, "Indexed existing artifact");
        }
        Ok(())
    }
}

impl std::fmt::Debug for ArtifactStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactStore")
            .field("root", &self.root)
            .field("retention", &self.retention)
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BACKEND_SOURCE, FRONTEND_SOURCE};
    use crate::events::CollectingEventSink;
    use crate::store::ManualClock;
    use chrono::TimeZone;

    const WINDOW: Duration = Duration::from_secs(600);

    fn store_with_clock(dir: &Path) -> (ArtifactStore, ManualClock) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap());
        let store = ArtifactStore::open_with_clock(dir, WINDOW, Arc::new(clock.clone())).unwrap();
        (store, clock)
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let (store, _) = store_with_clock(dir.path());

        store.write(BACKEND_SOURCE, "print(1)").unwrap();
        assert_eq!(store.read(BACKEND_SOURCE).unwrap(), "print(1)");
        assert_eq!(fs::read_to_string(dir.path().join(BACKEND_SOURCE)).unwrap(), "print(1)");
    }

    #[test]
    fn test_overwrite_replaces_content_and_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let (store, clock) = store_with_clock(dir.path());

        let first = store.write(BACKEND_SOURCE, "v1").unwrap();
        clock.advance(chrono::Duration::seconds(30));
        let second = store.write(BACKEND_SOURCE, "v2").unwrap();

        assert_eq!(store.read(BACKEND_SOURCE).unwrap(), "v2");
        assert_eq!(second.written_at - first.written_at, chrono::Duration::seconds(30));
        assert_eq!(store.get(BACKEND_SOURCE).unwrap().written_at, second.written_at);
    }

    #[test]
    fn test_missing_and_invalid_names() {
        let dir = tempfile::tempdir().unwrap();
        let (store, _) = store_with_clock(dir.path());

        assert!(store.read(FRONTEND_SOURCE).unwrap_err().is_not_found());
        assert!(matches!(
            store.write("../escape", "x").unwrap_err(),
            ArtifactError::InvalidName { .. }
        ));
        assert!(matches!(store.read("a/b").unwrap_err(), ArtifactError::InvalidName { .. }));
    }

    #[test]
    fn test_retention_boundary() {
        let dir = tempfile::tempdir().unwrap();
        let (store, clock) = store_with_clock(dir.path());
        store.write(BACKEND_SOURCE, "print(1)").unwrap();

        clock.advance(chrono::Duration::seconds(599));
        assert!(store.sweep_once().is_empty());
        assert_eq!(store.read(BACKEND_SOURCE).unwrap(), "print(1)");

        clock.advance(chrono::Duration::seconds(2));
        assert!(store.read(BACKEND_SOURCE).unwrap_err().is_not_found());
        assert_eq!(store.sweep_once(), vec![BACKEND_SOURCE.to_string()]);
        assert!(!dir.path().join(BACKEND_SOURCE).exists());
        assert!(store.names().is_empty());
    }

    #[test]
    fn test_rewrite_after_expiry_is_live_again() {
        let dir = tempfile::tempdir().unwrap();
        let (store, clock) = store_with_clock(dir.path());
        store.write(BACKEND_SOURCE, "old").unwrap();

        clock.advance(chrono::Duration::seconds(601));
        store.write(BACKEND_SOURCE, "new").unwrap();

        assert!(store.sweep_once().is_empty());
        assert_eq!(store.read(BACKEND_SOURCE).unwrap(), "new");
    }

    #[test]
    fn test_sweep_only_removes_expired_names() {
        let dir = tempfile::tempdir().unwrap();
        let (store, clock) = store_with_clock(dir.path());
        store.write(BACKEND_SOURCE, "b").unwrap();
        clock.advance(chrono::Duration::seconds(300));
        store.write(FRONTEND_SOURCE, "f").unwrap();
        clock.advance(chrono::Duration::seconds(301));

        assert_eq!(store.sweep_once(), vec![BACKEND_SOURCE.to_string()]);
        assert_eq!(store.names(), vec![FRONTEND_SOURCE.to_string()]);
    }

    #[test]
    fn test_reopen_indexes_files_and_removes_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".forgeflow-tmp-abc123"), "partial").unwrap();
        fs::write(dir.path().join(".hidden"), "ignored").unwrap();

        let clock = ManualClock::new(Utc::now());
        {
            let store = ArtifactStore::open_with_clock(dir.path(), WINDOW, Arc::new(clock.clone())).unwrap();
            store.write(BACKEND_SOURCE, "kept").unwrap();
        }

        let reopened = ArtifactStore::open_with_clock(dir.path(), WINDOW, Arc::new(clock.clone())).unwrap();
        assert!(!dir.path().join(".forgeflow-tmp-abc123").exists());
        assert_eq!(reopened.read(BACKEND_SOURCE).unwrap(), "kept");
        assert_eq!(reopened.names(), vec![BACKEND_SOURCE.to_string()]);

        clock.advance(chrono::Duration::seconds(3600));
        assert_eq!(reopened.sweep_once(), vec![BACKEND_SOURCE.to_string()]);
    }

    #[test]
    fn test_concurrent_writes_to_one_name_never_tear() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::open(dir.path(), WINDOW).unwrap();
        let values: Vec<String> = (0..8).map(|i| i.to_string().repeat(10_000)).collect();

        let all = &values;
        std::thread::scope(|scope| {
            for value in all {
                let store = &store;
                scope.spawn(move || {
                    for _ in 0..5 {
                        store.write(BACKEND_SOURCE, value).unwrap();
                        let read = store.read(BACKEND_SOURCE).unwrap();
                        assert!(all.contains(&read), "torn read");
                    }
                });
            }
        });

        let last = store.read(BACKEND_SOURCE).unwrap();
        assert!(values.contains(&last));
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with(TEMP_PREFIX))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_remove_deletes_file_and_entry() {
        let dir = tempfile::tempdir().unwrap();
        let (store, _) = store_with_clock(dir.path());
        store.write(FRONTEND_SOURCE, "<button/>").unwrap();

        assert!(store.remove(FRONTEND_SOURCE).unwrap());
        assert!(!dir.path().join(FRONTEND_SOURCE).exists());
        assert!(store.read(FRONTEND_SOURCE).unwrap_err().is_not_found());
        assert!(!store.remove(FRONTEND_SOURCE).unwrap());
        assert!(!store.remove(BACKEND_SOURCE).unwrap());
        assert!(store.sweep_once().is_empty());
    }

    #[test]
    fn test_sweep_racing_rewrites_keeps_file_and_index_in_step() {
        let dir = tempfile::tempdir().unwrap();
        let (store, clock) = store_with_clock(dir.path());
        store.write(BACKEND_SOURCE, "seed").unwrap();
        clock.advance(chrono::Duration::seconds(601));

        std::thread::scope(|scope| {
            let store = &store;
            let clock = &clock;
            scope.spawn(move || {
                for i in 0..200 {
                    store.write(BACKEND_SOURCE, &i.to_string()).unwrap();
                }
            });
            scope.spawn(move || {
                for _ in 0..200 {
                    store.sweep_once();
                }
            });
            scope.spawn(move || {
                for _ in 0..200 {
                    clock.advance(chrono::Duration::seconds(601));
                    std::thread::yield_now();
                }
            });
        });

        let slot = store.slot(BACKEND_SOURCE);
        let indexed = slot.lock().is_some();
        assert_eq!(dir.path().join(BACKEND_SOURCE).exists(), indexed);

        store.sweep_once();
        assert_eq!(
            dir.path().join(BACKEND_SOURCE).exists(),
            store.get(BACKEND_SOURCE).is_ok()
        );
    }

    #[test]
    fn test_writes_to_other_names_do_not_wait_on_a_held_name() {
        let dir = tempfile::tempdir().unwrap();
        let (store, _) = store_with_clock(dir.path());
        let held = store.slot(FRONTEND_SOURCE);
        let guard = held.lock();

        let (done_tx, done_rx) = std::sync::mpsc::channel();
        std::thread::scope(|scope| {
            let store = &store;
            scope.spawn(move || {
                store.write(BACKEND_SOURCE, "print(1)").unwrap();
                done_tx.send(()).unwrap();
            });
            let finished = done_rx.recv_timeout(Duration::from_secs(5)).is_ok();
            drop(guard);
            assert!(finished, "write to another name blocked on a held lock");
        });

        assert_eq!(store.read(BACKEND_SOURCE).unwrap(), "print(1)");
    }

    #[test]
    fn test_events_are_emitted() {
        let dir = tempfile::tempdir().unwrap();
        let events = Arc::new(CollectingEventSink::new());
        let (store, clock) = store_with_clock(dir.path());
        let store = store.with_event_sink(events.clone());

        store.write(BACKEND_SOURCE, "x").unwrap();
        clock.advance(chrono::Duration::seconds(601));
        store.sweep_once();
        store.write(FRONTEND_SOURCE, "y").unwrap();
        store.remove(FRONTEND_SOURCE).unwrap();

        assert_eq!(
            events.event_types(),
            vec!["artifact.written", "artifact.expired", "artifact.written", "artifact.removed"]
        );
    }
}
