//! Persistence of resumable download offsets.
//!
//! A [`ResumableProcessor`] stores `url -> offset` pairs. The
//! [`ResumableSession`] is the client-owned index shared by all live
//! transfers; it loads every registered processor on registration and saves
//! the whole index to each of them once, at shutdown.

use crate::base::context::IoResultExt;
use crate::base::neterror::NetError;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// File name used by [`FileResumableProcessor`].
pub const RESUMABLE_INDEX_FILE: &str = "resumable-index.json";

/// Store for download offsets.
pub trait ResumableProcessor: Send + Sync {
    /// Record `offset` bytes received for `key`.
    fn put(&self, key: &str, offset: u64);

    /// Forget `key`; its transfer completed.
    fn remove(&self, key: &str);

    /// Persist the full index.
    fn save(&self, index: &HashMap<String, u64>) -> Result<(), NetError>;

    /// Offsets persisted by an earlier run.
    fn load(&self) -> Result<HashMap<String, u64>, NetError>;
}

/// Keeps nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProcessor;

impl ResumableProcessor for NullProcessor {
    fn put(&self, _key: &str, _offset: u64) {}

    fn remove(&self, _key: &str) {}

    fn save(&self, _index: &HashMap<String, u64>) -> Result<(), NetError> {
        Ok(())
    }

    fn load(&self) -> Result<HashMap<String, u64>, NetError> {
        Ok(HashMap::new())
    }
}

/// Serializable form of one index entry.
#[derive(Serialize, Deserialize, Debug, Clone)]
struct PersistentOffset {
    url: String,
    offset: u64,
}

/// Keeps offsets in memory and writes them as JSON under a directory.
///
/// `put` and `remove` only touch memory; the file is written by `save` and
/// read by the first `load`. Later loads return the in-memory entries, so a
/// completed transfer is not revived from a stale file.
#[derive(Debug)]
pub struct FileResumableProcessor {
    path: PathBuf,
    offsets: DashMap<String, u64>,
    loaded: AtomicBool,
}

impl FileResumableProcessor {
    /// Store the index in `dir/resumable-index.json`.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(RESUMABLE_INDEX_FILE),
            offsets: DashMap::new(),
            loaded: AtomicBool::new(false),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Offset recorded in memory for `key`.
    pub fn offset(&self, key: &str) -> Option<u64> {
        self.offsets.get(key).map(|entry| *entry)
    }
}

impl ResumableProcessor for FileResumableProcessor {
    fn put(&self, key: &str, offset: u64) {
        self.offsets.insert(key.to_string(), offset);
    }

    fn remove(&self, key: &str) {
        self.offsets.remove(key);
    }

    /// Write `index` merged with this processor's own entries.
    ///
    /// Own entries win; keys removed through this processor stay removed only
    /// if `index` no longer holds them either.
    fn save(&self, index: &HashMap<String, u64>) -> Result<(), NetError> {
        let mut merged: HashMap<String, u64> = index.clone();
        for entry in self.offsets.iter() {
            merged.insert(entry.key().clone(), *entry.value());
        }

        let mut entries: Vec<PersistentOffset> = merged
            .into_iter()
            .map(|(url, offset)| PersistentOffset { url, offset })
            .collect();
        entries.sort_by(|a, b| a.url.cmp(&b.url));

        let json = serde_json::to_string_pretty(&entries)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
            .path_context(&self.path)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).path_context(parent)?;
        }
        // write then rename so a crash never leaves a truncated index
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).path_context(&tmp)?;
        fs::rename(&tmp, &self.path).path_context(&self.path)?;

        tracing::debug!(path = %self.path.display(), entries = entries.len(), "saved resumable index");
        Ok(())
    }

    fn load(&self) -> Result<HashMap<String, u64>, NetError> {
        if self.loaded.swap(true, Ordering::AcqRel) {
            return Ok(self
                .offsets
                .iter()
                .map(|entry| (entry.key().clone(), *entry.value()))
                .collect());
        }

        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(e).path_context(&self.path),
        };

        let entries: Vec<PersistentOffset> = serde_json::from_str(&json)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
            .path_context(&self.path)?;

        let mut index = HashMap::with_capacity(entries.len());
        for entry in entries {
            self.offsets.insert(entry.url.clone(), entry.offset);
            index.insert(entry.url, entry.offset);
        }
        tracing::debug!(path = %self.path.display(), entries = index.len(), "loaded resumable index");
        Ok(index)
    }
}

/// Resumable state shared by the transfers of one client.
///
/// Holds the `url -> offset` index and the processors to flush at shutdown.
/// Dropping the session flushes it if [`flush`](Self::flush) was not called.
pub struct ResumableSession {
    index: DashMap<String, u64>,
    processors: Mutex<Vec<Arc<dyn ResumableProcessor>>>,
    flushed: AtomicBool,
}

impl ResumableSession {
    pub fn new() -> Self {
        Self {
            index: DashMap::new(),
            processors: Mutex::new(Vec::new()),
            flushed: AtomicBool::new(false),
        }
    }

    /// Register `processor` for the shutdown flush and merge its stored
    /// offsets into the index.
    ///
    /// Each processor is loaded once; registering the same `Arc` again is a
    /// no-op. A processor that fails to load is still registered.
    pub fn register(&self, processor: Arc<dyn ResumableProcessor>) {
        let mut processors = match self.processors.lock() {
            Ok(processors) => processors,
            Err(poisoned) => poisoned.into_inner(),
        };
        if processors.iter().any(|known| same_processor(known, &processor)) {
            return;
        }

        match processor.load() {
            Ok(stored) => {
                for (key, offset) in stored {
                    self.index.insert(key, offset);
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to load resumable index"),
        }
        processors.push(processor);
    }

    /// Stored offset for `key`.
    pub fn offset(&self, key: &str) -> Option<u64> {
        self.index.get(key).map(|entry| *entry)
    }

    pub fn record(&self, key: &str, offset: u64) {
        self.index.insert(key.to_string(), offset);
    }

    pub fn forget(&self, key: &str) {
        self.index.remove(key);
    }

    /// Snapshot of the index.
    pub fn snapshot(&self) -> HashMap<String, u64> {
        self.index
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }

    pub fn processor_count(&self) -> usize {
        match self.processors.lock() {
            Ok(processors) => processors.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    /// Save the index to every registered processor.
    ///
    /// Runs once; later calls return `false` and do nothing. Save failures are
    /// logged and do not stop the remaining processors.
    pub fn flush(&self) -> bool {
        if self.flushed.swap(true, Ordering::AcqRel) {
            return false;
        }

        let snapshot = self.snapshot();
        let processors = match self.processors.lock() {
            Ok(processors) => processors.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };

        for processor in &processors {
            if let Err(e) = processor.save(&snapshot) {
                tracing::warn!(error = %e, "failed to save resumable index");
            }
        }
        tracing::debug!(
            processors = processors.len(),
            entries = snapshot.len(),
            "flushed resumable session"
        );
        true
    }
}

// data pointers only; vtable pointers of one type may differ across units
fn same_processor(a: &Arc<dyn ResumableProcessor>, b: &Arc<dyn ResumableProcessor>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

impl Default for ResumableSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ResumableSession {
    fn drop(&mut self) {
        self.flush();
    }
}

impl std::fmt::Debug for ResumableSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResumableSession")
            .field("entries", &self.index.len())
            .field("processors", &self.processor_count())
            .field("flushed", &self.flushed.load(Ordering::Acquire))
            .finish()
    }
}
