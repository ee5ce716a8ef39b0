//! Directory snapshot, diff, and recovery (C11).
//!
//! Walks a tracked directory tree, hashes every file with a tracked
//! extension, and writes the resulting manifest atomically so a later
//! `compare()` can diff against the prior state. Grounded on the original
//! `FileTracker`'s `scan`/`compare`/`recover` surface.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use lithium_core::{ContentHasher, Error, Result};
use parking_lot::Mutex;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// What kind of filesystem entry a [`FileEntry`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
}

/// One tracked file's recorded state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub mtime_unix_ms: u128,
    pub content_hash: String,
    pub size: u64,
    pub kind: EntryKind,
}

pub type FileSnapshot = HashMap<PathBuf, FileEntry>;

/// A per-path change relative to a prior snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiffStatus {
    New,
    Modified,
    Deleted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffEntry {
    pub status: DiffStatus,
    pub old: Option<FileEntry>,
    pub new: Option<FileEntry>,
}

pub type Diff = HashMap<PathBuf, DiffEntry>;

#[derive(Debug, Serialize, Deserialize)]
struct ManifestFile {
    entries: FileSnapshot,
}

/// Snapshot/diff/recover for one tracked directory.
pub struct FileTracker {
    dir: PathBuf,
    manifest_path: PathBuf,
    tracked_extensions: HashSet<String>,
    recursive: bool,
    prior: Mutex<Option<FileSnapshot>>,
    current: Mutex<Option<FileSnapshot>>,
    encryption_key: Mutex<Option<[u8; 32]>>,
}

impl std::fmt::Debug for FileTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileTracker")
            .field("dir", &self.dir)
            .field("manifest_path", &self.manifest_path)
            .field("recursive", &self.recursive)
            .finish()
    }
}

impl FileTracker {
    pub fn new(dir: impl Into<PathBuf>, manifest_path: impl Into<PathBuf>, tracked_extensions: &[&str], recursive: bool) -> Self {
        Self {
            dir: dir.into(),
            manifest_path: manifest_path.into(),
            tracked_extensions: tracked_extensions.iter().map(|s| (*s).to_string()).collect(),
            recursive,
            prior: Mutex::new(None),
            current: Mutex::new(None),
            encryption_key: Mutex::new(None),
        }
    }

    pub fn tracked_file_types(&self) -> Vec<&str> {
        self.tracked_extensions.iter().map(String::as_str).collect()
    }

    /// If set, the manifest is stored XOR-encrypted against a blake3
    /// keyed-hash keystream derived from `key`.
    pub fn set_encryption_key(&self, key: &[u8]) {
        *self.encryption_key.lock() = Some(*blake3::hash(key).as_bytes());
    }

    /// Walks the tree (respecting `recursive`), hashing every tracked
    /// file in parallel, and writes the resulting manifest atomically.
    /// The prior manifest, if present, is remembered for `compare()`.
    /// Per-file I/O failures are logged and the file is omitted; the
    /// overall scan always succeeds.
    pub fn scan(&self) -> Result<FileSnapshot> {
        if let Ok(existing) = load_manifest(&self.manifest_path, &self.encryption_key.lock()) {
            *self.prior.lock() = Some(existing);
        }

        let paths = collect_paths(&self.dir, self.recursive, &self.tracked_extensions);
        let entries: FileSnapshot = paths
            .par_iter()
            .filter_map(|path| match snapshot_one(path) {
                Ok(entry) => Some((relativize(&self.dir, path), entry)),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping file during scan");
                    None
                }
            })
            .collect();

        write_manifest(&self.manifest_path, &entries, &self.encryption_key.lock())?;
        *self.current.lock() = Some(entries.clone());
        Ok(entries)
    }

    /// Diffs the current snapshot (from the last `scan()`) against the
    /// prior one loaded at that time.
    pub fn compare(&self) -> Diff {
        let current = self.current.lock().clone().unwrap_or_default();
        let prior = self.prior.lock().clone().unwrap_or_default();
        diff_snapshots(&prior, &current)
    }

    pub fn log_differences(&self, log_path: &Path) -> Result<()> {
        let diff = self.compare();
        let mut lines = Vec::new();
        let mut paths: Vec<&PathBuf> = diff.keys().collect();
        paths.sort();
        for path in paths {
            let entry = &diff[path];
            lines.push(format!("{:?} {}", entry.status, path.display()));
        }
        let mut text = lines.join("\n");
        text.push('\n');
        use std::io::Write;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)
            .map_err(|e| Error::io(log_path.to_path_buf(), e))?;
        file.write_all(text.as_bytes()).map_err(|e| Error::io(log_path.to_path_buf(), e))
    }

    /// For every entry in `manifest_path`, if the file is absent on disk,
    /// creates an empty placeholder carrying the snapshot's mtime. The
    /// tracker is a change-detection tool, not a backup store: content is
    /// never restored, only presence.
    pub fn recover(&self, manifest_path: &Path) -> Result<usize> {
        let key = self.encryption_key.lock();
        let snapshot = load_manifest(manifest_path, &key)?;
        let mut recovered = 0;
        for (rel_path, entry) in &snapshot {
            let abs_path = self.dir.join(rel_path);
            if !abs_path.exists() {
                if let Some(parent) = abs_path.parent() {
                    std::fs::create_dir_all(parent).map_err(|e| Error::io(parent.to_path_buf(), e))?;
                }
                std::fs::write(&abs_path, []).map_err(|e| Error::io(abs_path.clone(), e))?;
                let mtime = SystemTime::UNIX_EPOCH + std::time::Duration::from_millis(entry.mtime_unix_ms as u64);
                let file = std::fs::File::open(&abs_path).map_err(|e| Error::io(abs_path.clone(), e))?;
                let _ = file.set_modified(mtime);
                recovered += 1;
            }
        }
        Ok(recovered)
    }

    pub async fn async_scan(self: std::sync::Arc<Self>) -> Result<FileSnapshot> {
        let manifest_path = self.manifest_path.clone();
        tokio::task::spawn_blocking(move || self.scan())
            .await
            .map_err(|e| Error::io(manifest_path, std::io::Error::other(e.to_string())))?
    }

    pub async fn async_compare(self: std::sync::Arc<Self>) -> Diff {
        tokio::task::spawn_blocking(move || self.compare()).await.unwrap_or_default()
    }
}

fn relativize(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap_or(path).to_path_buf()
}

fn collect_paths(dir: &Path, recursive: bool, tracked_extensions: &HashSet<String>) -> Vec<PathBuf> {
    let walker = if recursive {
        walkdir::WalkDir::new(dir)
    } else {
        walkdir::WalkDir::new(dir).max_depth(1)
    };
    walker
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| tracked_extensions.contains(ext))
        })
        .map(walkdir::DirEntry::into_path)
        .collect()
}

fn snapshot_one(path: &Path) -> Result<FileEntry> {
    let metadata = std::fs::metadata(path).map_err(|e| Error::io(path.to_path_buf(), e))?;
    let mtime = metadata
        .modified()
        .map_err(|e| Error::io(path.to_path_buf(), e))?
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let hash = ContentHasher::new().hash_file(path)?;
    Ok(FileEntry {
        mtime_unix_ms: mtime,
        content_hash: hash.to_hex(),
        size: metadata.len(),
        kind: EntryKind::File,
    })
}

fn diff_snapshots(prior: &FileSnapshot, current: &FileSnapshot) -> Diff {
    let mut diff = Diff::new();
    for (path, new_entry) in current {
        match prior.get(path) {
            None => {
                diff.insert(path.clone(), DiffEntry { status: DiffStatus::New, old: None, new: Some(new_entry.clone()) });
            }
            Some(old_entry) if old_entry.content_hash != new_entry.content_hash => {
                diff.insert(
                    path.clone(),
                    DiffEntry { status: DiffStatus::Modified, old: Some(old_entry.clone()), new: Some(new_entry.clone()) },
                );
            }
            Some(_) => {}
        }
    }
    for (path, old_entry) in prior {
        if !current.contains_key(path) {
            diff.insert(path.clone(), DiffEntry { status: DiffStatus::Deleted, old: Some(old_entry.clone()), new: None });
        }
    }
    diff
}

fn keystream(key: &[u8; 32], len: usize) -> Vec<u8> {
    let mut hasher = blake3::Hasher::new_keyed(key);
    hasher.update(b"lithium-filetracker-manifest");
    let mut xof = hasher.finalize_xof();
    let mut buf = vec![0u8; len];
    xof.fill(&mut buf);
    buf
}

fn xor_with_key(data: &[u8], key: &[u8; 32]) -> Vec<u8> {
    let stream = keystream(key, data.len());
    data.iter().zip(stream.iter()).map(|(a, b)| a ^ b).collect()
}

fn write_manifest(path: &Path, entries: &FileSnapshot, key: &Option<[u8; 32]>) -> Result<()> {
    let file = ManifestFile { entries: entries.clone() };
    let text = serde_json::to_vec_pretty(&file).map_err(|e| Error::parse("manifest", path.display().to_string(), e.to_string()))?;
    let bytes = match key {
        Some(k) => xor_with_key(&text, k),
        None => text,
    };
    let tmp_path = path.with_extension("tmp");
    std::fs::write(&tmp_path, bytes).map_err(|e| Error::io(tmp_path.clone(), e))?;
    std::fs::rename(&tmp_path, path).map_err(|e| Error::io(path.to_path_buf(), e))
}

fn load_manifest(path: &Path, key: &Option<[u8; 32]>) -> Result<FileSnapshot> {
    let bytes = std::fs::read(path).map_err(|e| Error::io(path.to_path_buf(), e))?;
    let text = match key {
        Some(k) => xor_with_key(&bytes, k),
        None => bytes,
    };
    let file: ManifestFile =
        serde_json::from_slice(&text).map_err(|e| Error::parse("manifest", path.display().to_string(), e.to_string()))?;
    Ok(file.entries)
}
