// src/fs/mock.rs

use super::FileSystem;
use anyhow::{Result, anyhow};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone)]
enum MockEntry {
    File(Vec<u8>),
    Dir(BTreeSet<PathBuf>),
    Symlink(PathBuf),
}

/// In-memory tree. Parent directories are created implicitly by
/// [`MockFileSystem::add_file`].
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    entries: Arc<Mutex<BTreeMap<PathBuf, MockEntry>>>,
    unreadable: Arc<Mutex<BTreeSet<PathBuf>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref().to_path_buf();
        let mut entries = self.lock();
        Self::link_parent(&mut entries, &path);
        entries.insert(path, MockEntry::File(content.into()));
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        let mut entries = self.lock();
        Self::link_parent(&mut entries, &path);
        entries
            .entry(path)
            .or_insert_with(|| MockEntry::Dir(BTreeSet::new()));
    }

    /// Add a symbolic link at `path` pointing at the absolute `target`.
    pub fn add_symlink(&self, path: impl AsRef<Path>, target: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        let mut entries = self.lock();
        Self::link_parent(&mut entries, &path);
        entries.insert(path, MockEntry::Symlink(target.as_ref().to_path_buf()));
    }

    /// Make `read_dir` on `path` fail, to simulate permission errors.
    pub fn deny(&self, path: impl AsRef<Path>) {
        self.unreadable
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(path.as_ref().to_path_buf());
    }

    /// Follow symlinks on `path` itself, giving up after a few hops.
    fn resolve(entries: &BTreeMap<PathBuf, MockEntry>, path: &Path) -> Option<PathBuf> {
        let mut current = path.to_path_buf();
        for _ in 0..8 {
            match entries.get(&current)? {
                MockEntry::Symlink(target) => current = target.clone(),
                _ => return Some(current),
            }
        }
        None
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<PathBuf, MockEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn link_parent(entries: &mut BTreeMap<PathBuf, MockEntry>, path: &Path) {
        let Some(parent) = path.parent() else {
            return;
        };
        if parent.as_os_str().is_empty() {
            return;
        }
        Self::link_parent(entries, parent);
        let slot = entries
            .entry(parent.to_path_buf())
            .or_insert_with(|| MockEntry::Dir(BTreeSet::new()));
        if let MockEntry::Dir(children) = slot {
            children.insert(path.to_path_buf());
        }
    }
}

impl FileSystem for MockFileSystem {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let entries = self.lock();
        let resolved = Self::resolve(&entries, path);
        match resolved.as_deref().and_then(|p| entries.get(p)) {
            Some(MockEntry::File(content)) => Ok(content.clone()),
            Some(MockEntry::Dir(_)) => Err(anyhow!("Is a directory: {:?}", path)),
            _ => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn is_file(&self, path: &Path) -> bool {
        let entries = self.lock();
        let resolved = Self::resolve(&entries, path);
        matches!(
            resolved.as_deref().and_then(|p| entries.get(p)),
            Some(MockEntry::File(_))
        )
    }

    fn is_dir(&self, path: &Path) -> bool {
        let entries = self.lock();
        let resolved = Self::resolve(&entries, path);
        matches!(
            resolved.as_deref().and_then(|p| entries.get(p)),
            Some(MockEntry::Dir(_))
        )
    }

    fn is_symlink(&self, path: &Path) -> bool {
        matches!(self.lock().get(path), Some(MockEntry::Symlink(_)))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        if self
            .unreadable
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(path)
        {
            return Err(anyhow!("Permission denied: {:?}", path));
        }
        let entries = self.lock();
        let resolved = Self::resolve(&entries, path);
        match resolved.as_deref().and_then(|p| entries.get(p)) {
            // Children are reported under the path that was asked for.
            Some(MockEntry::Dir(children)) => Ok(children
                .iter()
                .filter_map(|child| child.file_name().map(|name| path.join(name)))
                .collect()),
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }
}
