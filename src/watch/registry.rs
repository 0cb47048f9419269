use std::path::{Path, PathBuf};

use jwalk::{Parallelism, WalkDir};
use notify::{RecursiveMode, Watcher};
use rustc_hash::FxHashMap;

use crate::debug;

/// Subscription handle for one watched directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatchId(u64);

/// Result of registering a directory subtree.
#[derive(Debug, Default)]
pub(super) struct TreeScan {
    /// Directories registered by this scan (already-registered ones excluded)
    pub(super) dirs: Vec<PathBuf>,
    /// Files found inside the newly registered directories
    pub(super) files: Vec<PathBuf>,
}

/// Registration table: one live watch per existing directory.
///
/// Owned by the watch loop; never shared across threads.
#[derive(Default)]
pub(super) struct Registry {
    next_id: u64,
    dirs: FxHashMap<WatchId, PathBuf>,
    by_path: FxHashMap<PathBuf, WatchId>,
}

impl Registry {
    pub(super) fn new() -> Self {
        Self::default()
    }

    /// Register `dir` and every directory nested inside it.
    ///
    /// Directories that are already registered are skipped, so calling this
    /// for an overlapping subtree never produces a second registration.
    pub(super) fn register_tree(
        &mut self,
        watcher: &mut impl Watcher,
        dir: &Path,
    ) -> notify::Result<TreeScan> {
        let mut scan = TreeScan::default();
        if self.register(watcher, dir)? {
            scan.dirs.push(dir.to_path_buf());
        }

        let walk = WalkDir::new(dir)
            .parallelism(Parallelism::Serial)
            .skip_hidden(false)
            .sort(true);

        for entry in walk {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    // Vanished between readdir and stat; a delete event follows.
                    debug!("watch"; "skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if entry.depth == 0 {
                continue;
            }

            let path = entry.path();
            if entry.file_type().is_dir() {
                if self.register(watcher, &path)? {
                    scan.dirs.push(path);
                }
            } else if entry.file_type().is_file() {
                scan.files.push(path);
            }
        }

        Ok(scan)
    }

    /// Register a single directory. Returns `false` if it already was.
    fn register(&mut self, watcher: &mut impl Watcher, dir: &Path) -> notify::Result<bool> {
        if self.by_path.contains_key(dir) {
            return Ok(false);
        }

        watcher.watch(dir, RecursiveMode::NonRecursive)?;

        let id = WatchId(self.next_id);
        self.next_id += 1;
        self.dirs.insert(id, dir.to_path_buf());
        self.by_path.insert(dir.to_path_buf(), id);
        debug!("watch"; "registered {}", dir.display());
        Ok(true)
    }

    /// Drop the registration of `dir` and of every registered directory
    /// below it. Returns how many registrations were dropped.
    pub(super) fn unregister_tree(&mut self, watcher: &mut impl Watcher, dir: &Path) -> usize {
        let doomed: Vec<(WatchId, PathBuf)> = self
            .dirs
            .iter()
            .filter(|(_, path)| path.starts_with(dir))
            .map(|(id, path)| (*id, path.clone()))
            .collect();

        for (id, path) in &doomed {
            // The kernel usually dropped the watch together with the inode.
            let _ = watcher.unwatch(path);
            self.dirs.remove(id);
            self.by_path.remove(path);
            debug!("watch"; "unregistered {}", path.display());
        }

        doomed.len()
    }

    pub(super) fn is_registered(&self, dir: &Path) -> bool {
        self.by_path.contains_key(dir)
    }

    pub(super) fn len(&self) -> usize {
        self.dirs.len()
    }

    pub(super) fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    /// Registered directories, sorted.
    pub(super) fn dirs(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<_> = self.by_path.keys().cloned().collect();
        dirs.sort();
        dirs
    }
}
