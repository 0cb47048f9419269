//! Directory Watcher
//!
//! Turns filesystem notifications for a directory subtree into a plain
//! callback stream of [`ChangeEvent`]s, relative to the watch root.
//!
//! Architecture:
//! ```text
//! notify (one non-recursive watch per directory)
//!     → crossbeam channel
//!     → watch loop thread (registry + classification)
//!     → listener
//! ```
//!
//! Every directory under the root is registered individually. New
//! subdirectories are registered as they appear and deleted ones are
//! dropped, so the subtree can grow and shrink without restarting.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError};
use notify::RecommendedWatcher;

use crate::config::WatchConfig;
use crate::error::SetupError;
use crate::utils::path::normalize_path;
use crate::{debug, log};

// Registration table (subscription handle -> directory).
mod registry;
// Shared change types and raw event mapping.
mod types;


pub use registry::WatchId;
pub use types::{ChangeEvent, ChangeKind};

use registry::Registry;
use types::{changes_of, is_temp_file};

/// Receives change notifications on the watch thread.
///
/// Must not block indefinitely: the next event waits until it returns.
pub trait Listener: Send + 'static {
    fn changed(&mut self, event: &ChangeEvent);
}

impl<F> Listener for F
where
    F: FnMut(&ChangeEvent) + Send + 'static,
{
    fn changed(&mut self, event: &ChangeEvent) {
        self(event)
    }
}

/// Watch loop tuning.
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Skip editor/compiler temp artifacts (`*.swp`, `*~`, dot-files…)
    pub ignore_temp: bool,
    /// Upper bound on how long the loop waits before re-checking the stop flag
    pub stop_poll: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            ignore_temp: true,
            stop_poll: Duration::from_millis(250),
        }
    }
}

impl From<&WatchConfig> for WatchOptions {
    fn from(config: &WatchConfig) -> Self {
        Self {
            ignore_temp: config.ignore_temp,
            stop_poll: Duration::from_millis(config.stop_poll_ms.max(1)),
        }
    }
}

/// Cooperative stop flag shared with the watch loop.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the loop to exit. Does not wait for it.
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Watches a directory subtree on a dedicated background thread.
pub struct DirectoryWatcher {
    root: PathBuf,
    stop: StopHandle,
    /// Loop state until `start()` moves it onto the watch thread
    pending: Option<WatchLoop>,
    thread: Option<JoinHandle<()>>,
}

impl DirectoryWatcher {
    /// Register `root` and every directory below it.
    ///
    /// Events start buffering immediately; the listener is only invoked once
    /// [`start`](Self::start) has been called.
    pub fn new(
        root: &Path,
        listener: impl Listener,
        options: WatchOptions,
    ) -> Result<Self, SetupError> {
        let root = normalize_path(root);
        let metadata = fs::metadata(&root).map_err(|e| SetupError::Io(root.clone(), e))?;
        if !metadata.is_dir() {
            return Err(SetupError::NotADirectory(root));
        }
        // Surface permission problems now rather than as a silent empty walk.
        fs::read_dir(&root).map_err(|e| SetupError::Io(root.clone(), e))?;

        let (tx, rx) = channel::unbounded();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;

        let mut registry = Registry::new();
        registry.register_tree(&mut watcher, &root)?;
        debug!("watch"; "watching {} directories under {}", registry.len(), root.display());

        let stop = StopHandle::new();
        let pending = WatchLoop {
            root: root.clone(),
            watcher,
            registry,
            events: rx,
            listener: Box::new(listener),
            stop: stop.clone(),
            options,
        };

        Ok(Self {
            root,
            stop,
            pending: Some(pending),
            thread: None,
        })
    }

    /// Start the watch loop on its own thread.
    pub fn start(&mut self) -> Result<(), SetupError> {
        let watch_loop = self.pending.take().ok_or(SetupError::AlreadyStarted)?;

        let handle = std::thread::Builder::new()
            .name("warmswap-watch".into())
            .spawn(move || watch_loop.run())
            .map_err(SetupError::Thread)?;

        self.thread = Some(handle);
        Ok(())
    }

    /// Request the loop to exit after its current iteration.
    pub fn stop(&self) {
        self.stop.stop();
    }

    /// Handle that stops this watcher from another owner or thread.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Wait for the watch thread to exit.
    pub fn join(mut self) {
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Registered directories, available until the loop is started.
    pub fn registered_dirs(&self) -> Vec<PathBuf> {
        self.pending
            .as_ref()
            .map(|pending| pending.registry.dirs())
            .unwrap_or_default()
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for DirectoryWatcher {
    fn drop(&mut self) {
        self.stop.stop();
    }
}

/// State owned by the watch thread.
struct WatchLoop {
    root: PathBuf,
    /// Must stay alive for notifications to keep flowing
    watcher: RecommendedWatcher,
    registry: Registry,
    events: Receiver<notify::Result<notify::Event>>,
    listener: Box<dyn Listener>,
    stop: StopHandle,
    options: WatchOptions,
}

impl WatchLoop {
    fn run(mut self) {
        while !self.stop.is_stopped() {
            match self.events.recv_timeout(self.options.stop_poll) {
                Ok(Ok(event)) => self.handle(&event),
                Ok(Err(e)) => log!("watch"; "notify error: {}", e),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }

            if self.registry.is_empty() {
                log!("watch"; "no watched directories left, stopping");
                break;
            }
        }
        debug!("watch"; "watch loop exited");
    }

    fn handle(&mut self, event: &notify::Event) {
        if event.need_rescan() {
            // Details were lost; report the root itself as modified.
            log!("watch"; "event overflow, reporting root as modified");
            self.emit(self.root.clone(), ChangeKind::Modified);
            return;
        }

        debug!("watch"; "raw notify: {:?} {:?}", event.kind, event.paths);

        for (path, kind) in changes_of(event) {
            // Directories are never temp artifacts, dot-named or not.
            let is_dir = match kind {
                ChangeKind::Deleted => self.registry.is_registered(&path),
                _ => path.is_dir(),
            };
            if self.options.ignore_temp && !is_dir && is_temp_file(&path) {
                continue;
            }

            match kind {
                ChangeKind::Created | ChangeKind::Modified if path.is_dir() => {
                    self.register_new_dir(&path, kind);
                }
                ChangeKind::Deleted if self.registry.is_registered(&path) => {
                    let dropped = self.registry.unregister_tree(&mut self.watcher, &path);
                    debug!("watch"; "dropped {} registration(s) under {}", dropped, path.display());
                    self.emit(path, kind);
                }
                _ => self.emit(path, kind),
            }
        }
    }

    /// Register a directory that appeared after startup, then report it and
    /// any files already written inside it.
    fn register_new_dir(&mut self, dir: &Path, kind: ChangeKind) {
        if self.registry.is_registered(dir) {
            self.emit(dir.to_path_buf(), kind);
            return;
        }

        let scan = match self.registry.register_tree(&mut self.watcher, dir) {
            Ok(scan) => scan,
            Err(e) => {
                log!("watch"; "failed to watch {}: {}", dir.display(), e);
                return;
            }
        };

        self.emit(dir.to_path_buf(), ChangeKind::Created);
        for nested in scan.dirs.into_iter().filter(|d| d != dir) {
            self.emit(nested, ChangeKind::Created);
        }
        for file in scan.files {
            if self.options.ignore_temp && is_temp_file(&file) {
                continue;
            }
            self.emit(file, ChangeKind::Created);
        }
    }

    fn emit(&mut self, path: PathBuf, kind: ChangeKind) {
        let Ok(relative) = path.strip_prefix(&self.root) else {
            debug!("watch"; "ignoring event outside root: {}", path.display());
            return;
        };

        debug!("watch"; "{}: {}", kind.label(), relative.display());
        let event = ChangeEvent::new(relative, kind);
        self.listener.changed(&event);
    }
}
