//! Reload Coordinator
//!
//! Classifies each change reported by the [`DirectoryWatcher`] and drives
//! the [`Lifecycle`]:
//!
//! ```text
//! change ──► root unit? ──yes──► fingerprint changed? ──no──► keep handler
//!               │                        │
//!               no                      yes
//!               ▼                        ▼
//!            restart ◄───────────────────┘
//!               │
//!          ok ──┴── error ──► lifecycle.stop(), Stopped
//! ```
//!
//! All of it runs under the write half of one `RwLock`, so `handler()`
//! readers observe either the handler from before a reload or the one from
//! after it.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use parking_lot::{Mutex, RwLock};

use super::error::{ReloadError, panic_message};
use super::lifecycle::{Container, HandlerOf, Lifecycle};
use crate::error::SetupError;
use crate::logger::{status_error, status_success, status_unchanged};
use crate::unit::{Fingerprint, UnitName};
use crate::utils::path::normalize_path;
use crate::watch::{ChangeEvent, DirectoryWatcher, Listener, StopHandle, WatchOptions};
use crate::{debug, log};

/// Observable coordinator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CoordinatorState {
    /// Waiting for changes
    Idle = 0,
    /// A change is being classified (write lock held)
    Reloading = 1,
    /// A reload failed; changes are ignored from now on
    Stopped = 2,
}

impl CoordinatorState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Reloading,
            _ => Self::Stopped,
        }
    }
}

/// What a single change resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    /// Root unit recompiled without structural change
    Unchanged,
    /// Restart produced a new container, handler swapped
    Reloaded,
    /// Restart returned the current container
    Retained,
}

/// Everything guarded by the reload lock.
struct Active<C: Container> {
    container: Arc<C>,
    handler: Arc<C::Handler>,
    fingerprint: Fingerprint,
    stopped: bool,
}

impl<C: Container> Active<C> {
    /// Install `container` unless it is the one already active.
    fn install(&mut self, container: Arc<C>) -> bool {
        if Arc::ptr_eq(&self.container, &container) {
            return false;
        }
        self.handler = container.handler();
        self.container = container;
        true
    }
}

/// Owns the active handler and swaps it when compiled output changes.
pub struct ReloadCoordinator<L: Lifecycle> {
    output_dir: PathBuf,
    root_unit: UnitName,
    lifecycle: L,
    active: RwLock<Active<L::Container>>,
    state: AtomicU8,
    /// Stop handle of the watcher feeding this coordinator, once attached
    watcher: Mutex<Option<StopHandle>>,
}

impl<L: Lifecycle> ReloadCoordinator<L> {
    /// Take over `container` as the active one and fingerprint its root unit
    /// from `output_dir`.
    pub fn new(
        output_dir: &Path,
        container: Arc<L::Container>,
        lifecycle: L,
    ) -> Result<Arc<Self>, SetupError> {
        let output_dir = normalize_path(output_dir);
        let root_unit = container.root_unit();
        let fingerprint = Fingerprint::load(&output_dir, &root_unit)?;

        debug!("reload"; "root unit {} fingerprint {} ({} tokens)",
            root_unit, fingerprint.digest(), fingerprint.token_count());

        let active = Active {
            handler: container.handler(),
            container,
            fingerprint,
            stopped: false,
        };

        Ok(Arc::new(Self {
            output_dir,
            root_unit,
            lifecycle,
            active: RwLock::new(active),
            state: AtomicU8::new(CoordinatorState::Idle as u8),
            watcher: Mutex::new(None),
        }))
    }

    /// Watch the output directory with this coordinator as the listener.
    ///
    /// The returned watcher is already running; dropping it stops it.
    pub fn watch(self: &Arc<Self>, options: WatchOptions) -> Result<DirectoryWatcher, SetupError> {
        let mut watcher = DirectoryWatcher::new(&self.output_dir, Arc::clone(self), options)?;
        *self.watcher.lock() = Some(watcher.stop_handle());
        watcher.start()?;

        log!("watch"; "watching {}", self.output_dir.display());
        Ok(watcher)
    }

    /// Currently active handler. Holds the read lock for the lookup only.
    pub fn handler(&self) -> Arc<HandlerOf<L>> {
        Arc::clone(&self.active.read().handler)
    }

    /// Currently active container.
    pub fn container(&self) -> Arc<L::Container> {
        Arc::clone(&self.active.read().container)
    }

    /// Fingerprint of the root unit as of the last classification.
    pub fn fingerprint(&self) -> Fingerprint {
        self.active.read().fingerprint.clone()
    }

    pub fn root_unit(&self) -> &UnitName {
        &self.root_unit
    }

    pub fn state(&self) -> CoordinatorState {
        CoordinatorState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Stop the attached watcher, if any. Does not wait for it.
    pub fn stop(&self) {
        if let Some(handle) = self.watcher.lock().as_ref() {
            handle.stop();
        }
    }

    /// Classify a change reported relative to the output directory.
    ///
    /// Never fails outward: any error stops the application and turns the
    /// coordinator into a no-op.
    pub fn on_change(&self, relative_path: &Path) {
        let mut active = self.active.write();
        if active.stopped {
            debug!("reload"; "stopped, ignoring {}", relative_path.display());
            return;
        }

        self.set_state(CoordinatorState::Reloading);
        let unit = UnitName::from_relative_path(relative_path);

        match self.classify(&mut active, &unit) {
            Ok(decision) => {
                report(&unit, decision, &active);
                self.set_state(CoordinatorState::Idle);
            }
            Err(err) => {
                active.stopped = true;
                self.set_state(CoordinatorState::Stopped);
                self.fail(&unit, err);
            }
        }
    }

    fn classify(
        &self,
        active: &mut Active<L::Container>,
        unit: &UnitName,
    ) -> Result<Decision, ReloadError> {
        if unit == &self.root_unit {
            let fingerprint = Fingerprint::load(&self.output_dir, unit).map_err(|source| {
                ReloadError::Fingerprint {
                    unit: unit.clone(),
                    source,
                }
            })?;

            if fingerprint == active.fingerprint {
                return Ok(Decision::Unchanged);
            }

            debug!("reload"; "{} fingerprint {} -> {}",
                unit, active.fingerprint.digest(), fingerprint.digest());
            active.fingerprint = fingerprint;
        } else {
            // Blast radius unknown: always rebuild.
            debug!("reload"; "{} changed, restarting", display_unit(unit));
        }

        let container = self.restart()?;
        Ok(if active.install(container) {
            Decision::Reloaded
        } else {
            Decision::Retained
        })
    }

    fn restart(&self) -> Result<Arc<L::Container>, ReloadError> {
        match catch_unwind(AssertUnwindSafe(|| self.lifecycle.restart())) {
            Ok(result) => result.map_err(ReloadError::Restart),
            Err(payload) => Err(ReloadError::Panicked(panic_message(payload.as_ref()))),
        }
    }

    /// Fail fast: stop the application rather than serve a handler that may
    /// not match the compiled output.
    fn fail(&self, unit: &UnitName, err: ReloadError) {
        let detail = err.chain();
        log!("error"; "reload of {} failed: {}", display_unit(unit), detail);
        status_error("reload failed, stopping application", &detail);

        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| self.lifecycle.stop())) {
            log!("error"; "application stop panicked: {}", panic_message(payload.as_ref()));
        }
        self.stop();
    }

    fn set_state(&self, state: CoordinatorState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }
}

impl<L: Lifecycle> Listener for Arc<ReloadCoordinator<L>> {
    fn changed(&mut self, event: &ChangeEvent) {
        self.on_change(&event.path);
    }
}

fn report<C: Container>(unit: &UnitName, decision: Decision, active: &Active<C>) {
    match decision {
        Decision::Unchanged => status_unchanged(&format!("{unit} unchanged")),
        Decision::Reloaded => status_success(&format!(
            "reloaded after change to {} (fingerprint {})",
            display_unit(unit),
            active.fingerprint.digest()
        )),
        Decision::Retained => status_unchanged(&format!(
            "restart after change to {} kept the running container",
            display_unit(unit)
        )),
    }
}

/// The empty name stands for the output root (overflow or root removal).
fn display_unit(unit: &UnitName) -> &str {
    if unit.as_str().is_empty() {
        "<output root>"
    } else {
        unit.as_str()
    }
}
