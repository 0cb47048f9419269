//! Demo application booted from compiled unit output.
//!
//! [`UnitApp`] is a minimal [`Lifecycle`]: each boot reads the root unit
//! from the output directory, derives its [`Routes`] and wraps them in a
//! fresh [`UnitContainer`]. The generation counter makes successive boots
//! observable from HTTP responses.

mod routes;

pub use routes::Routes;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use anyhow::{Context, Result};

use crate::reload::{Container, Lifecycle};
use crate::unit::{Unit, UnitName};
use crate::{debug, log};

/// Serves the routes of one boot.
#[derive(Debug)]
pub struct AppHandler {
    generation: usize,
    routes: Routes,
}

impl AppHandler {
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Body for a `GET` of `path`, if routed.
    pub fn respond(&self, path: &str) -> Option<&str> {
        self.routes.get(path)
    }
}

/// Container produced by one boot of [`UnitApp`].
#[derive(Debug)]
pub struct UnitContainer {
    root_unit: UnitName,
    handler: Arc<AppHandler>,
}

impl Container for UnitContainer {
    type Handler = AppHandler;

    fn handler(&self) -> Arc<AppHandler> {
        Arc::clone(&self.handler)
    }

    fn root_unit(&self) -> UnitName {
        self.root_unit.clone()
    }
}

/// Lifecycle manager of the demo application.
#[derive(Debug)]
pub struct UnitApp {
    output_dir: PathBuf,
    root_unit: UnitName,
    generation: AtomicUsize,
    stopped: AtomicBool,
}

impl UnitApp {
    pub fn new(output_dir: &Path, root_unit: UnitName) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
            root_unit,
            generation: AtomicUsize::new(0),
            stopped: AtomicBool::new(false),
        }
    }

    /// Build a container from the root unit currently on disk.
    pub fn boot(&self) -> Result<Arc<UnitContainer>> {
        let unit = Unit::load_named(&self.output_dir, &self.root_unit)
            .with_context(|| format!("failed to boot `{}`", self.root_unit))?;
        let routes = Routes::of(&unit);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        debug!("serve"; "generation {}: routes {:?}", generation, routes.paths());

        Ok(Arc::new(UnitContainer {
            root_unit: self.root_unit.clone(),
            handler: Arc::new(AppHandler { generation, routes }),
        }))
    }

    /// Number of successful boots so far.
    pub fn generation(&self) -> usize {
        self.generation.load(Ordering::SeqCst)
    }
}

impl Lifecycle for UnitApp {
    type Container = UnitContainer;

    fn restart(&self) -> Result<Arc<UnitContainer>> {
        self.boot()
    }

    fn stop(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            log!("serve"; "application stopped, restart warmswap after fixing the build");
            crate::core::request_shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_app(dir: &Path, body: &str) {
        let path = dir.join("com/example/App.unit");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            path,
            format!(
                "unit com.example.App\nmethod <init> ()V\n  ldc str \"/\"\n  ldc str \"{body}\"\n  \
                 invoke virtual com.example.Router get (Ljava/lang/String;Ljava/lang/String;)V\nend\n"
            ),
        )
        .unwrap();
    }

    #[test]
    fn test_boot_reads_routes() {
        let dir = TempDir::new().unwrap();
        write_app(dir.path(), "v1");

        let app = UnitApp::new(dir.path(), UnitName::new("com.example.App"));
        let container = app.boot().unwrap();
        let handler = container.handler();

        assert_eq!(handler.generation(), 1);
        assert_eq!(handler.respond("/"), Some("v1"));
        assert_eq!(container.root_unit().as_str(), "com.example.App");
    }

    #[test]
    fn test_restart_produces_new_container() {
        let dir = TempDir::new().unwrap();
        write_app(dir.path(), "v1");

        let app = UnitApp::new(dir.path(), UnitName::new("com.example.App"));
        let first = app.boot().unwrap();
        write_app(dir.path(), "v2");
        let second = app.restart().unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.handler().generation(), 2);
        assert_eq!(second.handler().respond("/"), Some("v2"));
        assert_eq!(app.generation(), 2);
    }

    #[test]
    fn test_boot_missing_unit_fails() {
        let dir = TempDir::new().unwrap();
        let app = UnitApp::new(dir.path(), UnitName::new("com.example.App"));

        let err = app.boot().unwrap_err();
        assert!(format!("{err:#}").contains("com.example.App"));
        assert_eq!(app.generation(), 0);
    }
}
