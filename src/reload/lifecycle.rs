//! Boundary traits towards the application.
//!
//! The coordinator never builds containers itself; it asks the
//! [`Lifecycle`] to restart or stop and only keeps references.

use std::sync::Arc;

use crate::unit::UnitName;

/// A built dependency-injection container.
///
/// Compared by identity (`Arc::ptr_eq`) only.
pub trait Container: Send + Sync + 'static {
    /// Request-handling object exposed to the transport layer.
    type Handler: ?Sized + Send + Sync + 'static;

    fn handler(&self) -> Arc<Self::Handler>;

    /// Name of the root composition unit the container was booted from.
    fn root_unit(&self) -> UnitName;
}

/// Application lifecycle manager.
pub trait Lifecycle: Send + Sync + 'static {
    type Container: Container;

    /// Rebuild the container (and thereby the handler).
    ///
    /// May return the current container when no rebuild was needed.
    fn restart(&self) -> anyhow::Result<Arc<Self::Container>>;

    /// Shut the application down. Nothing is served afterwards.
    fn stop(&self);
}

/// Handler type served by a lifecycle's containers.
pub type HandlerOf<L> = <<L as Lifecycle>::Container as Container>::Handler;
