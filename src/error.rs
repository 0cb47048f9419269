//! Construction-time errors.

use std::path::PathBuf;

use thiserror::Error;

use crate::unit::UnitError;

/// The watcher or the coordinator could not be initialized.
///
/// Returned from construction only; nothing raised while processing a
/// change ever surfaces as a `SetupError`.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("cannot read watch root `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("watch root `{0}` is not a directory")]
    NotADirectory(PathBuf),

    #[error("failed to create file watcher")]
    Watch(#[from] notify::Error),

    #[error("failed to spawn watch thread")]
    Thread(#[source] std::io::Error),

    #[error("watcher already started")]
    AlreadyStarted,

    #[error("cannot fingerprint root unit")]
    Fingerprint(#[from] UnitError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_setup_error_display() {
        let err = SetupError::NotADirectory(PathBuf::from("out/App.unit"));
        assert!(err.to_string().contains("out/App.unit"));

        let err = SetupError::from(UnitError::MissingHeader);
        assert_eq!(err.to_string(), "cannot fingerprint root unit");
        assert!(err.source().is_some());
    }
}
