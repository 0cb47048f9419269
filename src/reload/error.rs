//! Failures raised while classifying a single change.

use thiserror::Error;

use crate::unit::{UnitError, UnitName};

/// A change could not be processed. Contained inside `on_change`; the
/// coordinator reacts by stopping the application.
#[derive(Debug, Error)]
pub enum ReloadError {
    #[error("failed to fingerprint `{unit}`")]
    Fingerprint {
        unit: UnitName,
        #[source]
        source: UnitError,
    },

    #[error("application restart failed")]
    Restart(#[source] anyhow::Error),

    #[error("application restart panicked: {0}")]
    Panicked(String),
}

impl ReloadError {
    /// Render the error with its whole source chain on one line.
    pub fn chain(self) -> String {
        format!("{:#}", anyhow::Error::new(self))
    }
}

/// Extract a readable message from a caught panic payload.
pub(super) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_includes_sources() {
        let err = ReloadError::Fingerprint {
            unit: UnitName::new("com.example.App"),
            source: UnitError::MissingHeader,
        };
        let text = err.chain();
        assert!(text.contains("com.example.App"));
        assert!(text.contains("missing `unit` header"));

        let err = ReloadError::Restart(anyhow::anyhow!("port in use"));
        assert!(err.chain().contains("port in use"));
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");

        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");

        let payload: Box<dyn std::any::Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}
