//! `[app]` section configuration.
//!
//! ```toml
//! [app]
//! root_unit = "com.example.App"   # Unit the application boots from
//! ```

use serde::Deserialize;

use crate::config::types::ConfigDiagnostics;
use crate::unit::UnitName;

/// Application settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Fully-qualified name of the root composition unit.
    pub root_unit: String,
}

impl AppConfig {
    pub fn root_unit(&self) -> UnitName {
        UnitName::new(self.root_unit.trim())
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        let name = self.root_unit.trim();
        if name.is_empty() {
            diag.error_with_hint(
                "app.root_unit",
                "root composition unit is not set",
                "e.g. root_unit = \"com.example.App\"",
            );
        } else if name.split('.').any(str::is_empty) || name.contains(char::is_whitespace) {
            diag.error("app.root_unit", format!("`{name}` is not a dotted unit name"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_app_config() {
        let config = test_parse_config("[app]\nroot_unit = \"com.example.App\"");
        assert_eq!(config.app.root_unit().as_str(), "com.example.App");
    }

    #[test]
    fn test_app_config_validation() {
        let mut diag = ConfigDiagnostics::new();
        AppConfig::default().validate(&mut diag);
        assert_eq!(diag.len(), 1);

        let mut diag = ConfigDiagnostics::new();
        AppConfig {
            root_unit: "com..App".into(),
        }
        .validate(&mut diag);
        assert_eq!(diag.len(), 1);

        let mut diag = ConfigDiagnostics::new();
        AppConfig {
            root_unit: "com.example.App".into(),
        }
        .validate(&mut diag);
        assert!(diag.is_empty());
    }
}
