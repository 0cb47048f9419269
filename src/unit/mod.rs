//! Compiled unit model.
//!
//! A compiled unit is an instruction listing written by the application's
//! build step into the output directory, one file per unit, laid out by
//! package: `com.example.App` lives at `com/example/App.unit`.
//!
//! - [`parse`]: listing → [`Unit`] (methods + instruction stream)
//! - [`fingerprint`]: initializer instructions → [`Fingerprint`] (pure)

pub mod fingerprint;
pub mod parse;

pub use fingerprint::Fingerprint;
pub use parse::{ConstantKind, Instruction, InvokeKind, Method, Unit, UnitError};

use std::fmt;
use std::path::{Component, Path, PathBuf};

/// File extension of compiled unit listings.
pub const UNIT_EXTENSION: &str = "unit";

/// Method name of unit initializers (constructors).
pub const INITIALIZER: &str = "<init>";

/// Fully-qualified dotted name of a compiled unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitName(String);

impl UnitName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Translate a path relative to the output root into a unit name.
    ///
    /// `com/example/App.unit` → `com.example.App`. Files that are not unit
    /// listings keep their extension (`static/app.css` → `static.app.css`)
    /// so they can never collide with a unit name.
    pub fn from_relative_path(path: &Path) -> Self {
        let is_unit = path
            .extension()
            .is_some_and(|ext| ext == UNIT_EXTENSION);
        let path = if is_unit {
            path.with_extension("")
        } else {
            path.to_path_buf()
        };

        let name = path
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(".");

        Self(name)
    }

    /// Location of this unit's listing relative to the output root.
    pub fn to_relative_path(&self) -> PathBuf {
        let mut path: PathBuf = self.0.split('.').collect();
        path.set_extension(UNIT_EXTENSION);
        path
    }
}

impl fmt::Display for UnitName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UnitName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_name_from_nested_path() {
        let name = UnitName::from_relative_path(Path::new("com/example/App.unit"));
        assert_eq!(name.as_str(), "com.example.App");
    }

    #[test]
    fn test_unit_name_keeps_foreign_extension() {
        let name = UnitName::from_relative_path(Path::new("static/app.css"));
        assert_eq!(name.as_str(), "static.app.css");
    }

    #[test]
    fn test_unit_name_ignores_cur_dir() {
        let name = UnitName::from_relative_path(Path::new("./com/example/Helper.unit"));
        assert_eq!(name, UnitName::from("com.example.Helper"));
    }

    #[test]
    fn test_unit_name_empty_path() {
        let name = UnitName::from_relative_path(Path::new(""));
        assert_eq!(name.as_str(), "");
    }

    #[test]
    fn test_unit_name_to_relative_path() {
        let name = UnitName::new("com.example.App");
        assert_eq!(
            name.to_relative_path(),
            Path::new("com").join("example").join("App.unit")
        );
        assert_eq!(UnitName::from_relative_path(&name.to_relative_path()), name);
    }
}
