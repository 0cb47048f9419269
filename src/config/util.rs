//! Configuration utility functions.

use std::path::{Path, PathBuf};

/// Find config file by searching upward from `start`.
///
/// Returns the path of the first `config_name` found in `start` or one of
/// its ancestors.
///
/// ```text
/// /home/user/app/src/main/    ← start
/// /home/user/app/warmswap.toml ← found
/// ```
pub fn find_config_file(start: &Path, config_name: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.exists().then(|| config_name.to_path_buf());
    }

    start
        .ancestors()
        .map(|dir| dir.join(config_name))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_find_config_in_ancestor() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a/b/c");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("warmswap.toml"), "").unwrap();

        let found = find_config_file(&nested, Path::new("warmswap.toml")).unwrap();
        assert_eq!(found, dir.path().join("warmswap.toml"));
    }

    #[test]
    fn test_find_config_nearest_wins() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("inner");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("warmswap.toml"), "").unwrap();
        fs::write(nested.join("warmswap.toml"), "").unwrap();

        let found = find_config_file(&nested, Path::new("warmswap.toml")).unwrap();
        assert_eq!(found, nested.join("warmswap.toml"));
    }

    #[test]
    fn test_find_config_absolute_missing() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(find_config_file(dir.path(), &missing).is_none());
    }
}
