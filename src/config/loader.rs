//! Configuration loading from disk.
//!
//! The main file is parsed first; every `include` entry is resolved relative
//! to the directory of the file naming it and merged recursively. A file that
//! was already read is skipped, so include cycles terminate.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::error::ConfigError;
use crate::config::schema::LoggingConfig;

/// Merged configuration plus every file that contributed to it.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub config: LoggingConfig,
    /// Files read, main file first. These are the paths to watch.
    pub files: Vec<PathBuf>,
}

/// Load a configuration file and its includes. Validation is left to the
/// routing table builder.
pub fn load_config(path: &Path) -> Result<LoadedConfig, ConfigError> {
    let mut files = Vec::new();
    let config = load_recursive(path, &mut files)?;
    Ok(LoadedConfig { config, files })
}

/// Parse a configuration document without touching the filesystem.
/// `include` entries are kept but not resolved.
pub fn parse_config(content: &str) -> Result<LoggingConfig, ConfigError> {
    toml::from_str(content).map_err(|source| ConfigError::Parse {
        path: PathBuf::from("<inline>"),
        source,
    })
}

fn load_recursive(path: &Path, visited: &mut Vec<PathBuf>) -> Result<LoggingConfig, ConfigError> {
    let path = absolute(path);
    visited.push(path.clone());

    let content = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    let mut config: LoggingConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.clone(),
        source,
    })?;

    let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
    for include in std::mem::take(&mut config.include) {
        let include_path = absolute(&base.join(&include));
        if visited.contains(&include_path) {
            tracing::debug!(path = %include_path.display(), "Skipping already loaded include");
            continue;
        }
        let included = load_recursive(&include_path, visited)?;
        config.merge(included);
    }

    Ok(config)
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_with_includes() {
        let dir = tempfile::tempdir().unwrap();
        let main = write(
            dir.path(),
            "main.toml",
            r#"
            include = ["extra.toml"]

            [[targets]]
            name = "a"
            type = "memory"
            "#,
        );
        write(
            dir.path(),
            "extra.toml",
            r#"
            include = ["main.toml"]

            [[targets]]
            name = "b"
            type = "null"

            [[rules]]
            write_to = ["a", "b"]
            "#,
        );

        let loaded = load_config(&main).unwrap();
        let names: Vec<_> = loaded.config.targets.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(loaded.config.rules.len(), 1);
        assert_eq!(loaded.files.len(), 2);
        assert!(loaded.files[0].ends_with("main.toml"));
        assert!(loaded.files[1].ends_with("extra.toml"));
        assert!(loaded.config.include.is_empty());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_parse_error_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "bad.toml", "[[targets]\nname = 1");
        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn test_parse_inline() {
        let config = parse_config("[settings]\nreload_delay_ms = 5").unwrap();
        assert_eq!(config.settings.reload_delay_ms, 5);
        assert!(parse_config("settings = 3").is_err());
    }
}
