//! Configuration file discovery and TOML helpers
//!
//! Arcana services resolve their configuration file following the
//! **[ARC-INIT-005]** priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. OS-dependent default location (fallback)

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Resolve a service configuration file path.
///
/// `cli_arg` wins over the environment variable named by `env_var_name`,
/// which wins over the platform default location for `file_name`.
/// The returned path is not required to exist; callers decide whether a
/// missing file is an error or means compiled defaults.
pub fn resolve_config_path(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    file_name: &str,
) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        return PathBuf::from(path);
    }

    // Priority 3: OS-dependent default
    default_config_path(file_name)
}

/// Platform default location for an Arcana configuration file.
///
/// Linux prefers `~/.config/arcana/<file>` and falls back to
/// `/etc/arcana/<file>` when the user directory is unavailable.
pub fn default_config_path(file_name: &str) -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("arcana").join(file_name))
        .unwrap_or_else(|| PathBuf::from("/etc/arcana").join(file_name))
}

/// Read and deserialize a TOML file.
pub fn read_toml_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Serialize and write a TOML file.
///
/// Writes to a sibling temporary file and renames into place so a crash
/// mid-write never leaves a truncated config behind.
pub fn write_toml_file<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(value)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, content)?;
    std::fs::rename(&tmp_path, path)?;

    tracing::debug!(path = %path.display(), "Configuration written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct SampleConfig {
        name: String,
        count: u32,
    }

    #[test]
    fn test_write_then_read_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.toml");

        let config = SampleConfig {
            name: "arcana".to_string(),
            count: 3,
        };

        write_toml_file(&config, &path).unwrap();
        let loaded: SampleConfig = read_toml_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_read_missing_file_is_config_error() {
        let result: Result<SampleConfig> =
            read_toml_file(Path::new("/nonexistent/arcana/sample.toml"));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_cli_arg_wins_over_default() {
        let cli = PathBuf::from("/tmp/explicit.toml");
        let resolved = resolve_config_path(
            Some(cli.as_path()),
            "ARCANA_TEST_UNSET_VAR",
            "service.toml",
        );
        assert_eq!(resolved, cli);
    }

    #[test]
    fn test_default_path_ends_with_file_name() {
        let resolved = resolve_config_path(None, "ARCANA_TEST_UNSET_VAR", "service.toml");
        assert!(resolved.ends_with("service.toml"));
    }
}
