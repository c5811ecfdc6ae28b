pub mod schema;

use std::path::{Path, PathBuf};

pub use schema::{ConfigMessage, GitConfig, StatuslineConfig};

use crate::error::StatuslineError;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "CCSTATUSLINE_CONFIG";

/// Load the config file, falling back to defaults.
///
/// A missing file is silent. An unreadable or unparseable file is logged and
/// ignored so the status line still renders.
pub fn load() -> StatuslineConfig {
    match config_path() {
        Some(path) if path.exists() => match load_from(&path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!("ignoring config {}: {}", path.display(), err);
                StatuslineConfig::default()
            }
        },
        _ => StatuslineConfig::default(),
    }
}

/// Read, parse and validate a config file.
///
/// Validation findings are logged. Fields with errors fall back to their
/// defaults; the rest of the file still applies.
pub fn load_from(path: &Path) -> Result<StatuslineConfig, StatuslineError> {
    let contents = std::fs::read_to_string(path)?;
    let mut config: StatuslineConfig = toml::from_str(&contents)?;

    for msg in config.validate() {
        match msg {
            ConfigMessage::Warning(w) => {
                tracing::warn!("config warning in {}: {}", path.display(), w);
            }
            ConfigMessage::Error(e) => {
                tracing::warn!("config error in {}: {}; using the default", path.display(), e);
            }
        }
    }
    config.reset_invalid();

    Ok(config)
}

/// `$CCSTATUSLINE_CONFIG`, else `<config dir>/ccstatusline/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .or_else(|| dirs::config_dir().map(|d| d.join("ccstatusline").join("config.toml")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = StatuslineConfig::default();
        assert_eq!(config.template, None);
        assert_eq!(config.compaction_threshold, 160_000);
        assert_eq!(config.stdin_timeout_ms, 100);
        assert!(config.git.enabled);
        assert_eq!(config.git.timeout_ms, 5000);
        assert_eq!(config.git.max_output_bytes, 10 * 1024 * 1024);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
template = "{{modelName}}"
compaction_threshold = 100000

[git]
enabled = false
"#;
        let config: StatuslineConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.template.as_deref(), Some("{{modelName}}"));
        assert_eq!(config.compaction_threshold, 100_000);
        assert_eq!(config.stdin_timeout_ms, 100);
        assert!(!config.git.enabled);
        assert_eq!(config.git.timeout_ms, 5000);
    }

    #[test]
    fn test_load_from_file() {
        let file = write_config("stdin_timeout_ms = 50\n");
        let config = load_from(file.path()).unwrap();
        assert_eq!(config.stdin_timeout_ms, 50);
    }

    #[test]
    fn test_invalid_field_resets_only_that_field() {
        let file = write_config(
            "template = \"{{modelName}}\"\ncompaction_threshold = 0\nstdin_timeout_ms = 50\n",
        );
        let config = load_from(file.path()).unwrap();
        assert_eq!(config.compaction_threshold, 160_000);
        assert_eq!(config.template.as_deref(), Some("{{modelName}}"));
        assert_eq!(config.stdin_timeout_ms, 50);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_reset_invalid_git_settings() {
        let mut config = StatuslineConfig {
            git: GitConfig {
                enabled: true,
                timeout_ms: 0,
                max_output_bytes: 0,
            },
            ..Default::default()
        };
        assert_eq!(config.validate().len(), 2);
        config.reset_invalid();
        assert_eq!(config.git, GitConfig::default());
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let file = write_config("template = [unclosed\n");
        assert!(matches!(
            load_from(file.path()).unwrap_err(),
            StatuslineError::TomlParse(_)
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = load_from(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, StatuslineError::Io(_)));
    }

    #[test]
    fn test_warnings_do_not_fail_load() {
        let file = write_config("stdin_timeout_ms = 5000\ntemplate = \"  \"\n");
        let config = load_from(file.path()).unwrap();
        assert_eq!(config.validate().len(), 2);
    }

    #[test]
    fn test_disabled_git_skips_git_checks() {
        let config = StatuslineConfig {
            git: GitConfig {
                enabled: false,
                timeout_ms: 0,
                max_output_bytes: 0,
            },
            ..Default::default()
        };
        assert!(config.validate().is_empty());
    }
}
