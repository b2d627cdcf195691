use super::types::Config;
use crate::config::expand_tilde;
use regex::Regex;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation failed:\n{}", .0.join("\n"))]
    ValidationList(Vec<String>),
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let yaml_string = fs::read_to_string(path).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read config file '{}': {}", path.display(), e),
        ))
    })?;

    let mut config: Config = serde_yaml::from_str(&yaml_string)?;

    expand_paths(&mut config);
    validate_config(&config)?;

    Ok(config)
}

/// Expands tilde (~) in all directory fields.
fn expand_paths(config: &mut Config) {
    config.source.dir = expand_tilde(&config.source.dir);
    config.archive.dir = expand_tilde(&config.archive.dir);
}

/// Checks everything that must hold before the pipeline may start,
/// collecting all problems rather than stopping at the first.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    if !config.source.dir.is_dir() {
        errors.push(format!(
            "source.dir '{}' is not an accessible directory",
            config.source.dir.display()
        ));
    }

    if !config.archive.dir.is_dir() {
        errors.push(format!(
            "archive.dir '{}' is not an accessible directory",
            config.archive.dir.display()
        ));
    }

    if config.archive.batch_size < 1 {
        errors.push("archive.batch_size must be at least 1".to_string());
    }

    if let Err(e) = Regex::new(&config.source.pattern) {
        errors.push(format!(
            "source.pattern '{}' is not a valid regex: {}",
            config.source.pattern, e
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationList(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{ArchiveConfig, DebounceConfig, SourceConfig};
    use std::io::Write;
    use tempfile::TempDir;

    fn make_config(source_dir: &Path, archive_dir: &Path) -> Config {
        Config {
            source: SourceConfig {
                dir: source_dir.to_path_buf(),
                pattern: ".*".to_string(),
                recursive: false,
                ignore_existing: false,
            },
            archive: ArchiveConfig {
                dir: archive_dir.to_path_buf(),
                prefix: String::new(),
                batch_size: 10,
                sequence_offset: 0,
            },
            debounce: DebounceConfig::default(),
        }
    }

    #[test]
    fn test_validate_accepts_good_config() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let config = make_config(src.path(), dst.path());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_collects_every_problem() {
        let config = Config {
            source: SourceConfig {
                dir: "/nonexistent/source".into(),
                pattern: "[unclosed".to_string(),
                recursive: false,
                ignore_existing: false,
            },
            archive: ArchiveConfig {
                dir: "/nonexistent/dest".into(),
                prefix: String::new(),
                batch_size: 0,
                sequence_offset: 0,
            },
            debounce: DebounceConfig::default(),
        };

        match validate_config(&config) {
            Err(ConfigError::ValidationList(errors)) => {
                assert_eq!(errors.len(), 4);
            }
            other => panic!("expected validation list, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_validate_rejects_file_as_source_dir() {
        let dst = TempDir::new().unwrap();
        let file_path = dst.path().join("not_a_dir");
        std::fs::File::create(&file_path)
            .unwrap()
            .write_all(b"x")
            .unwrap();

        let config = make_config(&file_path, dst.path());
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let yaml = format!(
            "source:\n  dir: {}\narchive:\n  dir: {}\n  batch_size: 2\ndebounce:\n  delay: 0s\n",
            src.path().display(),
            dst.path().display()
        );

        let config_dir = TempDir::new().unwrap();
        let config_path = config_dir.path().join("config.yml");
        std::fs::write(&config_path, yaml).unwrap();

        let config = load_config(&config_path).unwrap();
        assert_eq!(config.archive.batch_size, 2);
        assert_eq!(config.debounce.delay, std::time::Duration::ZERO);
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Path::new("/nonexistent/config.yml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
