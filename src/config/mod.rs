pub mod generate;
pub mod parse;
pub mod types;

use std::path::{Path, PathBuf};

pub use parse::{load_config, validate_config, ConfigError};
pub use types::{ArchiveConfig, Config, DebounceConfig, SourceConfig};

/// Expands tilde (~) in paths to the user's home directory.
/// Returns the path unchanged if it doesn't start with a tilde or the home
/// directory cannot be determined.
pub fn expand_tilde(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();

    if let Some(rest) = path_str.strip_prefix("~/") {
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(rest);
        }
    } else if path_str == "~" {
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir;
        }
    }

    path.to_path_buf()
}

/// Resolves the config file path from an explicit argument or the default
/// locations, in order:
/// 1. Explicit path (if provided, with tilde expansion)
/// 2. ~/.config/tarspool/config.yml
/// 3. /etc/tarspool/config.yml
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(expand_tilde(path));
    }

    if let Some(home_dir) = dirs::home_dir() {
        let user_config = home_dir.join(".config/tarspool/config.yml");
        if user_config.exists() {
            return Some(user_config);
        }
    }

    let system_config = PathBuf::from("/etc/tarspool/config.yml");
    if system_config.exists() {
        return Some(system_config);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_tilde_on_plain_path() {
        let path = Path::new("/var/data/out");
        assert_eq!(expand_tilde(path), PathBuf::from("/var/data/out"));
    }

    #[test]
    fn test_expand_tilde_on_home_relative_path() {
        if let Some(home) = dirs::home_dir() {
            let expanded = expand_tilde(Path::new("~/exports"));
            assert_eq!(expanded, home.join("exports"));
        }
    }

    #[test]
    fn test_resolve_explicit_path_wins() {
        let resolved = resolve_config_path(Some(Path::new("/tmp/custom.yml")));
        assert_eq!(resolved, Some(PathBuf::from("/tmp/custom.yml")));
    }
}
