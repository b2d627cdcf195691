use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub debounce: DebounceConfig,
}

/// The watched directory and what counts as a candidate file in it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub dir: PathBuf,

    /// Regex matched against file names (not full paths).
    #[serde(default = "default_pattern")]
    pub pattern: String,

    /// Also watch and scan subdirectories.
    #[serde(default)]
    pub recursive: bool,

    /// Skip the initial scan; only files appearing after start are archived.
    #[serde(default)]
    pub ignore_existing: bool,
}

fn default_pattern() -> String {
    ".*".to_string()
}

/// Where archives are written and how they are named.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    pub dir: PathBuf,

    /// Prepended to the sequence number in archive file names.
    #[serde(default)]
    pub prefix: String,

    /// Number of files per archive.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// First sequence number to assign. Lets a restarted run continue a
    /// numbering series without colliding with earlier archives.
    #[serde(default)]
    pub sequence_offset: u64,
}

fn default_batch_size() -> usize {
    4000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebounceConfig {
    /// Quiet window a file must survive without further change events
    /// before it is considered settled.
    #[serde(with = "duration_format", default = "default_delay")]
    pub delay: Duration,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            delay: default_delay(),
        }
    }
}

fn default_delay() -> Duration {
    Duration::from_secs(60)
}

// Custom serde module for duration parsing ("60s", "2m", "0s", or bare seconds)
mod duration_format {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_duration(*duration))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    pub(super) fn format_duration(d: Duration) -> String {
        let secs = d.as_secs();
        if secs >= 3600 && secs % 3600 == 0 {
            format!("{}h", secs / 3600)
        } else if secs >= 60 && secs % 60 == 0 {
            format!("{}m", secs / 60)
        } else {
            format!("{}s", secs)
        }
    }

    pub(super) fn parse_duration(s: &str) -> Result<Duration, String> {
        let s = s.trim();
        let (value, unit) = match s.find(|c: char| !c.is_ascii_digit()) {
            Some(idx) => s.split_at(idx),
            None => (s, "s"),
        };

        let value: u64 = value
            .parse()
            .map_err(|_| format!("invalid duration '{}'", s))?;

        match unit.trim() {
            "s" | "sec" | "secs" => Ok(Duration::from_secs(value)),
            "m" | "min" | "mins" => Ok(Duration::from_secs(value * 60)),
            "h" | "hr" | "hrs" => Ok(Duration::from_secs(value * 3600)),
            other => Err(format!("unknown duration unit '{}'", other)),
        }
    }
}
