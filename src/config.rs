use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::data::error::DashboardError;
use crate::data::filter::HourRange;

pub const DATA_FILE_NAME: &str = "data.parquet";

pub const ENV_CONFIG: &str = "SBB_DELAYS_CONFIG";
pub const ENV_DATA: &str = "SBB_DELAYS_DATA";
pub const ENV_DEBOUNCE_MS: &str = "SBB_DELAYS_DEBOUNCE_MS";

// ---------------------------------------------------------------------------
// DashboardConfig
// ---------------------------------------------------------------------------

/// Startup settings. Every field has a default, so a config file only needs
/// the keys it changes:
///
/// ```json
/// { "data_path": "/srv/sbb/data.parquet", "default_hours": [5, 23] }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Dataset opened at startup.
    pub data_path: PathBuf,
    /// Initial hour-range selection, inclusive.
    pub default_hours: [u8; 2],
    /// Quiet period after a filter change before the pipeline reruns.
    pub debounce_ms: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            default_hours: [HourRange::DAYTIME.min(), HourRange::DAYTIME.max()],
            debounce_ms: 150,
        }
    }
}

impl DashboardConfig {
    /// Defaults, then the JSON file named by `SBB_DELAYS_CONFIG`, then the
    /// `SBB_DELAYS_DATA` / `SBB_DELAYS_DEBOUNCE_MS` variables.
    pub fn from_env() -> Self {
        let mut config = match std::env::var_os(ENV_CONFIG) {
            Some(path) => Self::from_file(Path::new(&path)).unwrap_or_else(|e| {
                log::warn!("Ignoring config file {path:?}: {e:#}");
                Self::default()
            }),
            None => Self::default(),
        };
        config.apply_overrides(
            std::env::var_os(ENV_DATA).map(PathBuf::from),
            std::env::var(ENV_DEBOUNCE_MS).ok(),
        );
        config
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;
        let text = std::fs::read_to_string(path).context("reading config file")?;
        let mut config: Self = serde_json::from_str(&text).context("parsing config file")?;
        if let Err(e) = config.default_hour_range() {
            log::warn!("Ignoring default_hours in {}: {e}", path.display());
            config.default_hours = Self::default().default_hours;
        }
        Ok(config)
    }

    fn apply_overrides(&mut self, data_path: Option<PathBuf>, debounce_ms: Option<String>) {
        if let Some(path) = data_path {
            self.data_path = path;
        }
        if let Some(raw) = debounce_ms {
            match raw.trim().parse() {
                Ok(ms) => self.debounce_ms = ms,
                Err(_) => log::warn!("Ignoring {ENV_DEBOUNCE_MS}={raw:?}: not a number of milliseconds"),
            }
        }
    }

    pub fn default_hour_range(&self) -> Result<HourRange, DashboardError> {
        HourRange::new(self.default_hours[0], self.default_hours[1])
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// `data.parquet` next to the executable when present, else in the working
/// directory.
fn default_data_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DATA_FILE_NAME)))
        .filter(|candidate| candidate.is_file())
        .unwrap_or_else(|| PathBuf::from(DATA_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_dashboard() {
        let config = DashboardConfig::default();
        assert_eq!(config.default_hours, [6, 22]);
        assert_eq!(config.debounce(), Duration::from_millis(150));
        assert!(config.data_path.ends_with(DATA_FILE_NAME));
        let hours = config.default_hour_range().unwrap();
        assert_eq!((hours.min(), hours.max()), (6, 22));
    }

    #[test]
    fn partial_config_file_keeps_other_defaults() {
        let path = std::env::temp_dir().join(format!("sbb-delays-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "default_hours": [0, 23] }"#).unwrap();
        let config = DashboardConfig::from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(config.default_hours, [0, 23]);
        assert_eq!(config.debounce_ms, 150);
    }

    #[test]
    fn overrides_replace_file_values() {
        let mut config = DashboardConfig::default();
        config.apply_overrides(Some(PathBuf::from("/tmp/other.csv")), Some("0".into()));
        assert_eq!(config.data_path, PathBuf::from("/tmp/other.csv"));
        assert_eq!(config.debounce(), Duration::ZERO);

        config.apply_overrides(None, Some("soon".into()));
        assert_eq!(config.debounce_ms, 0);
    }

    #[test]
    fn inverted_default_hours_are_rejected() {
        let config = DashboardConfig {
            default_hours: [22, 6],
            ..DashboardConfig::default()
        };
        assert!(config.default_hour_range().is_err());
    }

    #[test]
    fn config_file_with_bad_hours_falls_back_to_daytime() {
        let files = [
            ("inverted", r#"{ "default_hours": [22, 6], "debounce_ms": 40 }"#),
            ("too-late", r#"{ "default_hours": [6, 30] }"#),
        ];
        for (name, body) in files {
            let path = std::env::temp_dir()
                .join(format!("sbb-delays-config-{}-{name}.json", std::process::id()));
            std::fs::write(&path, body).unwrap();
            let config = DashboardConfig::from_file(&path).unwrap();
            std::fs::remove_file(&path).ok();

            assert_eq!(config.default_hours, [6, 22]);
            assert_eq!(config.default_hour_range(), Ok(HourRange::DAYTIME));
        }
    }
}
