//! Configuration loading from TOML files

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use pxline_pxweb::regions::FETCH_START_YEAR;
use pxline_pxweb::{DEFAULT_BATCH_SIZE, DEFAULT_DATASET_URL, DEFAULT_DELAY, DEFAULT_FORMAT};
use pxline_pxweb::TableProfile;
use serde::Deserialize;

/// Global configuration for pxline
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub extract: ExtractConfig,
    pub profile: TableProfile,
    pub output: OutputConfig,
    pub http: HttpSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Table URL (PX-Web UI or API form)
    pub dataset_url: String,
    pub format: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            dataset_url: DEFAULT_DATASET_URL.to_string(),
            format: DEFAULT_FORMAT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Postal codes per request
    pub batch_size: usize,
    /// Pause between batch requests
    pub delay_ms: u64,
    /// First year requested when no years are given
    pub start_year: i32,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            delay_ms: DEFAULT_DELAY.as_millis() as u64,
            start_year: FETCH_START_YEAR,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./stat_fin_data_output"),
        }
    }
}

/// Timeouts in seconds
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub connect_timeout: u64,
    pub request_timeout: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        let http = pxline_core::HttpConfig::default();
        Self {
            connect_timeout: http.connect_timeout.as_secs(),
            request_timeout: http.request_timeout.as_secs(),
        }
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./pxline.toml (current directory)
    /// 2. ~/.config/pxline/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("pxline.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(dirs) = directories::ProjectDirs::from("", "", "pxline") {
            let user_config = dirs.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.extract.batch_size > 0,
            "extract.batch_size must be positive"
        );
        anyhow::ensure!(
            !self.source.format.is_empty(),
            "source.format must not be empty"
        );
        Ok(())
    }

    /// Print effective settings as a table on stderr
    pub fn print(&self) {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_header(vec![
                Cell::new("Setting").fg(Color::Cyan),
                Cell::new("Value").fg(Color::Cyan),
            ]);

        let profile = &self.profile;
        table.add_row(vec!["Dataset URL", &self.source.dataset_url]);
        table.add_row(vec!["Format", &self.source.format]);
        table.add_row(vec!["Batch size", &self.extract.batch_size.to_string()]);
        table.add_row(vec!["Batch delay", &format!("{}ms", self.extract.delay_ms)]);
        table.add_row(vec!["Start year", &self.extract.start_year.to_string()]);
        table.add_row(vec![
            "Axis codes",
            &format!(
                "{} / {} / {} / {}",
                profile.year_code,
                profile.postal_code_code,
                profile.building_type_code,
                profile.metric_code
            ),
        ]);
        table.add_row(vec![
            "Default building types",
            &profile.default_building_types.join(","),
        ]);
        table.add_row(vec!["Default metrics", &profile.default_metrics.join(",")]);
        table.add_row(vec!["Output directory", &self.output.dir.display().to_string()]);
        table.add_row(vec![
            "Timeouts",
            &format!(
                "connect {}s, request {}s",
                self.http.connect_timeout, self.http.request_timeout
            ),
        ]);

        eprintln!("\n{table}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.extract.batch_size, 30);
        assert_eq!(config.extract.delay_ms, 500);
        assert_eq!(config.extract.start_year, 2018);
        assert_eq!(config.source.format, "json-stat2");
        assert_eq!(config.profile, TableProfile::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_config_toml() {
        let toml = r#"
[source]
dataset_url = "https://pxdata.stat.fi/PXWeb/pxweb/fi/StatFin/statfin_ashi_pxt_13mu.px/"

[extract]
batch_size = 10
delay_ms = 1000

[profile]
default_metrics = ["lkm_julk20"]

[output]
dir = "/tmp/px"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.extract.batch_size, 10);
        assert_eq!(config.extract.delay_ms, 1000);
        assert_eq!(config.extract.start_year, 2018);
        assert_eq!(config.source.format, "json-stat2");
        assert_eq!(config.profile.default_metrics, ["lkm_julk20"]);
        assert_eq!(config.profile.year_code, "Vuosi");
        assert_eq!(config.output.dir, PathBuf::from("/tmp/px"));
    }

    #[test]
    fn zero_batch_size_rejected() {
        let config: Config = toml::from_str("[extract]\nbatch_size = 0\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("batch_size"));
    }

    #[test]
    fn from_file_reads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pxline.toml");
        std::fs::write(&path, "[http]\nrequest_timeout = 15\n").unwrap();
        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.http.request_timeout, 15);
        assert_eq!(config.http.connect_timeout, 30);
    }

    #[test]
    fn from_file_reports_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[extract\nbatch_size = ").unwrap();
        let err = Config::from_file(&path).unwrap_err();
        assert!(format!("{err}").contains("Failed to parse config file"));
    }
}
