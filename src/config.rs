//! Runtime configuration.
//!
//! Read from `$O2D_CONFIG`, falling back to `./o2d.json`. Every field has a
//! default, so a missing file means the stock O2D sheet on port 8021.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::StartupError;
use crate::google_api::sheets::DEFAULT_BASE_URL;
use crate::table::DateFormat;

pub const CONFIG_ENV: &str = "O2D_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "o2d.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub spreadsheet_id: String,
    /// A1 range including the sheet name.
    pub range: String,
    pub credentials_path: PathBuf,
    pub token_path: PathBuf,
    pub sheets_base_url: String,
    pub host: String,
    pub port: u16,
    /// Earliest date the picker offers.
    pub min_date: NaiveDate,
    pub initial_start_date: NaiveDate,
    pub initial_end_date: NaiveDate,
    /// Day/month order of the sheet's timestamps.
    pub date_format: DateFormat,
    pub page_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spreadsheet_id: "1GTApxk_-pGgoPxXbhR0rSz_E9YuaB93kj8MjRzEuUOc".to_string(),
            range: "O2D Client for Osaa Retail!A:N".to_string(),
            credentials_path: PathBuf::from("credentials.json"),
            token_path: PathBuf::from("token.json"),
            sheets_base_url: DEFAULT_BASE_URL.to_string(),
            host: "127.0.0.1".to_string(),
            port: 8021,
            min_date: ymd(2023, 1, 1),
            initial_start_date: ymd(2023, 8, 1),
            initial_end_date: ymd(2023, 8, 9),
            date_format: DateFormat::DayFirst,
            page_size: 10,
        }
    }
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

impl Config {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn validate(&self) -> Result<(), StartupError> {
        if self.spreadsheet_id.trim().is_empty() || self.range.trim().is_empty() {
            return Err(StartupError::Config(
                "spreadsheetId and range must not be empty".to_string(),
            ));
        }
        if self.initial_start_date < self.min_date {
            return Err(StartupError::Config(format!(
                "initialStartDate {} is before minDate {}",
                self.initial_start_date, self.min_date
            )));
        }
        if self.initial_end_date < self.initial_start_date {
            return Err(StartupError::Config(format!(
                "initialEndDate {} is before initialStartDate {}",
                self.initial_end_date, self.initial_start_date
            )));
        }
        if self.page_size == 0 {
            return Err(StartupError::Config("pageSize must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Where to look for the config file.
pub fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Load and validate the config file; a missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<Config, StartupError> {
    let config = if path.exists() {
        let content = fs::read_to_string(path).map_err(|e| {
            StartupError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            StartupError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?
    } else {
        log::info!("No config at {}, using defaults", path.display());
        Config::default()
    };

    config.validate()?;
    Ok(config)
}
