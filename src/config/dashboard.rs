// src/config/dashboard.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

pub const DEFAULT_DASHBOARD_CONFIG_PATH: &str = "config/dashboard.toml";
pub const ENV_DASHBOARD_CONFIG_PATH: &str = "DASHBOARD_CONFIG_PATH";
pub const ENV_SPREADSHEET_ID: &str = "DASHBOARD_SPREADSHEET_ID";
pub const ENV_FRESHNESS_SECS: &str = "DASHBOARD_FRESHNESS_SECS";
pub const ENV_REFRESH_SECS: &str = "DASHBOARD_REFRESH_SECS";

fn default_kpi_sheet() -> String {
    "Calculation".to_string()
}
fn default_activity_sheet() -> String {
    "Recent Scanned".to_string()
}
fn default_freshness_secs() -> u64 {
    10
}
fn default_max_stale_secs() -> u64 {
    120
}
fn default_client_validity_secs() -> u64 {
    3600
}
fn default_refresh_interval_secs() -> u64 {
    20
}
fn default_recent_count() -> usize {
    crate::recent::DEFAULT_RECENT_COUNT
}
fn default_http_timeout_secs() -> u64 {
    10
}

/// One operator shown next to a production line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OperatorEntry {
    pub area: String,
    pub line: String,
    pub name: String,
    /// Asset name of the photo; resolved by the front-end.
    #[serde(default)]
    pub photo: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Spreadsheet holding both tables.
    #[serde(default)]
    pub spreadsheet_id: String,
    #[serde(default = "default_kpi_sheet")]
    pub kpi_sheet: String,
    #[serde(default = "default_activity_sheet")]
    pub activity_sheet: String,
    /// A loaded table is served from cache for this long.
    #[serde(default = "default_freshness_secs")]
    pub freshness_secs: u64,
    /// After a failed refresh, the last good table is served until it is this old.
    #[serde(default = "default_max_stale_secs")]
    pub max_stale_secs: u64,
    /// Authenticated client is rebuilt after this long.
    #[serde(default = "default_client_validity_secs")]
    pub client_validity_secs: u64,
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    #[serde(default = "default_recent_count")]
    pub recent_count: usize,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    #[serde(default)]
    pub operators: Vec<OperatorEntry>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            kpi_sheet: default_kpi_sheet(),
            activity_sheet: default_activity_sheet(),
            freshness_secs: default_freshness_secs(),
            max_stale_secs: default_max_stale_secs(),
            client_validity_secs: default_client_validity_secs(),
            refresh_interval_secs: default_refresh_interval_secs(),
            recent_count: default_recent_count(),
            http_timeout_secs: default_http_timeout_secs(),
            operators: Vec::new(),
        }
    }
}

impl DashboardConfig {
    /// Parse a TOML file, then apply env overrides and sanitize.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading dashboard config from {}", path.display()))?;
        let cfg: DashboardConfig = toml::from_str(&data)
            .with_context(|| format!("parsing dashboard config {}", path.display()))?;
        cfg.finish()
    }

    /// Load using env var + fallbacks:
    /// 1) $DASHBOARD_CONFIG_PATH (must exist)
    /// 2) config/dashboard.toml
    /// 3) built-in defaults (spreadsheet id then has to come from the env)
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = env::var(ENV_DASHBOARD_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!(
                    "{ENV_DASHBOARD_CONFIG_PATH} points to non-existent path {}",
                    pb.display()
                ));
            }
            return Self::load_from_file(&pb);
        }
        let default_p = PathBuf::from(DEFAULT_DASHBOARD_CONFIG_PATH);
        if default_p.exists() {
            return Self::load_from_file(&default_p);
        }
        Self::default().finish()
    }

    fn finish(mut self) -> Result<Self> {
        self.apply_env_overrides();
        self.sanitize();
        if self.spreadsheet_id.trim().is_empty() {
            return Err(anyhow!(
                "no spreadsheet id: set `spreadsheet_id` in the config file or {ENV_SPREADSHEET_ID}"
            ));
        }
        Ok(self)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(id) = env::var(ENV_SPREADSHEET_ID) {
            if !id.trim().is_empty() {
                self.spreadsheet_id = id.trim().to_string();
            }
        }
        if let Some(v) = parse_secs_env(env::var(ENV_FRESHNESS_SECS).ok()) {
            self.freshness_secs = v;
        }
        if let Some(v) = parse_secs_env(env::var(ENV_REFRESH_SECS).ok()) {
            self.refresh_interval_secs = v;
        }
    }

    fn sanitize(&mut self) {
        self.freshness_secs = self.freshness_secs.max(1);
        self.refresh_interval_secs = self.refresh_interval_secs.max(1);
        self.client_validity_secs = self.client_validity_secs.max(1);
        self.http_timeout_secs = self.http_timeout_secs.max(1);
        // Stale fallback never shorter than the freshness window itself.
        self.max_stale_secs = self.max_stale_secs.max(self.freshness_secs);
        if self.recent_count == 0 {
            self.recent_count = default_recent_count();
        }
    }

    pub fn freshness(&self) -> Duration {
        Duration::from_secs(self.freshness_secs)
    }

    pub fn max_stale(&self) -> Duration {
        Duration::from_secs(self.max_stale_secs)
    }

    pub fn client_validity(&self) -> Duration {
        Duration::from_secs(self.client_validity_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

// Ignore unparsable values; callers keep their current setting.
fn parse_secs_env(raw: Option<String>) -> Option<u64> {
    raw.and_then(|s| s.trim().parse::<u64>().ok())
}
