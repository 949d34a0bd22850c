//! Startup configuration.
//!
//! Loaded once from, in increasing priority:
//! 1. built-in defaults
//! 2. the TOML file given on the command line (optional)
//! 3. `INFLUXDB_URL`, `INFLUXDB_TOKEN`, `INFLUXDB_ORG`, `INFLUXDB_BUCKET`
//! 4. `HOME_ENV_` prefixed variables, `__` separating sections
//!    (e.g. `HOME_ENV_PUBLICATION__PERIOD_MS=30000`)

use std::{path::Path, str::FromStr, time::Duration};

use anyhow::{anyhow, bail};
use backon::ConstantBuilder;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use log::LevelFilter;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "home-env-monitor.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: String,
    pub acquisition: TaskConfig,
    pub presentation: TaskConfig,
    pub publication: PublicationConfig,
    pub setup_retry: RetryConfig,
    pub sensor: I2cDeviceConfig,
    pub display: I2cDeviceConfig,
    pub sink: SinkConfig,
    pub influxdb: InfluxDbConfig,
    pub sqlite: SqliteConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            acquisition: TaskConfig { period_ms: 1000 },
            presentation: TaskConfig { period_ms: 2000 },
            publication: PublicationConfig::default(),
            setup_retry: RetryConfig::default(),
            sensor: I2cDeviceConfig {
                i2c_bus: 1,
                address: 0x76,
            },
            display: I2cDeviceConfig {
                i2c_bus: 1,
                address: 0x3c,
            },
            sink: SinkConfig::default(),
            influxdb: InfluxDbConfig::default(),
            sqlite: SqliteConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TaskConfig {
    pub period_ms: u64,
}

impl TaskConfig {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublicationConfig {
    pub period_ms: u64,
    /// Series (measurement) name the readings are published under.
    pub series: String,
}

impl PublicationConfig {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }
}

impl Default for PublicationConfig {
    fn default() -> Self {
        Self {
            period_ms: 10_000,
            series: "measurement".to_string(),
        }
    }
}

/// Constant backoff applied to each capability's one-time setup.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub delay_ms: u64,
    pub max_times: usize,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            delay_ms: 100,
            max_times: 20,
        }
    }
}

impl RetryConfig {
    pub fn builder(&self) -> ConstantBuilder {
        ConstantBuilder::default()
            .with_delay(Duration::from_millis(self.delay_ms))
            .with_max_times(self.max_times)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct I2cDeviceConfig {
    pub i2c_bus: u8,
    pub address: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    #[default]
    InfluxDb,
    Sqlite,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SinkConfig {
    pub kind: SinkKind,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InfluxDbConfig {
    pub url: String,
    pub token: String,
    pub org: String,
    pub bucket: String,
    pub timeout_ms: u64,
}

impl Default for InfluxDbConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            token: String::new(),
            org: String::new(),
            bucket: String::new(),
            timeout_ms: 3000,
        }
    }
}

// Keeps the token out of logs.
impl std::fmt::Debug for InfluxDbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InfluxDbConfig")
            .field("url", &self.url)
            .field("token", &"<redacted>")
            .field("org", &self.org)
            .field("bucket", &self.bucket)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SqliteConfig {
    pub path: String,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: "./home-env-log.db".to_string(),
        }
    }
}

impl Config {
    /// Loads the configuration. A missing file is not an error.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("INFLUXDB_").map(|key| format!("influxdb.{key}").into()))
            .merge(Env::prefixed("HOME_ENV_").split("__"))
            .extract()
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.log_level_filter()?;

        for (name, period_ms) in [
            ("acquisition", self.acquisition.period_ms),
            ("presentation", self.presentation.period_ms),
            ("publication", self.publication.period_ms),
        ] {
            if period_ms == 0 {
                bail!("{name}.period_ms must be greater than zero");
            }
        }

        if self.publication.series.is_empty() {
            bail!("publication.series must not be empty");
        }

        if !matches!(self.sensor.address, 0x76 | 0x77) {
            bail!(
                "sensor.address must be 0x76 or 0x77, got {:#04x}",
                self.sensor.address
            );
        }

        if self.sink.kind == SinkKind::InfluxDb {
            if self.influxdb.url.is_empty() {
                bail!("influxdb.url is required (set INFLUXDB_URL)");
            }
            if self.influxdb.bucket.is_empty() {
                bail!("influxdb.bucket is required (set INFLUXDB_BUCKET)");
            }
        }

        Ok(())
    }

    pub fn log_level_filter(&self) -> Result<LevelFilter, anyhow::Error> {
        LevelFilter::from_str(&self.log_level)
            .map_err(|_| anyhow!("Invalid log_level '{}'", self.log_level))
    }
}
