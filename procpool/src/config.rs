//! Pool and manager configuration, loadable as plain structs or from a TOML
//! file via the `config` crate.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default memory ceiling applied when a pool config or one-shot submission
/// doesn't specify one.
pub const DEFAULT_MEMORY_LIMIT_MB: u32 = 4096;

/// Default number of workers in a pool whose config omits `worker_count`.
pub const DEFAULT_WORKER_COUNT: usize = 1;

/// Default interval for the periodic stats-logging loop.
pub const DEFAULT_STATS_INTERVAL: Duration = Duration::from_millis(1000);

/// One pool's configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    pub pool_name: String,
    pub worker_script: PathBuf,
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    #[serde(default = "default_memory_limit")]
    pub worker_memory_limit_mb: u32,
}

fn default_worker_count() -> usize {
    DEFAULT_WORKER_COUNT
}

fn default_memory_limit() -> u32 {
    DEFAULT_MEMORY_LIMIT_MB
}

impl PoolConfig {
    /// `true` if this entry is missing a required field and should be
    /// logged and skipped rather than spawned.
    pub fn is_incomplete(&self) -> bool {
        self.pool_name.trim().is_empty() || self.worker_script.as_os_str().is_empty()
    }
}

/// Manager-wide configuration: the ambient knobs that aren't part of any
/// one pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Whether the periodic stats-logging loop runs at all.
    pub enable_stats_logging: bool,
    /// Interval between stats-logging ticks, serialized in milliseconds.
    #[serde(with = "duration_millis")]
    pub stats_interval: Duration,
    /// Observational only: the stats-logging loop warns once the number of
    /// in-flight tasks across all pools exceeds this, but nothing ever
    /// rejects or queues work because of it — dispatch is never throttled.
    pub pending_queue_high_water_mark: Option<usize>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            enable_stats_logging: false,
            stats_interval: DEFAULT_STATS_INTERVAL,
            pending_queue_high_water_mark: None,
        }
    }
}

/// On-disk shape of a pool-definitions file: a bare list under a `pools`
/// key, loaded with [`load_pool_configs`].
#[derive(Debug, Clone, Deserialize)]
struct PoolConfigFile {
    #[serde(default)]
    pools: Vec<PoolConfig>,
}

/// Loads a list of [`PoolConfig`] entries from a TOML (or JSON/YAML — the
/// `config` crate picks the format up from the extension) file, the same
/// way the host application loads its own settings. Entries that fail
/// `PoolConfig::is_incomplete` are not filtered out here — that happens in
/// `init_pools`, the single place the log-and-skip policy is enforced.
pub fn load_pool_configs(path: impl AsRef<Path>) -> Result<Vec<PoolConfig>, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path.as_ref()))
        .build()?;
    let file: PoolConfigFile = settings.try_deserialize()?;
    Ok(file.pools)
}

/// Loads [`ManagerConfig`] from a file, falling back to
/// [`ManagerConfig::default`] for any field the file omits.
pub fn load_manager_config(path: impl AsRef<Path>) -> Result<ManagerConfig, config::ConfigError> {
    let defaults = ManagerConfig::default();
    let settings = config::Config::builder()
        .set_default("enable_stats_logging", defaults.enable_stats_logging)?
        .set_default("stats_interval", defaults.stats_interval.as_millis() as i64)?
        .add_source(config::File::from(path.as_ref()))
        .build()?;
    settings.try_deserialize()
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
