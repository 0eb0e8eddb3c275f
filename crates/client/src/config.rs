//! Client configuration loaded from the environment.
use std::env;
use std::time::Duration;

use conflict_runtime::EngineConfig;

/// Everything the `conflict` binary needs to start.
#[derive(Clone, Debug, Default)]
pub struct ClientConfig {
    pub engine: EngineConfig,
    pub skirmish: SkirmishConfig,
    pub logging: LoggingConfig,
    /// Append accepted fights to a JSON-lines file in the data directory.
    pub audit_log: bool,
}

impl ClientConfig {
    /// Construct configuration from environment variables.
    ///
    /// Engine tunables are read by [`EngineConfig::from_env`]. In addition:
    /// - `CONFLICT_FIGHTS_PER_SOLDIER` - Fights each soldier attempts (default: 5)
    /// - `CONFLICT_FIGHT_PACE_MS` - Pause between a soldier's fights (default: 20)
    /// - `CONFLICT_LOG_FILE` - Also log to a file (default: false)
    /// - `CONFLICT_AUDIT_LOG` - Persist contributions to disk (default: false)
    pub fn from_env() -> Self {
        let mut config = Self {
            engine: EngineConfig::from_env(),
            ..Self::default()
        };

        if let Some(fights) = read_env::<u32>("CONFLICT_FIGHTS_PER_SOLDIER") {
            config.skirmish.fights_per_soldier = fights.max(1);
        }
        if let Some(pace) = read_env::<u64>("CONFLICT_FIGHT_PACE_MS") {
            config.skirmish.pace = Duration::from_millis(pace);
        }
        if let Some(to_file) = read_env_bool("CONFLICT_LOG_FILE") {
            config.logging.to_file = to_file;
        }
        if let Some(audit) = read_env_bool("CONFLICT_AUDIT_LOG") {
            config.audit_log = audit;
        }

        config
    }
}

/// Demo skirmish settings.
#[derive(Clone, Debug)]
pub struct SkirmishConfig {
    pub fights_per_soldier: u32,
    pub pace: Duration,
}

impl Default for SkirmishConfig {
    fn default() -> Self {
        Self {
            fights_per_soldier: 5,
            pace: Duration::from_millis(20),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct LoggingConfig {
    pub to_file: bool,
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

fn read_env_bool(key: &str) -> Option<bool> {
    match env::var(key).ok()?.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
