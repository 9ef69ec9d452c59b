use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::engine::EngineSettings;
use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub struct LeaderboardConfig {
    pub source: Option<PathBuf>,
    pub sheet_names: Vec<String>,
    pub primary_sheet: String,
    pub cache_ttl: Duration,
    pub fetch_timeout: Duration,
    pub separator: String,
    pub log_level: String,
}

impl LeaderboardConfig {
    /// Loads `.env` if present, then reads the environment. The source path
    /// may still be supplied on the command line, so it is optional here.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let sheet_names: Vec<String> = get_var_or("SHEET_NAMES", "Master")
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        if sheet_names.is_empty() {
            return Err(ConfigError::Invalid {
                key: "SHEET_NAMES",
                reason: "no sheet names given".to_string(),
            });
        }

        Ok(Self {
            source: env::var("LEADERBOARD_SOURCE").ok().map(PathBuf::from),
            sheet_names,
            primary_sheet: get_var_or("PRIMARY_SHEET", "Master"),
            cache_ttl: Duration::from_secs(get_secs("CACHE_TTL_SECS", 300)?),
            fetch_timeout: Duration::from_secs(get_secs("FETCH_TIMEOUT_SECS", 10)?),
            separator: get_var_or("PERFORMER_SEPARATOR", " - "),
            log_level: get_var_or("LOG_LEVEL", "info"),
        })
    }

    pub fn source_path(&self, override_path: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
        override_path
            .or_else(|| self.source.clone())
            .ok_or(ConfigError::Missing("LEADERBOARD_SOURCE"))
    }

    pub fn engine_settings(&self) -> EngineSettings {
        let mut sheet_names = self.sheet_names.clone();
        if !sheet_names.contains(&self.primary_sheet) {
            sheet_names.push(self.primary_sheet.clone());
        }

        EngineSettings {
            sheet_names,
            primary_sheet: self.primary_sheet.clone(),
            separator: self.separator.clone(),
            cache_ttl: self.cache_ttl,
            fetch_timeout: self.fetch_timeout,
        }
    }
}

fn get_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn get_secs(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|e| ConfigError::Invalid {
            key,
            reason: format!("{e}"),
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const KEYS: [&str; 6] = [
        "LEADERBOARD_SOURCE",
        "SHEET_NAMES",
        "PRIMARY_SHEET",
        "CACHE_TTL_SECS",
        "FETCH_TIMEOUT_SECS",
        "PERFORMER_SEPARATOR",
    ];

    fn clear() {
        for key in KEYS {
            env::remove_var(key);
        }
    }

    #[test]
    fn defaults_match_reference_deployment() {
        let _guard = ENV_LOCK.lock().expect("env lock poisoned");
        clear();

        let cfg = LeaderboardConfig::from_env().expect("should parse config");
        assert_eq!(cfg.sheet_names, vec!["Master".to_string()]);
        assert_eq!(cfg.cache_ttl, Duration::from_secs(300));
        assert_eq!(cfg.fetch_timeout, Duration::from_secs(10));
        assert_eq!(cfg.separator, " - ");
        assert!(cfg.source_path(None).is_err());
        assert_eq!(
            cfg.source_path(Some(PathBuf::from("sheets"))).unwrap(),
            PathBuf::from("sheets")
        );
    }

    #[test]
    fn reads_overrides_and_includes_primary_sheet() {
        let _guard = ENV_LOCK.lock().expect("env lock poisoned");
        clear();
        env::set_var("LEADERBOARD_SOURCE", "/data/export.json");
        env::set_var("SHEET_NAMES", "Team, Archive ,");
        env::set_var("PRIMARY_SHEET", "Tasks");
        env::set_var("CACHE_TTL_SECS", "60");

        let cfg = LeaderboardConfig::from_env().expect("should parse config");
        let settings = cfg.engine_settings();
        assert_eq!(settings.sheet_names, vec!["Team", "Archive", "Tasks"]);
        assert_eq!(settings.cache_ttl, Duration::from_secs(60));
        assert_eq!(
            cfg.source_path(None).unwrap(),
            PathBuf::from("/data/export.json")
        );

        clear();
    }

    #[test]
    fn rejects_bad_numbers_and_empty_sheet_list() {
        let _guard = ENV_LOCK.lock().expect("env lock poisoned");
        clear();

        env::set_var("CACHE_TTL_SECS", "five");
        assert!(matches!(
            LeaderboardConfig::from_env(),
            Err(ConfigError::Invalid { key: "CACHE_TTL_SECS", .. })
        ));
        env::remove_var("CACHE_TTL_SECS");

        env::set_var("SHEET_NAMES", " , ");
        assert!(matches!(
            LeaderboardConfig::from_env(),
            Err(ConfigError::Invalid { key: "SHEET_NAMES", .. })
        ));

        clear();
    }
}
