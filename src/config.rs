use std::{env, path::PathBuf};

use crate::error::ConfigError;

const DEFAULT_SAVE_DIR: &str = ".clicker-clans";
const DEFAULT_TICKS_PER_SEC: u32 = 10;

/// Runtime settings sourced from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Directory holding save files.
    pub save_dir: PathBuf,
    /// Scheduler resolution. Every task period is rounded to whole ticks.
    pub ticks_per_sec: u32,
    /// Fixed RNG seed; `None` seeds from the wall clock.
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            save_dir: PathBuf::from(DEFAULT_SAVE_DIR),
            ticks_per_sec: DEFAULT_TICKS_PER_SEC,
            seed: None,
        }
    }
}

impl Settings {
    /// Read `CLICKER_CLANS_SAVE_DIR`, `CLICKER_CLANS_TICKS_PER_SEC` and
    /// `CLICKER_CLANS_SEED`. Unset or blank variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut settings = Self::default();

        if let Some(dir) = get("CLICKER_CLANS_SAVE_DIR") {
            settings.save_dir = PathBuf::from(dir);
        }

        if let Some(raw) = get("CLICKER_CLANS_TICKS_PER_SEC") {
            settings.ticks_per_sec = raw
                .parse::<u32>()
                .ok()
                .filter(|value| (1..=1000).contains(value))
                .ok_or(ConfigError::Invalid {
                    name: "CLICKER_CLANS_TICKS_PER_SEC",
                    value: raw,
                })?;
        }

        if let Some(raw) = get("CLICKER_CLANS_SEED") {
            settings.seed = Some(raw.parse::<u64>().map_err(|_| ConfigError::Invalid {
                name: "CLICKER_CLANS_SEED",
                value: raw,
            })?);
        }

        Ok(settings)
    }
}
