use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::Deserialize;
use tracing::{debug, warn};

pub const SETTINGS_FILE_NAME: &str = "scoresense.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub base_url: String,
    pub trivia_interval_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".into(),
            trivia_interval_secs: 15,
            request_timeout_secs: 120,
        }
    }
}

impl Settings {
    pub fn trivia_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.trivia_interval_secs.max(1))
    }
}

/// Defaults, then the first settings file found, then environment overrides.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    for path in settings_search_paths() {
        if !path.is_file() {
            continue;
        }
        match load_settings_file(&path) {
            Ok(file_settings) => {
                debug!(path = %path.display(), "loaded settings file");
                settings = file_settings;
                break;
            }
            Err(err) => {
                warn!("ignoring settings file: {err:#}");
            }
        }
    }

    apply_overrides(&mut settings, |name| std::env::var(name).ok());
    settings
}

pub fn load_settings_file(path: &Path) -> anyhow::Result<Settings> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings file '{}'", path.display()))?;
    toml::from_str::<Settings>(&raw)
        .with_context(|| format!("failed to parse settings file '{}'", path.display()))
}

fn settings_search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(SETTINGS_FILE_NAME)];
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("scoresense").join(SETTINGS_FILE_NAME));
    }
    paths
}

/// Later variables win over earlier ones for the same setting.
pub fn apply_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

    for name in ["SCORESENSE_BASE_URL", "APP__BASE_URL"] {
        if let Some(v) = non_empty(name) {
            settings.base_url = v;
        }
    }

    if let Some(v) = non_empty("APP__TRIVIA_INTERVAL_SECS") {
        match v.trim().parse::<u64>() {
            Ok(parsed) => settings.trivia_interval_secs = parsed,
            Err(err) => warn!("ignoring APP__TRIVIA_INTERVAL_SECS={v}: {err}"),
        }
    }

    if let Some(v) = non_empty("APP__REQUEST_TIMEOUT_SECS") {
        match v.trim().parse::<u64>() {
            Ok(parsed) => settings.request_timeout_secs = parsed,
            Err(err) => warn!("ignoring APP__REQUEST_TIMEOUT_SECS={v}: {err}"),
        }
    }
}
