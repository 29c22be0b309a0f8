// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use vetdesk_tui::TuiOptions;

const CONFIG_VERSION: i64 = 1;
const APP_NAME: &str = "vetdesk";
const DEFAULT_SEARCH_DEBOUNCE: &str = "200ms";
const DEFAULT_STATUS_TIMEOUT: &str = "4s";
const DEFAULT_LOG_LEVEL: &str = "info";
const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub data: Data,
    #[serde(default)]
    pub logging: Logging,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            ui: Ui::default(),
            data: Data::default(),
            logging: Logging::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ui {
    pub search_debounce: Option<String>,
    pub status_timeout: Option<String>,
}

impl Default for Ui {
    fn default() -> Self {
        Self {
            search_debounce: Some(DEFAULT_SEARCH_DEBOUNCE.to_owned()),
            status_timeout: Some(DEFAULT_STATUS_TIMEOUT.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Data {
    pub roster_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Logging {
    pub level: Option<String>,
    pub file: Option<String>,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: Some(DEFAULT_LOG_LEVEL.to_owned()),
            file: None,
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("VETDESK_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set VETDESK_CONFIG_PATH to the config file")
        })?;
        Ok(config_root.join(APP_NAME).join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} has no version; add `version = 1` and keep values under [ui], [data], and [logging]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        for (name, raw) in [
            ("ui.search_debounce", &self.ui.search_debounce),
            ("ui.status_timeout", &self.ui.status_timeout),
        ] {
            let Some(raw) = raw else {
                continue;
            };
            let parsed = parse_duration(raw)
                .with_context(|| format!("{name} in {}", path.display()))?;
            if parsed.is_zero() {
                bail!("{name} in {} must be positive, got {raw}", path.display());
            }
        }

        if let Some(level) = &self.logging.level
            && !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str())
        {
            bail!(
                "logging.level in {} must be one of {}, got {level:?}",
                path.display(),
                LOG_LEVELS.join(", ")
            );
        }

        if let Some(roster) = &self.data.roster_path
            && roster.trim().is_empty()
        {
            bail!(
                "data.roster_path in {} is empty; remove it or point it at a JSON roster",
                path.display()
            );
        }

        Ok(())
    }

    pub fn search_debounce(&self) -> Result<Duration> {
        parse_duration(
            self.ui
                .search_debounce
                .as_deref()
                .unwrap_or(DEFAULT_SEARCH_DEBOUNCE),
        )
    }

    pub fn status_timeout(&self) -> Result<Duration> {
        parse_duration(
            self.ui
                .status_timeout
                .as_deref()
                .unwrap_or(DEFAULT_STATUS_TIMEOUT),
        )
    }

    pub fn tui_options(&self) -> Result<TuiOptions> {
        Ok(TuiOptions {
            search_debounce: self.search_debounce()?,
            status_timeout: self.status_timeout()?,
        })
    }

    pub fn roster_path(&self) -> Option<PathBuf> {
        self.data.roster_path.as_deref().map(PathBuf::from)
    }

    pub fn log_level(&self) -> &str {
        self.logging.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_file(&self) -> Option<PathBuf> {
        self.logging.file.as_deref().map(PathBuf::from)
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# vetdesk config\n# Place this file at: {}\n\nversion = 1\n\n[ui]\n# Quiet period before a search query is applied.\nsearch_debounce = \"{}\"\nstatus_timeout = \"{}\"\n\n[data]\n# Optional. JSON file shaped like {{\"patients\": [...]}}\n# roster_path = \"/absolute/path/to/patients.json\"\n\n[logging]\nlevel = \"{}\"\n# Logging is off unless a file is set; the terminal belongs to the UI.\n# file = \"/absolute/path/to/vetdesk.log\"\n",
            path.display(),
            DEFAULT_SEARCH_DEBOUNCE,
            DEFAULT_STATUS_TIMEOUT,
            DEFAULT_LOG_LEVEL,
        )
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_secs(mins * 60));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 200ms or 4s)")
}
