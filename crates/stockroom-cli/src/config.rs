// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use stockroom_app::{
    CacheConfig, DEFAULT_MAX_ITEMS, DEFAULT_MAX_LOAD_FAILURES, DEFAULT_PAGE_SIZE,
};

pub const APP_NAME: &str = "stockroom";
const CONFIG_VERSION: i64 = 1;
const DEFAULT_TIMEOUT: &str = "10s";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub api: Api,
    #[serde(default)]
    pub cache: Cache,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            api: Api::default(),
            cache: Cache::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Api {
    pub base_url: Option<String>,
    pub timeout: Option<String>,
}

impl Default for Api {
    fn default() -> Self {
        Self {
            base_url: Some(stockroom_api::DEFAULT_BASE_URL.to_owned()),
            timeout: Some(DEFAULT_TIMEOUT.to_owned()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Cache {
    pub page_size: Option<usize>,
    pub max_items: Option<usize>,
    pub max_load_failures: Option<u32>,
}

impl Default for Cache {
    fn default() -> Self {
        Self {
            page_size: Some(DEFAULT_PAGE_SIZE),
            max_items: Some(DEFAULT_MAX_ITEMS),
            max_load_failures: Some(DEFAULT_MAX_LOAD_FAILURES),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub level: Option<String>,
    pub file: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: Some(DEFAULT_LOG_LEVEL.to_owned()),
            file: None,
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("STOCKROOM_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set STOCKROOM_CONFIG_PATH to the config file")
        })?;

        let app_dir = config_root.join(APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
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
                    "config file {} has no version. Add `version = 1` and put values under [api], [cache], and [log]",
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
        if let Some(base_url) = &self.api.base_url {
            stockroom_api::validate_base_url(base_url)
                .with_context(|| format!("invalid [api] section in {}", path.display()))?;
        }

        if let Some(timeout) = &self.api.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed.is_zero() {
                bail!(
                    "api.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        self.cache_config()
            .validate()
            .with_context(|| format!("invalid [cache] section in {}", path.display()))?;

        if let Some(level) = &self.log.level {
            level.parse::<tracing::Level>().map_err(|_| {
                anyhow!(
                    "log.level in {} must be one of trace, debug, info, warn, error; got {:?}",
                    path.display(),
                    level
                )
            })?;
        }

        Ok(())
    }

    /// `STOCKROOM_API_URL` wins over the file so one config can target
    /// several servers.
    pub fn api_base_url(&self) -> String {
        if let Ok(url) = env::var("STOCKROOM_API_URL")
            && !url.trim().is_empty()
        {
            return url;
        }
        self.api
            .base_url
            .clone()
            .unwrap_or_else(|| stockroom_api::DEFAULT_BASE_URL.to_owned())
    }

    pub fn api_timeout(&self) -> Result<Duration> {
        parse_duration(self.api.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            page_size: self.cache.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            max_items: self.cache.max_items.unwrap_or(DEFAULT_MAX_ITEMS),
            max_load_failures: self
                .cache
                .max_load_failures
                .unwrap_or(DEFAULT_MAX_LOAD_FAILURES),
        }
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_file(&self) -> Result<PathBuf> {
        if let Some(file) = &self.log.file {
            return Ok(PathBuf::from(file));
        }

        let data_root = dirs::data_local_dir().ok_or_else(|| {
            anyhow!("cannot resolve data directory; set [log].file to a writable path")
        })?;
        Ok(data_root.join(APP_NAME).join("stockroom.log"))
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# stockroom config\n# Place this file at: {}\n\nversion = 1\n\n[api]\n# STOCKROOM_API_URL overrides base_url\nbase_url = \"{}\"\ntimeout = \"{}\"\n\n[cache]\npage_size = {}\nmax_items = {}\nmax_load_failures = {}\n\n[log]\n# RUST_LOG overrides level\nlevel = \"{}\"\n# Optional. Default is the platform data dir (for example ~/.local/share/stockroom/stockroom.log)\n# file = \"/absolute/path/to/stockroom.log\"\n",
            path.display(),
            stockroom_api::DEFAULT_BASE_URL,
            DEFAULT_TIMEOUT,
            DEFAULT_PAGE_SIZE,
            DEFAULT_MAX_ITEMS,
            DEFAULT_MAX_LOAD_FAILURES,
            DEFAULT_LOG_LEVEL,
        )
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid timeout duration {raw:?}"))?;
        return Ok(Duration::from_secs(mins.saturating_mul(60)));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 10s)")
}
