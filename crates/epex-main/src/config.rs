// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of EPEX Spot.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use anyhow::{Context, Result};
use epex_core::{AppConfig, SourceKind};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Looked up in the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILES: [&str; 2] = ["config.toml", "config.json"];

/// Where the active configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    File(PathBuf),
    Environment,
}

impl fmt::Display for ConfigOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Environment => write!(f, "defaults with environment overrides"),
        }
    }
}

/// Load from `explicit`, else the first default file present, else the environment
pub fn load_config(explicit: Option<&Path>) -> Result<(AppConfig, ConfigOrigin)> {
    let candidates: Vec<PathBuf> = DEFAULT_CONFIG_FILES.iter().map(PathBuf::from).collect();
    load_from(explicit, &candidates, |key| std::env::var(key).ok())
}

fn load_from(
    explicit: Option<&Path>,
    candidates: &[PathBuf],
    env: impl Fn(&str) -> Option<String>,
) -> Result<(AppConfig, ConfigOrigin)> {
    if let Some(path) = explicit {
        let config = read_config_file(path)?;
        return Ok((config, ConfigOrigin::File(path.to_path_buf())));
    }

    if let Some(path) = candidates.iter().find(|path| path.is_file()) {
        let config = read_config_file(path)?;
        return Ok((config, ConfigOrigin::File(path.clone())));
    }

    warn!("No configuration file found, using defaults with environment overrides");
    let config = from_env(env)?;
    config.validate()?;
    Ok((config, ConfigOrigin::Environment))
}

/// Parse a TOML or JSON (by extension) configuration file and validate it
pub fn read_config_file(path: &Path) -> Result<AppConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let config: AppConfig = if is_json {
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?
    } else {
        toml::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))?
    };

    config
        .validate()
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;
    Ok(config)
}

fn from_env(env: impl Fn(&str) -> Option<String>) -> Result<AppConfig> {
    let mut config = AppConfig::default();

    if let Some(source) = env("EPEX_SOURCE") {
        config.source.kind = source
            .parse::<SourceKind>()
            .context("Invalid EPEX_SOURCE")?;
    }

    if let Some(area) = env("EPEX_MARKET_AREA") {
        config.source.market_area = area;
    }

    if let Some(timezone) = env("EPEX_TIMEZONE") {
        config.system.timezone = timezone;
    }

    if let Some(interval) = env("UPDATE_INTERVAL_SECS") {
        config.system.update_interval_secs = interval
            .parse::<u64>()
            .with_context(|| format!("Invalid UPDATE_INTERVAL_SECS '{interval}'"))?;
    }

    Ok(config)
}
