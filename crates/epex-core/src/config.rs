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

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{MarketError, Result};
use crate::net_price::NetPriceConfig;

/// Supported upstream feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Awattar REST API (price only)
    Awattar,
    /// EPEX Spot market results table (price and traded volume)
    EpexSpotWeb,
}

const AWATTAR_MARKET_AREAS: &[&str] = &["at", "de"];

const EPEX_SPOT_WEB_MARKET_AREAS: &[&str] = &[
    "AT", "BE", "CH", "DE-LU", "DK1", "DK2", "FI", "FR", "GB", "NL", "NO1", "NO2", "NO3", "NO4",
    "NO5", "PL", "SE1", "SE2", "SE3", "SE4",
];

impl SourceKind {
    /// Get human-readable name for the source
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Awattar => "Awattar",
            Self::EpexSpotWeb => "EPEX Spot Web Scraper",
        }
    }

    /// Get config string value (snake_case)
    pub fn to_config_value(&self) -> &'static str {
        match self {
            Self::Awattar => "awattar",
            Self::EpexSpotWeb => "epex_spot_web",
        }
    }

    pub fn all() -> &'static [SourceKind] {
        &[Self::Awattar, Self::EpexSpotWeb]
    }

    pub fn market_areas(&self) -> &'static [&'static str] {
        match self {
            Self::Awattar => AWATTAR_MARKET_AREAS,
            Self::EpexSpotWeb => EPEX_SPOT_WEB_MARKET_AREAS,
        }
    }

    /// Match `area` case-insensitively against the known areas, returning the canonical spelling
    pub fn normalize_market_area(&self, area: &str) -> Result<&'static str> {
        let area = area.trim();
        self.market_areas()
            .iter()
            .find(|known| known.eq_ignore_ascii_case(area))
            .copied()
            .ok_or_else(|| {
                MarketError::Config(format!(
                    "Unknown market area '{}' for {}. Supported areas: {}",
                    area,
                    self.display_name(),
                    self.market_areas().join(", ")
                ))
            })
    }

    /// Whether this feed reports traded volume
    pub fn reports_volume(&self) -> bool {
        matches!(self, Self::EpexSpotWeb)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for SourceKind {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "awattar" => Ok(Self::Awattar),
            "epex_spot_web" | "epex spot web scraper" | "epex-spot-web" => Ok(Self::EpexSpotWeb),
            _ => Err(MarketError::Config(format!(
                "Unknown source: '{}'. Supported sources: {}",
                s,
                Self::all()
                    .iter()
                    .map(|kind| kind.to_config_value())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }
}

fn default_source_kind() -> SourceKind {
    SourceKind::Awattar
}

fn default_market_area() -> String {
    "de".to_string()
}

/// Which feed to read and for which market area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_source_kind")]
    pub kind: SourceKind,

    #[serde(default = "default_market_area")]
    pub market_area: String,

    /// Custom base URL for testing (overrides the feed's public endpoint)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: default_source_kind(),
            market_area: default_market_area(),
            base_url: None,
        }
    }
}

fn default_timezone() -> String {
    "Europe/Berlin".to_string()
}

fn default_update_interval() -> u64 {
    900
}

fn default_request_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Minimum refresh period; feeds publish at most a few times a day
pub const MIN_UPDATE_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemSettingsConfig {
    /// IANA timezone defining "today"
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// How often to refresh market data (seconds)
    #[serde(default = "default_update_interval")]
    pub update_interval_secs: u64,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for SystemSettingsConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            update_interval_secs: default_update_interval(),
            request_timeout_secs: default_request_timeout(),
            log_level: default_log_level(),
        }
    }
}

impl SystemSettingsConfig {
    pub fn timezone(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| MarketError::Config(format!("invalid timezone '{}': {e}", self.timezone)))
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Complete configuration surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub pricing: NetPriceConfig,
    #[serde(default)]
    pub system: SystemSettingsConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        self.source
            .kind
            .normalize_market_area(&self.source.market_area)?;
        self.pricing.validate()?;
        self.system.timezone()?;

        if self.system.update_interval_secs < MIN_UPDATE_INTERVAL_SECS {
            return Err(MarketError::Config(format!(
                "update_interval_secs must be at least {MIN_UPDATE_INTERVAL_SECS}, got {}",
                self.system.update_interval_secs
            )));
        }
        if self.system.request_timeout_secs == 0 {
            return Err(MarketError::Config(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
