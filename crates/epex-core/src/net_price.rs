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

use serde::{Deserialize, Serialize};

use crate::error::{MarketError, Result};

pub const DEFAULT_SURCHARGE_PERCENT: f64 = 3.0;
pub const DEFAULT_SURCHARGE_ABSOLUTE: f64 = 11.93;
pub const DEFAULT_VAT_PERCENT: f64 = 19.0;

fn default_surcharge_percent() -> f64 {
    DEFAULT_SURCHARGE_PERCENT
}

fn default_surcharge_absolute() -> f64 {
    DEFAULT_SURCHARGE_ABSOLUTE
}

fn default_vat_percent() -> f64 {
    DEFAULT_VAT_PERCENT
}

/// Surcharge and tax settings for the end-consumer price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetPriceConfig {
    /// Percentage surcharge on the gross price
    #[serde(default = "default_surcharge_percent")]
    pub surcharge_percent: f64,

    /// Absolute surcharge, same per-kWh unit as the result
    #[serde(default = "default_surcharge_absolute")]
    pub surcharge_absolute: f64,

    /// Value added tax, applied last
    #[serde(default = "default_vat_percent")]
    pub vat_percent: f64,
}

impl Default for NetPriceConfig {
    fn default() -> Self {
        Self {
            surcharge_percent: DEFAULT_SURCHARGE_PERCENT,
            surcharge_absolute: DEFAULT_SURCHARGE_ABSOLUTE,
            vat_percent: DEFAULT_VAT_PERCENT,
        }
    }
}

impl NetPriceConfig {
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("surcharge_percent", self.surcharge_percent),
            ("surcharge_absolute", self.surcharge_absolute),
            ("vat_percent", self.vat_percent),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(MarketError::Config(format!(
                    "{name} must be a finite value >= 0, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Gross to net price conversion
///
/// `net = (gross * (1 + surcharge%) + surcharge_abs) * (1 + vat%)`. VAT is
/// charged on the surcharged price, so the order is fixed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NetPriceCalculator {
    config: NetPriceConfig,
}

impl NetPriceCalculator {
    pub fn new(config: NetPriceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NetPriceConfig {
        &self.config
    }

    pub fn apply(&self, gross: f64) -> f64 {
        let surcharged =
            gross * (1.0 + self.config.surcharge_percent / 100.0) + self.config.surcharge_absolute;
        surcharged * (1.0 + self.config.vat_percent / 100.0)
    }
}
