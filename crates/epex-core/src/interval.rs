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

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{MarketError, Result};

/// Gross price unit every source must deliver
pub const UNIT_EUR_PER_MWH: &str = "EUR/MWh";

/// Converted unit used for per-kWh figures
pub const UNIT_CT_PER_KWH: &str = "ct/kWh";

/// Canonical raw record handed over by a source adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPriceRecord {
    pub unit: String,
    pub start_timestamp_ms: i64,
    pub end_timestamp_ms: i64,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buy_volume: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sell_volume: Option<f64>,
}

/// One half-open delivery interval `[start_time, end_time)` and its market price
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceInterval {
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    price_per_mwh: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    buy_volume_mwh: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sell_volume_mwh: Option<f64>,
}

impl PriceInterval {
    pub fn new(
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        price_per_mwh: f64,
    ) -> Result<Self> {
        if end_time <= start_time {
            return Err(MarketError::InvalidInterval {
                start: start_time,
                end: end_time,
            });
        }

        Ok(Self {
            start_time,
            end_time,
            price_per_mwh,
            buy_volume_mwh: None,
            sell_volume_mwh: None,
        })
    }

    /// Attach traded volumes (only for sources that report them)
    #[must_use]
    pub fn with_volumes(mut self, buy_volume_mwh: Option<f64>, sell_volume_mwh: Option<f64>) -> Self {
        self.buy_volume_mwh = buy_volume_mwh;
        self.sell_volume_mwh = sell_volume_mwh;
        self
    }

    /// Validate and convert a raw record
    pub fn from_raw(record: &RawPriceRecord) -> Result<Self> {
        if !record.unit.trim().eq_ignore_ascii_case(UNIT_EUR_PER_MWH) {
            return Err(MarketError::InvalidUnit {
                expected: UNIT_EUR_PER_MWH.to_string(),
                found: record.unit.clone(),
            });
        }

        let start = timestamp_from_millis(record.start_timestamp_ms)?;
        let end = timestamp_from_millis(record.end_timestamp_ms)?;

        if !record.price.is_finite() {
            return Err(MarketError::MalformedResponse(format!(
                "non-finite price {} for interval starting {}",
                record.price, start
            )));
        }
        for volume in [record.buy_volume, record.sell_volume].into_iter().flatten() {
            if !volume.is_finite() {
                return Err(MarketError::MalformedResponse(format!(
                    "non-finite volume {volume} for interval starting {start}"
                )));
            }
        }

        Ok(Self::new(start, end, record.price)?.with_volumes(record.buy_volume, record.sell_volume))
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }

    pub fn price_per_mwh(&self) -> f64 {
        self.price_per_mwh
    }

    /// EUR/MWh -> ct/kWh
    pub fn price_per_kwh(&self) -> f64 {
        self.price_per_mwh / 10.0
    }

    pub fn buy_volume_mwh(&self) -> Option<f64> {
        self.buy_volume_mwh
    }

    pub fn sell_volume_mwh(&self) -> Option<f64> {
        self.sell_volume_mwh
    }

    /// Total traded volume, only when both sides are reported
    pub fn volume_mwh(&self) -> Option<f64> {
        match (self.buy_volume_mwh, self.sell_volume_mwh) {
            (Some(buy), Some(sell)) => Some(buy + sell),
            _ => None,
        }
    }

    pub fn has_volumes(&self) -> bool {
        self.buy_volume_mwh.is_some() && self.sell_volume_mwh.is_some()
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start_time <= instant && instant < self.end_time
    }
}

pub(crate) fn timestamp_from_millis(millis: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        MarketError::MalformedResponse(format!("timestamp {millis} ms is out of range"))
    })
}
