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

use async_trait::async_trait;
use chrono::DateTime;
use chrono_tz::Tz;
use std::time::Duration;

use crate::error::Result;
use crate::market_data::MarketDataSet;

/// Transport collaborator used by every source adapter
///
/// Implementations only move bytes; payload interpretation stays with the
/// adapter. Failures surface as `MarketError::Fetch`.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn get(&self, url: &str, params: &[(String, String)], timeout: Duration)
    -> Result<String>;
}

/// Upstream price feed producing a complete `MarketDataSet`
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Fetch the window starting at local midnight of `now`
    async fn fetch(&self, fetcher: &dyn Fetcher, now: DateTime<Tz>) -> Result<MarketDataSet>;

    /// Get data source name for logging
    fn name(&self) -> &str;

    fn market_area(&self) -> &str;

    /// Whether intervals carry buy/sell volume
    fn reports_volume(&self) -> bool {
        false
    }
}
