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

//! Time-anchored statistics over a market data snapshot
//!
//! Every value is recomputed on each call from the `(data, now, timezone)`
//! triple. Nothing here reads the wall clock.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::error::{MarketError, Result};
use crate::interval::PriceInterval;
use crate::market_data::MarketDataSet;
use crate::net_price::NetPriceCalculator;

#[derive(Debug, Clone, Copy)]
pub struct PriceAggregator<'a> {
    market_data: &'a MarketDataSet,
    now: DateTime<Utc>,
    timezone: Tz,
    calculator: NetPriceCalculator,
}

impl<'a> PriceAggregator<'a> {
    pub fn new(market_data: &'a MarketDataSet, now: DateTime<Utc>, timezone: Tz) -> Self {
        Self {
            market_data,
            now,
            timezone,
            calculator: NetPriceCalculator::default(),
        }
    }

    #[must_use]
    pub fn with_calculator(mut self, calculator: NetPriceCalculator) -> Self {
        self.calculator = calculator;
        self
    }

    pub fn market_data(&self) -> &'a MarketDataSet {
        self.market_data
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn calculator(&self) -> &NetPriceCalculator {
        &self.calculator
    }

    /// Interval covering the reference instant
    pub fn marketdata_now(&self) -> Result<&'a PriceInterval> {
        self.market_data
            .interval_containing(self.now)
            .ok_or(MarketError::NoCurrentInterval(self.now))
    }

    /// Today's intervals by ascending price, ties by start time
    pub fn sorted_marketdata_today(&self) -> Vec<&'a PriceInterval> {
        let mut today = self.market_data.intervals_on_day(self.now, &self.timezone);
        today.sort_by(|a, b| {
            a.price_per_mwh()
                .total_cmp(&b.price_per_mwh())
                .then_with(|| a.start_time().cmp(&b.start_time()))
        });
        today
    }

    fn sorted_today_non_empty(&self) -> Result<Vec<&'a PriceInterval>> {
        let today = self.sorted_marketdata_today();
        if today.is_empty() {
            return Err(MarketError::NoData);
        }
        Ok(today)
    }

    /// Gross price in EUR/MWh
    pub fn current_price(&self) -> Result<f64> {
        Ok(self.marketdata_now()?.price_per_mwh())
    }

    /// Net price of the current interval in ct/kWh
    pub fn net_price(&self) -> Result<f64> {
        Ok(self.net_price_of(self.marketdata_now()?))
    }

    pub fn net_price_of(&self, interval: &PriceInterval) -> f64 {
        self.calculator.apply(interval.price_per_kwh())
    }

    /// Zero-based position of the current interval among today's sorted intervals
    pub fn rank(&self) -> Result<usize> {
        let current = self.marketdata_now()?;
        self.sorted_marketdata_today()
            .iter()
            .position(|interval| interval.start_time() == current.start_time())
            .ok_or(MarketError::NoCurrentInterval(self.now))
    }

    /// `(current - min) / (max - min)` over today
    ///
    /// A flat day has no defined position and yields `DegenerateRange`.
    pub fn quantile(&self) -> Result<f64> {
        // also verifies the current interval belongs to today
        self.rank()?;
        let current = self.current_price()?;
        let today = self.sorted_today_non_empty()?;
        let min = today[0].price_per_mwh();
        let max = today[today.len() - 1].price_per_mwh();

        let range = max - min;
        if range == 0.0 {
            return Err(MarketError::DegenerateRange(min));
        }
        Ok((current - min) / range)
    }

    pub fn lowest(&self) -> Result<&'a PriceInterval> {
        let today = self.sorted_today_non_empty()?;
        Ok(today[0])
    }

    pub fn highest(&self) -> Result<&'a PriceInterval> {
        let today = self.sorted_today_non_empty()?;
        Ok(today[today.len() - 1])
    }

    /// Arithmetic mean of today's prices in EUR/MWh
    pub fn average_price(&self) -> Result<f64> {
        let today = self.sorted_today_non_empty()?;
        let sum: f64 = today.iter().map(|interval| interval.price_per_mwh()).sum();
        Ok(sum / today.len() as f64)
    }

    /// Median of today's prices in EUR/MWh
    pub fn median_price(&self) -> Result<f64> {
        let today = self.sorted_today_non_empty()?;
        let mid = today.len() / 2;
        if today.len() % 2 == 1 {
            Ok(today[mid].price_per_mwh())
        } else {
            Ok((today[mid - 1].price_per_mwh() + today[mid].price_per_mwh()) / 2.0)
        }
    }

    pub fn buy_volume(&self) -> Result<f64> {
        self.marketdata_now()?
            .buy_volume_mwh()
            .ok_or(MarketError::VolumeNotReported)
    }

    pub fn sell_volume(&self) -> Result<f64> {
        self.marketdata_now()?
            .sell_volume_mwh()
            .ok_or(MarketError::VolumeNotReported)
    }

    /// Buy plus sell volume of the current interval
    pub fn total_volume(&self) -> Result<f64> {
        self.marketdata_now()?
            .volume_mwh()
            .ok_or(MarketError::VolumeNotReported)
    }
}
