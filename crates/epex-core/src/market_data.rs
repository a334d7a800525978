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

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::error::{MarketError, Result};
use crate::interval::{PriceInterval, RawPriceRecord};

/// Chronologically ordered, non-overlapping price intervals of one market area
#[derive(Debug, Clone, PartialEq)]
pub struct MarketDataSet {
    market_area: String,
    intervals: Vec<PriceInterval>,
}

impl MarketDataSet {
    /// Parse raw records; any invalid record rejects the whole set
    pub fn from_raw(market_area: impl Into<String>, records: &[RawPriceRecord]) -> Result<Self> {
        let intervals = records
            .iter()
            .map(PriceInterval::from_raw)
            .collect::<Result<Vec<_>>>()?;
        Self::from_intervals(market_area, intervals)
    }

    /// Sort and validate already parsed intervals
    pub fn from_intervals(
        market_area: impl Into<String>,
        mut intervals: Vec<PriceInterval>,
    ) -> Result<Self> {
        intervals.sort_by_key(PriceInterval::start_time);

        for pair in intervals.windows(2) {
            let (previous, next) = (&pair[0], &pair[1]);
            if previous.start_time() == next.start_time() {
                return Err(MarketError::DuplicateInterval(next.start_time()));
            }
            if previous.end_time() > next.start_time() {
                return Err(MarketError::OverlappingIntervals {
                    previous_end: previous.end_time(),
                    next_start: next.start_time(),
                });
            }
        }

        let market_area = market_area.into();
        debug!(
            "[MARKET DATA] {} intervals for '{}'",
            intervals.len(),
            market_area
        );

        Ok(Self {
            market_area,
            intervals,
        })
    }

    pub fn market_area(&self) -> &str {
        &self.market_area
    }

    pub fn intervals(&self) -> &[PriceInterval] {
        &self.intervals
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PriceInterval> {
        self.intervals.iter()
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn first_start(&self) -> Option<DateTime<Utc>> {
        self.intervals.first().map(PriceInterval::start_time)
    }

    pub fn last_end(&self) -> Option<DateTime<Utc>> {
        self.intervals.last().map(PriceInterval::end_time)
    }

    /// Every interval carries buy and sell volume
    pub fn reports_volume(&self) -> bool {
        !self.intervals.is_empty() && self.intervals.iter().all(PriceInterval::has_volumes)
    }

    /// Interval with `start_time <= instant < end_time`
    pub fn interval_containing(&self, instant: DateTime<Utc>) -> Option<&PriceInterval> {
        // index of the first interval starting after `instant`
        let idx = self
            .intervals
            .partition_point(|interval| interval.start_time() <= instant);
        idx.checked_sub(1)
            .and_then(|candidate| self.intervals.get(candidate))
            .filter(|interval| interval.contains(instant))
    }

    /// Intervals whose local start date equals the local date of `instant`
    pub fn intervals_on_day(&self, instant: DateTime<Utc>, timezone: &Tz) -> Vec<&PriceInterval> {
        let day = instant.with_timezone(timezone).date_naive();
        self.intervals
            .iter()
            .filter(|interval| interval.start_time().with_timezone(timezone).date_naive() == day)
            .collect()
    }
}

impl<'a> IntoIterator for &'a MarketDataSet {
    type Item = &'a PriceInterval;
    type IntoIter = std::slice::Iter<'a, PriceInterval>;

    fn into_iter(self) -> Self::IntoIter {
        self.intervals.iter()
    }
}
