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
use std::sync::Arc;
use tracing::{info, warn};

use crate::aggregator::PriceAggregator;
use crate::error::Result;
use crate::net_price::NetPriceCalculator;
use crate::statistics::{StatisticKind, StatisticReading};
use crate::store::{MarketDataStore, PublishOutcome};
use crate::traits::{Fetcher, PriceSource};

/// Drives one source: fetch, publish, expose statistics
///
/// Scheduling and retry belong to the caller; a failed refresh leaves the
/// previously published data in place.
pub struct RefreshCoordinator {
    source: Box<dyn PriceSource>,
    fetcher: Arc<dyn Fetcher>,
    store: Arc<MarketDataStore>,
    timezone: Tz,
    calculator: NetPriceCalculator,
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("source", &self.source.name())
            .field("market_area", &self.source.market_area())
            .field("timezone", &self.timezone)
            .field("calculator", &self.calculator)
            .finish_non_exhaustive()
    }
}

impl RefreshCoordinator {
    pub fn new(
        source: Box<dyn PriceSource>,
        fetcher: Arc<dyn Fetcher>,
        timezone: Tz,
        calculator: NetPriceCalculator,
    ) -> Self {
        Self {
            source,
            fetcher,
            store: Arc::new(MarketDataStore::new()),
            timezone,
            calculator,
        }
    }

    /// Share an existing store, e.g. with other readers
    #[must_use]
    pub fn with_store(mut self, store: Arc<MarketDataStore>) -> Self {
        self.store = store;
        self
    }

    pub fn store(&self) -> &Arc<MarketDataStore> {
        &self.store
    }

    pub fn source(&self) -> &dyn PriceSource {
        self.source.as_ref()
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Statistics this source can back
    pub fn available_statistics(&self) -> Vec<StatisticKind> {
        StatisticKind::available(self.source.reports_volume())
    }

    pub async fn refresh(&self, now: DateTime<Utc>) -> Result<PublishOutcome> {
        let ticket = self.store.begin_refresh();
        info!(
            "[REFRESH] #{} fetching '{}' from {}",
            ticket.generation(),
            self.source.market_area(),
            self.source.name()
        );

        let data = match self
            .source
            .fetch(self.fetcher.as_ref(), now.with_timezone(&self.timezone))
            .await
        {
            Ok(data) => data,
            Err(e) => {
                warn!(
                    "[REFRESH] #{} failed, keeping previous data: {}",
                    ticket.generation(),
                    e
                );
                return Err(e);
            }
        };

        let count = data.len();
        let outcome = self.store.publish(ticket, data, now);
        match outcome {
            PublishOutcome::Published => info!(
                "[REFRESH] #{} published {} intervals",
                ticket.generation(),
                count
            ),
            PublishOutcome::Superseded => warn!(
                "[REFRESH] #{} superseded by a newer refresh, result dropped",
                ticket.generation()
            ),
        }
        Ok(outcome)
    }

    /// Read every available statistic at `now`; `None` before the first refresh
    pub fn readings(&self, now: DateTime<Utc>) -> Option<Vec<StatisticReading>> {
        let snapshot = self.store.snapshot()?;
        let aggregator = PriceAggregator::new(&snapshot.data, now, self.timezone)
            .with_calculator(self.calculator);
        Some(aggregator.read_all(&self.available_statistics()))
    }
}
