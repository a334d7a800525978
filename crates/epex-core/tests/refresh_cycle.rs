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
use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::Europe::Berlin;
use chrono_tz::Tz;
use epex_core::{
    Fetcher, MarketDataSet, MarketError, NetPriceCalculator, PriceInterval, PriceSource,
    PublishOutcome, RefreshCoordinator, Result, StatisticKind,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration as StdDuration;

/// Fetcher that is never called by the fake source
struct NullFetcher;

#[async_trait]
impl Fetcher for NullFetcher {
    async fn get(&self, url: &str, _: &[(String, String)], _: StdDuration) -> Result<String> {
        Err(MarketError::Fetch {
            url: url.to_string(),
            reason: "offline".to_string(),
        })
    }
}

/// Every fetch returns one day of intervals priced with the fetch number
struct VersionedSource {
    calls: AtomicU64,
    fail: AtomicBool,
    first_call_delay: Option<StdDuration>,
}

impl VersionedSource {
    fn new() -> Self {
        Self {
            calls: AtomicU64::new(0),
            fail: AtomicBool::new(false),
            first_call_delay: None,
        }
    }
}

fn day_start() -> DateTime<Utc> {
    Berlin
        .with_ymd_and_hms(2024, 1, 15, 0, 0, 0)
        .unwrap()
        .with_timezone(&Utc)
}

fn uniform_day(price: f64) -> MarketDataSet {
    let intervals = (0..96)
        .map(|i| {
            let begin = day_start() + Duration::minutes(15 * i);
            PriceInterval::new(begin, begin + Duration::minutes(15), price).unwrap()
        })
        .collect();
    MarketDataSet::from_intervals("de", intervals).unwrap()
}

#[async_trait]
impl PriceSource for VersionedSource {
    async fn fetch(&self, _fetcher: &dyn Fetcher, _now: DateTime<Tz>) -> Result<MarketDataSet> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == 1
            && let Some(delay) = self.first_call_delay
        {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(MarketError::MalformedResponse("missing data".to_string()));
        }
        Ok(uniform_day(call as f64))
    }

    fn name(&self) -> &str {
        "Versioned"
    }

    fn market_area(&self) -> &str {
        "de"
    }
}

fn coordinator(source: VersionedSource) -> RefreshCoordinator {
    RefreshCoordinator::new(
        Box::new(source),
        Arc::new(NullFetcher),
        Berlin,
        NetPriceCalculator::default(),
    )
}

#[tokio::test]
async fn test_refresh_publishes_and_exposes_statistics() {
    let coordinator = coordinator(VersionedSource::new());
    let now = day_start() + Duration::hours(10);

    assert!(coordinator.readings(now).is_none());
    assert_eq!(coordinator.refresh(now).await.unwrap(), PublishOutcome::Published);

    let readings = coordinator.readings(now).unwrap();
    assert_eq!(readings.len(), StatisticKind::available(false).len());

    let price = readings
        .iter()
        .find(|r| r.kind == StatisticKind::Price)
        .unwrap();
    assert_eq!(price.state, Some(1.0));

    // a flat day has no quantile, everything else is still served
    let quantile = readings
        .iter()
        .find(|r| r.kind == StatisticKind::Quantile)
        .unwrap();
    assert!(quantile.state.is_none());
    let median = readings
        .iter()
        .find(|r| r.kind == StatisticKind::MedianPrice)
        .unwrap();
    assert_eq!(median.state, Some(1.0));
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_snapshot() {
    let source = VersionedSource::new();
    let coordinator = coordinator(source);
    let now = day_start() + Duration::hours(1);

    coordinator.refresh(now).await.unwrap();
    let generation = coordinator.store().generation();

    // swap in a failing source by sharing the store with a second coordinator
    let failing = VersionedSource::new();
    failing.fail.store(true, Ordering::SeqCst);
    let second = RefreshCoordinator::new(
        Box::new(failing),
        Arc::new(NullFetcher),
        Berlin,
        NetPriceCalculator::default(),
    )
    .with_store(coordinator.store().clone());

    let err = second.refresh(now).await.unwrap_err();
    assert!(err.is_structural());

    // the failed attempt consumed a ticket but published nothing
    assert_eq!(coordinator.store().generation(), generation);
    let snapshot = coordinator.store().snapshot().unwrap();
    assert_eq!(snapshot.data.intervals()[0].price_per_mwh(), 1.0);
}

#[tokio::test(start_paused = true)]
async fn test_superseded_fetch_does_not_overwrite_newer_data() {
    let mut source = VersionedSource::new();
    source.first_call_delay = Some(StdDuration::from_secs(30));
    let coordinator = coordinator(source);
    let now = day_start() + Duration::hours(2);

    let (slow, fast) = tokio::join!(coordinator.refresh(now), async {
        tokio::time::sleep(StdDuration::from_secs(1)).await;
        coordinator.refresh(now).await
    });

    assert_eq!(fast.unwrap(), PublishOutcome::Published);
    assert_eq!(slow.unwrap(), PublishOutcome::Superseded);

    let snapshot = coordinator.store().snapshot().unwrap();
    assert_eq!(snapshot.data.intervals()[0].price_per_mwh(), 2.0);
}

#[test]
fn test_readers_never_observe_mixed_snapshots() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap();
    let coordinator = Arc::new(coordinator(VersionedSource::new()));
    let now = day_start() + Duration::hours(12);
    runtime.block_on(coordinator.refresh(now)).unwrap();

    let done = Arc::new(AtomicBool::new(false));
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let coordinator = coordinator.clone();
            let done = done.clone();
            std::thread::spawn(move || {
                let mut checked = 0_u64;
                loop {
                    let snapshot = coordinator.store().snapshot().unwrap();
                    let first = snapshot.data.intervals()[0].price_per_mwh();
                    assert!(
                        snapshot
                            .data
                            .iter()
                            .all(|interval| interval.price_per_mwh() == first),
                        "mixed snapshot observed"
                    );
                    assert_eq!(snapshot.generation as f64, first);
                    assert_eq!(snapshot.data.len(), 96);
                    checked += 1;
                    if done.load(Ordering::SeqCst) {
                        break;
                    }
                }
                checked
            })
        })
        .collect();

    for _ in 0..200 {
        runtime.block_on(coordinator.refresh(now)).unwrap();
    }
    done.store(true, Ordering::SeqCst);

    for reader in readers {
        assert!(reader.join().unwrap() > 0);
    }
    assert_eq!(coordinator.store().generation(), Some(201));
}
