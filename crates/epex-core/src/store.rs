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

//! Copy-on-replace publication of market data snapshots
//!
//! Readers clone an `Arc` to the current snapshot and compute on it without
//! holding the lock. A refresh builds a brand-new set and swaps the pointer.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use crate::market_data::MarketDataSet;

/// Issued when a refresh starts; only the newest ticket may publish
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RefreshTicket(u64);

impl RefreshTicket {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Published,
    /// A newer refresh started meanwhile; the result was dropped
    Superseded,
}

/// Immutable published dataset
#[derive(Debug)]
pub struct MarketSnapshot {
    pub generation: u64,
    pub published_at: DateTime<Utc>,
    pub data: MarketDataSet,
}

#[derive(Debug, Default)]
pub struct MarketDataStore {
    current: RwLock<Option<Arc<MarketSnapshot>>>,
    latest_ticket: AtomicU64,
}

impl MarketDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_refresh(&self) -> RefreshTicket {
        RefreshTicket(self.latest_ticket.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Install `data` unless a newer refresh was started after `ticket`
    pub fn publish(
        &self,
        ticket: RefreshTicket,
        data: MarketDataSet,
        published_at: DateTime<Utc>,
    ) -> PublishOutcome {
        let snapshot = Arc::new(MarketSnapshot {
            generation: ticket.0,
            published_at,
            data,
        });

        let mut current = self.current.write();
        if ticket.0 != self.latest_ticket.load(Ordering::SeqCst) {
            debug!(
                "[STORE] Dropping result of refresh #{} (latest is #{})",
                ticket.0,
                self.latest_ticket.load(Ordering::SeqCst)
            );
            return PublishOutcome::Superseded;
        }
        *current = Some(snapshot);
        PublishOutcome::Published
    }

    /// Current snapshot, `None` until the first successful refresh
    pub fn snapshot(&self) -> Option<Arc<MarketSnapshot>> {
        self.current.read().clone()
    }

    pub fn generation(&self) -> Option<u64> {
        self.current.read().as_ref().map(|snapshot| snapshot.generation)
    }
}
