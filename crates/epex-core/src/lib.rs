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

//! Market data normalization and derived spot price statistics

pub mod aggregator;
pub mod config;
pub mod error;
pub mod interval;
pub mod market_data;
pub mod net_price;
pub mod refresh;
pub mod statistics;
pub mod store;
pub mod traits;
pub mod window;

pub use aggregator::PriceAggregator;
pub use config::{AppConfig, SourceConfig, SourceKind, SystemSettingsConfig};
pub use error::{MarketError, Result};
pub use interval::{PriceInterval, RawPriceRecord, UNIT_CT_PER_KWH, UNIT_EUR_PER_MWH};
pub use market_data::MarketDataSet;
pub use net_price::{NetPriceCalculator, NetPriceConfig};
pub use refresh::RefreshCoordinator;
pub use statistics::{StatisticKind, StatisticReading};
pub use store::{MarketDataStore, MarketSnapshot, PublishOutcome, RefreshTicket};
pub use traits::{Fetcher, PriceSource};
pub use window::{RequestWindow, local_midnight};
