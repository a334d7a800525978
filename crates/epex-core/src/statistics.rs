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

//! Named statistics and their history attributes for the presentation layer

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::fmt;

use crate::aggregator::PriceAggregator;
use crate::error::Result;
use crate::interval::{PriceInterval, UNIT_CT_PER_KWH, UNIT_EUR_PER_MWH};

pub const ATTR_DATA: &str = "data";
pub const ATTR_START_TIME: &str = "start_time";
pub const ATTR_END_TIME: &str = "end_time";
pub const ATTR_PRICE_PER_MWH: &str = "price_per_mwh";
pub const ATTR_PRICE_PER_KWH: &str = "price_per_kwh";
pub const ATTR_BUY_VOLUME: &str = "buy_volume_mwh";
pub const ATTR_SELL_VOLUME: &str = "sell_volume_mwh";
pub const ATTR_VOLUME: &str = "volume_mwh";

const UNIT_MWH: &str = "MWh";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatisticKind {
    Price,
    NetPrice,
    Rank,
    Quantile,
    LowestPrice,
    HighestPrice,
    AveragePrice,
    MedianPrice,
    BuyVolume,
    SellVolume,
    Volume,
}

impl StatisticKind {
    const PRICE_KINDS: [StatisticKind; 8] = [
        Self::Price,
        Self::NetPrice,
        Self::Rank,
        Self::Quantile,
        Self::LowestPrice,
        Self::HighestPrice,
        Self::AveragePrice,
        Self::MedianPrice,
    ];

    const VOLUME_KINDS: [StatisticKind; 3] = [Self::BuyVolume, Self::SellVolume, Self::Volume];

    /// Statistics a source can back; volume kinds need a volume-reporting source
    pub fn available(reports_volume: bool) -> Vec<StatisticKind> {
        let mut kinds = Self::PRICE_KINDS.to_vec();
        if reports_volume {
            kinds.extend_from_slice(&Self::VOLUME_KINDS);
        }
        kinds
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::Price => "price",
            Self::NetPrice => "net_price",
            Self::Rank => "rank",
            Self::Quantile => "quantile",
            Self::LowestPrice => "lowest_price",
            Self::HighestPrice => "highest_price",
            Self::AveragePrice => "average_price",
            Self::MedianPrice => "median_price",
            Self::BuyVolume => "buy_volume",
            Self::SellVolume => "sell_volume",
            Self::Volume => "volume",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Self::Price
            | Self::LowestPrice
            | Self::HighestPrice
            | Self::AveragePrice
            | Self::MedianPrice => UNIT_EUR_PER_MWH,
            Self::NetPrice => UNIT_CT_PER_KWH,
            Self::Rank | Self::Quantile => "",
            Self::BuyVolume | Self::SellVolume | Self::Volume => UNIT_MWH,
        }
    }

    pub fn is_volume(&self) -> bool {
        Self::VOLUME_KINDS.contains(self)
    }
}

impl fmt::Display for StatisticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// One statistic as handed to the presentation layer
///
/// `state` is `None` when the statistic is currently unavailable; the reason
/// is kept for display and logs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticReading {
    pub kind: StatisticKind,
    pub state: Option<f64>,
    pub unit: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unavailable_reason: Option<String>,
    pub attributes: Value,
}

impl PriceAggregator<'_> {
    /// Compute one statistic; failures only affect this reading
    pub fn read(&self, kind: StatisticKind) -> StatisticReading {
        let result = match kind {
            StatisticKind::Price => self.current_price().map(|price| {
                let mut attrs = self.history_attributes(price_entry);
                attrs.insert(ATTR_PRICE_PER_KWH.to_string(), json!(price / 10.0));
                (price, Value::Object(attrs))
            }),
            StatisticKind::NetPrice => self.net_price().map(|net| {
                let attrs = self.history_attributes(|interval| {
                    json!({
                        ATTR_START_TIME: interval.start_time().to_rfc3339(),
                        ATTR_END_TIME: interval.end_time().to_rfc3339(),
                        ATTR_PRICE_PER_KWH: self.net_price_of(interval),
                    })
                });
                (net, Value::Object(attrs))
            }),
            StatisticKind::Rank => self
                .rank()
                .map(|rank| (rank as f64, Value::Object(Map::new()))),
            StatisticKind::Quantile => self
                .quantile()
                .map(|quantile| (quantile, Value::Object(Map::new()))),
            StatisticKind::LowestPrice => self.lowest().map(extreme_reading),
            StatisticKind::HighestPrice => self.highest().map(extreme_reading),
            StatisticKind::AveragePrice => self.average_price().map(per_kwh_reading),
            StatisticKind::MedianPrice => self.median_price().map(per_kwh_reading),
            StatisticKind::BuyVolume => self.volume_reading(self.buy_volume(), ATTR_BUY_VOLUME, |i| {
                i.buy_volume_mwh()
            }),
            StatisticKind::SellVolume => {
                self.volume_reading(self.sell_volume(), ATTR_SELL_VOLUME, |i| {
                    i.sell_volume_mwh()
                })
            }
            StatisticKind::Volume => {
                self.volume_reading(self.total_volume(), ATTR_VOLUME, PriceInterval::volume_mwh)
            }
        };

        match result {
            Ok((state, attributes)) => StatisticReading {
                kind,
                state: Some(state),
                unit: kind.unit(),
                unavailable_reason: None,
                attributes,
            },
            Err(e) => StatisticReading {
                kind,
                state: None,
                unit: kind.unit(),
                unavailable_reason: Some(e.to_string()),
                attributes: Value::Object(Map::new()),
            },
        }
    }

    /// Read a list of statistics
    pub fn read_all(&self, kinds: &[StatisticKind]) -> Vec<StatisticReading> {
        kinds.iter().map(|kind| self.read(*kind)).collect()
    }

    /// Full fetched window in the canonical history shape
    pub fn price_history(&self) -> Vec<Value> {
        self.market_data().iter().map(price_entry).collect()
    }

    fn history_attributes(&self, entry: impl Fn(&PriceInterval) -> Value) -> Map<String, Value> {
        let data: Vec<Value> = self.market_data().iter().map(entry).collect();
        let mut attrs = Map::new();
        attrs.insert(ATTR_DATA.to_string(), Value::Array(data));
        attrs
    }

    fn volume_reading(
        &self,
        current: Result<f64>,
        attr: &'static str,
        volume: impl Fn(&PriceInterval) -> Option<f64>,
    ) -> Result<(f64, Value)> {
        current.map(|value| {
            let attrs = self.history_attributes(|interval| {
                json!({
                    ATTR_START_TIME: interval.start_time().to_rfc3339(),
                    ATTR_END_TIME: interval.end_time().to_rfc3339(),
                    attr: volume(interval),
                })
            });
            (value, Value::Object(attrs))
        })
    }
}

fn price_entry(interval: &PriceInterval) -> Value {
    let mut entry = Map::new();
    entry.insert(
        ATTR_START_TIME.to_string(),
        json!(interval.start_time().to_rfc3339()),
    );
    entry.insert(
        ATTR_END_TIME.to_string(),
        json!(interval.end_time().to_rfc3339()),
    );
    entry.insert(
        ATTR_PRICE_PER_MWH.to_string(),
        json!(interval.price_per_mwh()),
    );
    entry.insert(
        ATTR_PRICE_PER_KWH.to_string(),
        json!(interval.price_per_kwh()),
    );
    if let Some(buy) = interval.buy_volume_mwh() {
        entry.insert(ATTR_BUY_VOLUME.to_string(), json!(buy));
    }
    if let Some(sell) = interval.sell_volume_mwh() {
        entry.insert(ATTR_SELL_VOLUME.to_string(), json!(sell));
    }
    if let Some(volume) = interval.volume_mwh() {
        entry.insert(ATTR_VOLUME.to_string(), json!(volume));
    }
    Value::Object(entry)
}

fn extreme_reading(interval: &PriceInterval) -> (f64, Value) {
    (
        interval.price_per_mwh(),
        json!({
            ATTR_START_TIME: interval.start_time().to_rfc3339(),
            ATTR_END_TIME: interval.end_time().to_rfc3339(),
            ATTR_PRICE_PER_KWH: interval.price_per_kwh(),
        }),
    )
}

fn per_kwh_reading(price_per_mwh: f64) -> (f64, Value) {
    (
        price_per_mwh,
        json!({ ATTR_PRICE_PER_KWH: price_per_mwh / 10.0 }),
    )
}
