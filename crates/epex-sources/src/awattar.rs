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

//! Awattar market data API (v1)

use async_trait::async_trait;
use chrono::DateTime;
use chrono_tz::Tz;
use epex_core::{
    Fetcher, MarketDataSet, MarketError, PriceSource, RawPriceRecord, RequestWindow, Result,
    SourceKind,
};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

const DISPLAY_NAME: &str = "Awattar API V1";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct MarketDataResponse {
    data: Option<Vec<MarketDataEntry>>,
}

/// Fields stay optional so a missing one names itself in the error
#[derive(Debug, Deserialize)]
struct MarketDataEntry {
    start_timestamp: Option<i64>,
    end_timestamp: Option<i64>,
    marketprice: Option<f64>,
    unit: Option<String>,
}

impl MarketDataEntry {
    fn into_record(self, index: usize) -> Result<RawPriceRecord> {
        let missing = |field: &str| {
            MarketError::MalformedResponse(format!("record {index} has no '{field}' field"))
        };

        Ok(RawPriceRecord {
            unit: self.unit.ok_or_else(|| missing("unit"))?,
            start_timestamp_ms: self.start_timestamp.ok_or_else(|| missing("start_timestamp"))?,
            end_timestamp_ms: self.end_timestamp.ok_or_else(|| missing("end_timestamp"))?,
            price: self.marketprice.ok_or_else(|| missing("marketprice"))?,
            buy_volume: None,
            sell_volume: None,
        })
    }
}

/// Hourly day-ahead prices from `api.awattar.{at,de}`
#[derive(Debug, Clone)]
pub struct AwattarSource {
    market_area: String,
    url: String,
    timeout: Duration,
}

impl AwattarSource {
    pub fn new(market_area: &str) -> Result<Self> {
        let market_area = SourceKind::Awattar.normalize_market_area(market_area)?;
        Ok(Self {
            market_area: market_area.to_string(),
            url: format!("https://api.awattar.{market_area}/v1/marketdata"),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Point at a different host (mock servers, proxies)
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.url = format!("{}/v1/marketdata", base_url.trim_end_matches('/'));
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn parse(body: &str) -> Result<Vec<RawPriceRecord>> {
        let response: MarketDataResponse = serde_json::from_str(body).map_err(|e| {
            MarketError::MalformedResponse(format!("Failed to parse Awattar response: {e}"))
        })?;

        let entries = response.data.ok_or_else(|| {
            MarketError::MalformedResponse("Awattar response has no 'data' field".to_string())
        })?;

        entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| entry.into_record(index))
            .collect()
    }
}

#[async_trait]
impl PriceSource for AwattarSource {
    async fn fetch(&self, fetcher: &dyn Fetcher, now: DateTime<Tz>) -> Result<MarketDataSet> {
        let window = RequestWindow::starting_today(&now)?;
        let params = vec![
            ("start".to_string(), window.start_millis().to_string()),
            ("end".to_string(), window.end_millis().to_string()),
        ];

        debug!(
            "[AWATTAR] Requesting {} for {} .. {}",
            self.url, window.start, window.end
        );

        let body = fetcher.get(&self.url, &params, self.timeout).await?;
        let records = Self::parse(&body)?;

        if !records
            .windows(2)
            .all(|pair| pair[0].start_timestamp_ms <= pair[1].start_timestamp_ms)
        {
            warn!("[AWATTAR] Records arrived out of order, sorting by start time");
        }

        let market_data = MarketDataSet::from_raw(self.market_area.as_str(), &records)?;

        info!(
            "[AWATTAR] Fetched {} intervals for market area {}",
            market_data.len(),
            self.market_area
        );

        Ok(market_data)
    }

    fn name(&self) -> &str {
        DISPLAY_NAME
    }

    fn market_area(&self) -> &str {
        &self.market_area
    }
}
