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

//! EPEX Spot market results page (day-ahead auction table)

use async_trait::async_trait;
use chrono::{DateTime, Days, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use epex_core::{
    Fetcher, MarketDataSet, MarketError, PriceSource, RawPriceRecord, RequestWindow, Result,
    SourceKind, UNIT_EUR_PER_MWH,
};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub const EPEX_SPOT_WEB_URL: &str = "https://www.epexspot.com/en/market-data";

const DISPLAY_NAME: &str = "EPEX Spot Web Scraper";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Turns one delivery day's page body into raw records
///
/// An unpublished day is `Ok(vec![])`, not an error.
pub trait TableScraper: Send + Sync {
    fn extract_rows(
        &self,
        body: &str,
        delivery_date: NaiveDate,
        timezone: Tz,
    ) -> Result<Vec<RawPriceRecord>>;
}

#[derive(Debug, Deserialize)]
struct TableRow {
    start: String,
    end: String,
    buy_volume: String,
    sell_volume: String,
    price: String,
}

/// Reads the tabular export `start,end,buy_volume,sell_volume,volume,price`
///
/// Times are local `HH:MM` on the delivery date; an `end` of `00:00` or
/// `24:00` means the following midnight, any other `end` must be after `start`. Interval length is the
/// wall-clock span, so the repeated autumn hour keeps its 60 minutes. The
/// `volume` column is accepted but not used, total volume is derived from buy
/// and sell.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvTableScraper;

impl TableScraper for CsvTableScraper {
    fn extract_rows(
        &self,
        body: &str,
        delivery_date: NaiveDate,
        timezone: Tz,
    ) -> Result<Vec<RawPriceRecord>> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(body.as_bytes());

        let mut records = Vec::new();
        let mut previous_end: Option<DateTime<Utc>> = None;

        for (index, row) in reader.deserialize::<TableRow>().enumerate() {
            let row = row.map_err(|e| {
                MarketError::MalformedResponse(format!("table row {index} is invalid: {e}"))
            })?;

            let start_local = delivery_date.and_time(parse_clock(&row.start, index)?);
            let end_local = match row.end.as_str() {
                "00:00" | "24:00" => next_midnight(delivery_date)?,
                end => delivery_date.and_time(parse_clock(end, index)?),
            };
            if end_local <= start_local {
                return Err(MarketError::MalformedResponse(format!(
                    "row {index}: end {} is not after start {}",
                    row.end, row.start
                )));
            }

            let start = resolve_local(start_local, &timezone, previous_end)?;
            let end = start + (end_local - start_local);

            records.push(RawPriceRecord {
                unit: UNIT_EUR_PER_MWH.to_string(),
                start_timestamp_ms: start.timestamp_millis(),
                end_timestamp_ms: end.timestamp_millis(),
                price: parse_number("price", &row.price, index)?,
                buy_volume: Some(parse_number("buy_volume", &row.buy_volume, index)?),
                sell_volume: Some(parse_number("sell_volume", &row.sell_volume, index)?),
            });
            previous_end = Some(end);
        }

        Ok(records)
    }
}

fn parse_clock(value: &str, index: usize) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|e| MarketError::MalformedResponse(format!("row {index}: bad time '{value}': {e}")))
}

/// Accepts thousands separators (`1,234.5`)
fn parse_number(field: &str, value: &str, index: usize) -> Result<f64> {
    value
        .replace(',', "")
        .parse::<f64>()
        .map_err(|e| {
            MarketError::MalformedResponse(format!("row {index}: bad {field} '{value}': {e}"))
        })
}

fn next_midnight(date: NaiveDate) -> Result<NaiveDateTime> {
    date.checked_add_days(Days::new(1))
        .map(|next| next.and_time(NaiveTime::MIN))
        .ok_or_else(|| MarketError::MalformedResponse(format!("date overflow after {date}")))
}

/// Local wall time to UTC; in a repeated hour the later reading is taken
/// once the earlier one would fall before `not_before`. A start inside the
/// spring gap is rejected.
fn resolve_local(
    local: NaiveDateTime,
    timezone: &Tz,
    not_before: Option<DateTime<Utc>>,
) -> Result<DateTime<Utc>> {
    match timezone.from_local_datetime(&local) {
        LocalResult::Single(instant) => Ok(instant.with_timezone(&Utc)),
        LocalResult::Ambiguous(earlier, later) => {
            let earlier = earlier.with_timezone(&Utc);
            if not_before.is_some_and(|bound| earlier < bound) {
                Ok(later.with_timezone(&Utc))
            } else {
                Ok(earlier)
            }
        }
        LocalResult::None => Err(MarketError::MalformedResponse(format!(
            "local time {local} does not exist in {timezone}"
        ))),
    }
}

/// Day-ahead auction results including traded volume
#[derive(Clone)]
pub struct EpexSpotWebSource {
    market_area: String,
    url: String,
    timeout: Duration,
    scraper: Arc<dyn TableScraper>,
}

impl fmt::Debug for EpexSpotWebSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EpexSpotWebSource")
            .field("market_area", &self.market_area)
            .field("url", &self.url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl EpexSpotWebSource {
    pub fn new(market_area: &str) -> Result<Self> {
        let market_area = SourceKind::EpexSpotWeb.normalize_market_area(market_area)?;
        Ok(Self {
            market_area: market_area.to_string(),
            url: EPEX_SPOT_WEB_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            scraper: Arc::new(CsvTableScraper),
        })
    }

    /// Full page URL, not a host
    #[must_use]
    pub fn with_url(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_scraper(mut self, scraper: Arc<dyn TableScraper>) -> Self {
        self.scraper = scraper;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn query_params(&self, delivery_date: NaiveDate) -> Result<Vec<(String, String)>> {
        let trading_date = delivery_date
            .checked_sub_days(Days::new(1))
            .ok_or_else(|| MarketError::Config(format!("date underflow before {delivery_date}")))?;

        Ok(vec![
            ("market_area".to_string(), self.market_area.clone()),
            ("trading_date".to_string(), trading_date.to_string()),
            ("delivery_date".to_string(), delivery_date.to_string()),
            ("modality".to_string(), "Auction".to_string()),
            ("sub_modality".to_string(), "DayAhead".to_string()),
            ("data_mode".to_string(), "table".to_string()),
        ])
    }
}

#[async_trait]
impl PriceSource for EpexSpotWebSource {
    async fn fetch(&self, fetcher: &dyn Fetcher, now: DateTime<Tz>) -> Result<MarketDataSet> {
        let window = RequestWindow::starting_today(&now)?;
        let timezone = window.timezone();
        let mut records = Vec::new();

        for delivery_date in window.delivery_dates() {
            let params = self.query_params(delivery_date)?;
            debug!(
                "[EPEX WEB] Requesting {} delivery {}",
                self.market_area, delivery_date
            );

            let body = fetcher.get(&self.url, &params, self.timeout).await?;
            let rows = self.scraper.extract_rows(&body, delivery_date, timezone)?;

            if rows.is_empty() {
                info!(
                    "[EPEX WEB] No results for {} delivery {} yet",
                    self.market_area, delivery_date
                );
            }

            if let Some(row) = rows
                .iter()
                .find(|row| row.buy_volume.is_none() || row.sell_volume.is_none())
            {
                return Err(MarketError::MalformedResponse(format!(
                    "row starting at {} ms has no volume",
                    row.start_timestamp_ms
                )));
            }

            records.extend(rows);
        }

        let market_data = MarketDataSet::from_raw(self.market_area.as_str(), &records)?;

        info!(
            "[EPEX WEB] Fetched {} intervals for market area {}",
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

    fn reports_volume(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Timelike, Utc};
    use chrono_tz::Europe::{Berlin, Paris};
    use std::collections::HashMap;
    use std::sync::Mutex;

    const HEADER: &str = "start,end,buy_volume,sell_volume,volume,price\n";

    fn day_table(prices: &[f64]) -> String {
        let mut table = HEADER.to_string();
        for (hour, price) in prices.iter().enumerate() {
            let end = (hour + 1) % 24;
            table.push_str(&format!(
                "{hour:02}:00,{end:02}:00,\"1,000.5\",900.0,1900.5,{price}\n"
            ));
        }
        table
    }

    /// Answers by delivery date, recording the query
    struct TableFetcher {
        bodies: HashMap<String, String>,
        requests: Mutex<Vec<Vec<(String, String)>>>,
    }

    #[async_trait]
    impl Fetcher for TableFetcher {
        async fn get(
            &self,
            _url: &str,
            params: &[(String, String)],
            _timeout: Duration,
        ) -> Result<String> {
            self.requests.lock().unwrap().push(params.to_vec());
            let date = params
                .iter()
                .find(|(key, _)| key == "delivery_date")
                .map(|(_, value)| value.clone())
                .unwrap_or_default();
            Ok(self.bodies.get(&date).cloned().unwrap_or_else(|| HEADER.to_string()))
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_new_normalizes_market_area() {
        let source = EpexSpotWebSource::new("de-lu").unwrap();
        assert_eq!(source.market_area(), "DE-LU");
        assert_eq!(source.name(), "EPEX Spot Web Scraper");
        assert!(source.reports_volume());
        assert_eq!(source.url(), EPEX_SPOT_WEB_URL);

        assert!(matches!(
            EpexSpotWebSource::new("de").unwrap_err(),
            MarketError::Config(_)
        ));
    }

    #[test]
    fn test_query_params_use_previous_trading_day() {
        let source = EpexSpotWebSource::new("FR").unwrap();
        let params = source.query_params(date(2025, 3, 1)).unwrap();
        let lookup: HashMap<_, _> = params.into_iter().collect();

        assert_eq!(lookup["market_area"], "FR");
        assert_eq!(lookup["trading_date"], "2025-02-28");
        assert_eq!(lookup["delivery_date"], "2025-03-01");
        assert_eq!(lookup["modality"], "Auction");
        assert_eq!(lookup["sub_modality"], "DayAhead");
        assert_eq!(lookup["data_mode"], "table");
    }

    #[test]
    fn test_csv_scraper_reads_hourly_table() {
        let prices: Vec<f64> = (0..24).map(f64::from).collect();
        let rows = CsvTableScraper
            .extract_rows(&day_table(&prices), date(2025, 3, 10), Berlin)
            .unwrap();

        assert_eq!(rows.len(), 24);
        let first = &rows[0];
        let start = DateTime::<Utc>::from_timestamp_millis(first.start_timestamp_ms).unwrap();
        assert_eq!(start.hour(), 23);
        assert_eq!(first.end_timestamp_ms - first.start_timestamp_ms, 3_600_000);
        assert_eq!(first.unit, UNIT_EUR_PER_MWH);
        assert_eq!(first.buy_volume, Some(1000.5));
        assert_eq!(first.sell_volume, Some(900.0));

        let last = &rows[23];
        let end = DateTime::<Utc>::from_timestamp_millis(last.end_timestamp_ms).unwrap();
        assert_eq!(end.with_timezone(&Berlin).date_naive(), date(2025, 3, 11));
        assert_eq!(end.with_timezone(&Berlin).hour(), 0);
    }

    #[test]
    fn test_csv_scraper_accepts_24_00_end() {
        let body = format!("{HEADER}23:00,24:00,1.0,2.0,3.0,-5.5\n");
        let rows = CsvTableScraper
            .extract_rows(&body, date(2025, 3, 10), Paris)
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert!((rows[0].price + 5.5).abs() < f64::EPSILON);
        assert_eq!(rows[0].end_timestamp_ms - rows[0].start_timestamp_ms, 3_600_000);
    }

    #[test]
    fn test_csv_scraper_handles_repeated_autumn_hour() {
        // 2025-10-26: Berlin clocks fall back from 03:00 to 02:00
        let mut body = HEADER.to_string();
        for (start, end) in [("01:00", "02:00"), ("02:00", "03:00"), ("02:00", "03:00"), ("03:00", "04:00")] {
            body.push_str(&format!("{start},{end},1,1,2,10\n"));
        }

        let rows = CsvTableScraper
            .extract_rows(&body, date(2025, 10, 26), Berlin)
            .unwrap();

        for pair in rows.windows(2) {
            assert_eq!(pair[0].end_timestamp_ms, pair[1].start_timestamp_ms);
        }
        assert!(rows
            .iter()
            .all(|row| row.end_timestamp_ms - row.start_timestamp_ms == 3_600_000));
    }

    #[test]
    fn test_csv_scraper_rejects_end_before_start() {
        for (start, end) in [("23:00", "05:00"), ("05:00", "04:00"), ("06:00", "06:00")] {
            let body = format!("{HEADER}{start},{end},1,1,2,10\n");
            let err = CsvTableScraper
                .extract_rows(&body, date(2025, 3, 10), Berlin)
                .unwrap_err();
            match err {
                MarketError::MalformedResponse(reason) => assert!(reason.contains("not after start")),
                other => panic!("unexpected error for {start}-{end}: {other}"),
            }
        }
    }

    #[test]
    fn test_csv_scraper_midnight_end_closes_day() {
        let body = format!("{HEADER}23:00,00:00,1,1,2,10\n");
        let rows = CsvTableScraper
            .extract_rows(&body, date(2025, 3, 10), Berlin)
            .unwrap();
        let end = DateTime::<Utc>::from_timestamp_millis(rows[0].end_timestamp_ms).unwrap();
        assert_eq!(end.with_timezone(&Berlin).date_naive(), date(2025, 3, 11));
        assert_eq!(end.with_timezone(&Berlin).hour(), 0);
    }

    #[test]
    fn test_csv_scraper_empty_table() {
        let rows = CsvTableScraper
            .extract_rows(HEADER, date(2025, 3, 10), Berlin)
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_csv_scraper_rejects_missing_column() {
        let body = "start,end,price\n00:00,01:00,10\n";
        let err = CsvTableScraper
            .extract_rows(body, date(2025, 3, 10), Berlin)
            .unwrap_err();
        assert!(matches!(err, MarketError::MalformedResponse(_)));
    }

    #[test]
    fn test_csv_scraper_rejects_bad_number() {
        let body = format!("{HEADER}00:00,01:00,-,1,1,10\n");
        let err = CsvTableScraper
            .extract_rows(&body, date(2025, 3, 10), Berlin)
            .unwrap_err();
        match err {
            MarketError::MalformedResponse(reason) => assert!(reason.contains("buy_volume")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_requests_each_delivery_date() {
        let today: Vec<f64> = (0..24).map(|h| 50.0 + f64::from(h)).collect();
        let tomorrow: Vec<f64> = (0..24).map(|h| 100.0 + f64::from(h)).collect();
        let fetcher = TableFetcher {
            bodies: HashMap::from([
                ("2025-03-10".to_string(), day_table(&today)),
                ("2025-03-11".to_string(), day_table(&tomorrow)),
            ]),
            requests: Mutex::new(Vec::new()),
        };
        let source = EpexSpotWebSource::new("DE-LU").unwrap();
        let now = Berlin.with_ymd_and_hms(2025, 3, 10, 14, 30, 0).unwrap();

        let market_data = source.fetch(&fetcher, now).await.unwrap();

        assert_eq!(market_data.len(), 48);
        assert!(market_data.reports_volume());
        let requests = fetcher.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);

        let current = market_data
            .interval_containing(now.with_timezone(&Utc))
            .unwrap();
        assert!((current.price_per_mwh() - 64.0).abs() < f64::EPSILON);
        assert_eq!(current.volume_mwh(), Some(1900.5));
    }

    #[tokio::test]
    async fn test_unpublished_tomorrow_is_not_an_error() {
        let today: Vec<f64> = (0..24).map(f64::from).collect();
        let fetcher = TableFetcher {
            bodies: HashMap::from([("2025-03-10".to_string(), day_table(&today))]),
            requests: Mutex::new(Vec::new()),
        };
        let source = EpexSpotWebSource::new("DE-LU").unwrap();
        let now = Berlin.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();

        let market_data = source.fetch(&fetcher, now).await.unwrap();
        assert_eq!(market_data.len(), 24);
    }

    struct NoVolumeScraper;

    impl TableScraper for NoVolumeScraper {
        fn extract_rows(
            &self,
            _body: &str,
            delivery_date: NaiveDate,
            timezone: Tz,
        ) -> Result<Vec<RawPriceRecord>> {
            let start = resolve_local(delivery_date.and_time(NaiveTime::MIN), &timezone, None)?;
            Ok(vec![RawPriceRecord {
                unit: UNIT_EUR_PER_MWH.to_string(),
                start_timestamp_ms: start.timestamp_millis(),
                end_timestamp_ms: start.timestamp_millis() + 3_600_000,
                price: 1.0,
                buy_volume: None,
                sell_volume: None,
            }])
        }
    }

    #[tokio::test]
    async fn test_rows_without_volume_are_malformed() {
        let fetcher = TableFetcher {
            bodies: HashMap::new(),
            requests: Mutex::new(Vec::new()),
        };
        let source = EpexSpotWebSource::new("AT")
            .unwrap()
            .with_scraper(Arc::new(NoVolumeScraper));
        let now = Berlin.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();

        let err = source.fetch(&fetcher, now).await.unwrap_err();
        assert!(matches!(err, MarketError::MalformedResponse(_)));
    }
}
