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

//! Request window computation for day-ahead feeds

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{MarketError, Result};

/// Day-ahead prices for tomorrow publish in the afternoon, two days cover both
pub const REQUEST_WINDOW_DAYS: u64 = 2;

/// Absolute `[start, end)` span requested from a feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    timezone: Tz,
}

impl RequestWindow {
    /// From local midnight of `now`'s date through the same wall time two days later
    pub fn starting_today(now: &DateTime<Tz>) -> Result<Self> {
        let timezone = now.timezone();
        let today = now.date_naive();
        let end_date = today
            .checked_add_days(chrono::Days::new(REQUEST_WINDOW_DAYS))
            .ok_or_else(|| MarketError::Config(format!("date overflow after {today}")))?;

        Ok(Self {
            start: local_midnight(today, &timezone)?.with_timezone(&Utc),
            end: local_midnight(end_date, &timezone)?.with_timezone(&Utc),
            timezone,
        })
    }

    pub fn start_millis(&self) -> i64 {
        self.start.timestamp_millis()
    }

    pub fn end_millis(&self) -> i64 {
        self.end.timestamp_millis()
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Local delivery dates covered by the window
    pub fn delivery_dates(&self) -> Vec<NaiveDate> {
        let first = self.start.with_timezone(&self.timezone).date_naive();
        let last = self.end.with_timezone(&self.timezone).date_naive();
        first.iter_days().take_while(|date| *date < last).collect()
    }
}

/// First valid local instant of `date`
///
/// Midnight can be skipped by a DST transition in a few zones; the first
/// existing quarter hour after it is used instead.
pub fn local_midnight(date: NaiveDate, timezone: &Tz) -> Result<DateTime<Tz>> {
    let midnight = date.and_time(NaiveTime::MIN);
    (0..=16)
        .map(|step| midnight + Duration::minutes(15 * step))
        .find_map(|local| timezone.from_local_datetime(&local).earliest())
        .ok_or_else(|| MarketError::Config(format!("no valid local time on {date} in {timezone}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Europe::{Berlin, Vienna};

    #[test]
    fn test_window_starts_at_local_midnight() {
        let now = Berlin.with_ymd_and_hms(2024, 1, 15, 14, 37, 12).unwrap();
        let window = RequestWindow::starting_today(&now).unwrap();

        assert_eq!(window.start, Utc.with_ymd_and_hms(2024, 1, 14, 23, 0, 0).unwrap());
        assert_eq!(window.end, Utc.with_ymd_and_hms(2024, 1, 16, 23, 0, 0).unwrap());
        assert_eq!(window.end - window.start, Duration::hours(48));
    }

    #[test]
    fn test_window_across_spring_dst_is_shorter() {
        // Clocks jump 02:00 -> 03:00 on 2024-03-31 in central Europe
        let now = Vienna.with_ymd_and_hms(2024, 3, 31, 10, 0, 0).unwrap();
        let window = RequestWindow::starting_today(&now).unwrap();

        assert_eq!(window.start, Utc.with_ymd_and_hms(2024, 3, 30, 23, 0, 0).unwrap());
        assert_eq!(window.end, Utc.with_ymd_and_hms(2024, 4, 1, 22, 0, 0).unwrap());
        assert_eq!(window.end - window.start, Duration::hours(47));
    }

    #[test]
    fn test_window_millis_match_bounds() {
        let now = Berlin.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        let window = RequestWindow::starting_today(&now).unwrap();

        assert_eq!(window.start_millis(), 1705273200000);
        assert_eq!(window.end_millis(), 1705273200000 + 48 * 3_600_000);
    }

    #[test]
    fn test_delivery_dates_cover_today_and_tomorrow() {
        let now = Berlin.with_ymd_and_hms(2024, 12, 31, 20, 0, 0).unwrap();
        let window = RequestWindow::starting_today(&now).unwrap();

        assert_eq!(
            window.delivery_dates(),
            vec![
                NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
                NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            ]
        );
    }

    #[test]
    fn test_local_midnight_in_utc_zone() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let midnight = local_midnight(date, &Tz::UTC).unwrap();
        assert_eq!(
            midnight.with_timezone(&Utc),
            Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
        );
    }
}
