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

//! Error types shared by every crate in the workspace

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarketError {
    /// Transport or HTTP failure while talking to an upstream feed.
    #[error("fetch from {url} failed: {reason}")]
    Fetch { url: String, reason: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("invalid unit: expected {expected}, got {found}")]
    InvalidUnit { expected: String, found: String },

    #[error("invalid interval: end {end} is not after start {start}")]
    InvalidInterval {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("duplicate interval starting at {0}")]
    DuplicateInterval(DateTime<Utc>),

    #[error("interval ending at {previous_end} overlaps interval starting at {next_start}")]
    OverlappingIntervals {
        previous_end: DateTime<Utc>,
        next_start: DateTime<Utc>,
    },

    #[error("no interval covers {0}")]
    NoCurrentInterval(DateTime<Utc>),

    #[error("no price data for the requested day")]
    NoData,

    #[error("all prices of the day equal {0}, quantile is undefined")]
    DegenerateRange(f64),

    #[error("source does not report traded volume")]
    VolumeNotReported,

    #[error("config error: {0}")]
    Config(String),
}

impl MarketError {
    /// Failures the scheduler may retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Fetch { .. })
    }

    /// Parse-time violations that reject a whole fetch.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::MalformedResponse(_)
                | Self::InvalidUnit { .. }
                | Self::InvalidInterval { .. }
                | Self::DuplicateInterval(_)
                | Self::OverlappingIntervals { .. }
        )
    }

    /// Conditions reported per statistic as "unavailable".
    pub fn is_query_time(&self) -> bool {
        matches!(
            self,
            Self::NoCurrentInterval(_)
                | Self::NoData
                | Self::DegenerateRange(_)
                | Self::VolumeNotReported
        )
    }
}

pub type Result<T> = std::result::Result<T, MarketError>;
