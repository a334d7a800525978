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

//! Upstream spot price feeds and their HTTP transport

pub mod awattar;
pub mod epex_web;
pub mod factory;
pub mod http;

pub use awattar::AwattarSource;
pub use epex_web::{CsvTableScraper, EPEX_SPOT_WEB_URL, EpexSpotWebSource, TableScraper};
pub use factory::build_source;
pub use http::HttpFetcher;
