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

use crate::awattar::AwattarSource;
use crate::epex_web::EpexSpotWebSource;
use epex_core::{PriceSource, Result, SourceConfig, SourceKind};
use std::time::Duration;
use tracing::info;

/// Build the configured feed
///
/// `base_url` replaces the Awattar host or the full EPEX page URL.
pub fn build_source(config: &SourceConfig, request_timeout: Duration) -> Result<Box<dyn PriceSource>> {
    let source: Box<dyn PriceSource> = match config.kind {
        SourceKind::Awattar => {
            let mut source = AwattarSource::new(&config.market_area)?.with_timeout(request_timeout);
            if let Some(base_url) = &config.base_url {
                source = source.with_base_url(base_url);
            }
            Box::new(source)
        }
        SourceKind::EpexSpotWeb => {
            let mut source =
                EpexSpotWebSource::new(&config.market_area)?.with_timeout(request_timeout);
            if let Some(url) = &config.base_url {
                source = source.with_url(url);
            }
            Box::new(source)
        }
    };

    info!(
        "[SOURCE] Using {} for market area {}",
        source.name(),
        source.market_area()
    );

    Ok(source)
}
