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

mod config;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use epex_core::{AppConfig, NetPriceCalculator, PublishOutcome, RefreshCoordinator};
use epex_sources::{HttpFetcher, build_source};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "epex-spot", version)]
#[command(about = "Day-ahead spot price statistics from Awattar and EPEX Spot", long_about = None)]
struct Cli {
    /// Configuration file (TOML, or JSON by extension)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Refresh once, print the statistics as JSON and exit
    #[arg(long)]
    once: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, origin) = config::load_config(cli.config.as_deref())?;

    // RUST_LOG wins over the configured level
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.system.log_level)),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install tracing subscriber")?;

    info!("Starting EPEX Spot {}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded from {}", origin);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    runtime.block_on(run(config, cli.once))
}

async fn run(config: AppConfig, once: bool) -> Result<()> {
    let timezone = config.system.timezone()?;
    let source = build_source(&config.source, config.system.request_timeout())?;
    let fetcher = Arc::new(HttpFetcher::new()?);
    let coordinator = RefreshCoordinator::new(
        source,
        fetcher,
        timezone,
        NetPriceCalculator::new(config.pricing),
    );

    info!("   Source: {}", coordinator.source().name());
    info!("   Market area: {}", coordinator.source().market_area());
    info!("   Timezone: {}", timezone);
    info!(
        "   Net price: +{}% +{} ct/kWh, VAT {}%",
        config.pricing.surcharge_percent,
        config.pricing.surcharge_absolute,
        config.pricing.vat_percent
    );
    info!(
        "   Update interval: {}s",
        config.system.update_interval_secs
    );

    if once {
        coordinator.refresh(Utc::now()).await?;
        let readings = coordinator.readings(Utc::now()).unwrap_or_default();
        println!("{}", serde_json::to_string_pretty(&readings)?);
        return Ok(());
    }

    let mut ticker = tokio::time::interval(config.system.update_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            result = tokio::signal::ctrl_c() => {
                result.context("Failed to listen for shutdown signal")?;
                info!("Shutting down");
                return Ok(());
            }
        }

        match coordinator.refresh(Utc::now()).await {
            Ok(PublishOutcome::Published) => {}
            Ok(PublishOutcome::Superseded) => debug!("Refresh result superseded"),
            Err(e) => debug!("Refresh error handled, retrying next tick: {}", e),
        }

        log_readings(&coordinator);
    }
}

fn log_readings(coordinator: &RefreshCoordinator) {
    let Some(readings) = coordinator.readings(Utc::now()) else {
        warn!("[STATISTICS] No market data available yet");
        return;
    };

    for reading in readings {
        match reading.state {
            Some(state) => info!("[STATISTICS] {} = {} {}", reading.kind, state, reading.unit),
            None => info!(
                "[STATISTICS] {} unavailable: {}",
                reading.kind,
                reading.unavailable_reason.as_deref().unwrap_or("unknown")
            ),
        }
    }
}
