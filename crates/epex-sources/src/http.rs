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

//! reqwest-backed `Fetcher`

use async_trait::async_trait;
use epex_core::{Fetcher, MarketError, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error};

const USER_AGENT: &str = concat!("epex-spot/", env!("CARGO_PKG_VERSION"));

/// Plain HTTP GET transport; no retries
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| MarketError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Reuse an existing client (shared connection pool)
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(
        &self,
        url: &str,
        params: &[(String, String)],
        timeout: Duration,
    ) -> Result<String> {
        debug!("[HTTP] GET {} params={:?}", url, params);

        let response = self
            .client
            .get(url)
            .query(params)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                error!("[HTTP] Request to {} failed: {}", url, e);
                MarketError::Fetch {
                    url: url.to_string(),
                    reason: format!("Request failed: {e}"),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            error!("[HTTP] {} returned {}", url, status);
            return Err(MarketError::Fetch {
                url: url.to_string(),
                reason: format!("HTTP {status}: {body}"),
            });
        }

        response.text().await.map_err(|e| MarketError::Fetch {
            url: url.to_string(),
            reason: format!("Failed to read response body: {e}"),
        })
    }
}
