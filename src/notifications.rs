//! Catalog refresh notifications.
//!
//! After a conversion the media catalog (Plex) is asked to re-scan the
//! library section that holds the file. Notifications are fire-and-forget:
//! failures are logged and never reach the caller.

use crate::config::CatalogConfig;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;

/// Something that can be told a library section changed.
#[async_trait]
pub trait CatalogNotifier: Send + Sync {
    /// Ask the catalog to refresh `section`. Never fails.
    async fn notify(&self, section: u32);
}

/// Build the notifier described by `config`.
pub fn from_config(config: &CatalogConfig) -> Arc<dyn CatalogNotifier> {
    if config.enabled {
        Arc::new(PlexNotifier::new(config))
    } else {
        tracing::info!("Catalog notifications disabled");
        Arc::new(NoopNotifier)
    }
}

/// Sends `GET <url>/library/sections/<section>/refresh` with a token header.
pub struct PlexNotifier {
    client: Client,
    base_url: String,
    token_header: String,
    token: String,
}

impl PlexNotifier {
    pub fn new(config: &CatalogConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client: {}", e);
                Client::new()
            });

        Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            token_header: config.token_header.clone(),
            token: config.token.clone(),
        }
    }

    /// Refresh URL for `section`.
    pub fn refresh_url(&self, section: u32) -> String {
        format!("{}/library/sections/{}/refresh", self.base_url, section)
    }
}

#[async_trait]
impl CatalogNotifier for PlexNotifier {
    async fn notify(&self, section: u32) {
        let url = self.refresh_url(section);

        match self
            .client
            .get(&url)
            .header(self.token_header.as_str(), &self.token)
            .send()
            .await
        {
            Ok(resp) if resp.status() == StatusCode::OK => {
                tracing::info!(section, "Catalog refresh triggered");
            }
            Ok(resp) => {
                tracing::warn!(
                    section,
                    status = %resp.status(),
                    "Catalog refresh returned non-success status"
                );
            }
            Err(e) => {
                tracing::warn!(section, error = %e, "Failed to contact catalog for refresh");
            }
        }
    }
}

/// Notifier that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

#[async_trait]
impl CatalogNotifier for NoopNotifier {
    async fn notify(&self, section: u32) {
        tracing::debug!(section, "Catalog notification skipped");
    }
}
