//! Periodic scan loop over all configured libraries.

use crate::config::{Config, LibraryConfig};
use crate::scanner::{LibraryScanner, ScanSummary};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Runs a full pass over every library, sleeps, and repeats until cancelled.
pub struct Scheduler {
    libraries: Vec<LibraryConfig>,
    scanner: LibraryScanner,
    interval: Duration,
    cancel: CancellationToken,
}

impl Scheduler {
    pub fn new(config: &Config, scanner: LibraryScanner) -> Self {
        let cancel = CancellationToken::new();
        Self {
            libraries: config.libraries.clone(),
            scanner: scanner.with_cancel(cancel.clone()),
            interval: config.scan.interval(),
            cancel,
        }
    }

    /// Token that stops the loop when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Request the loop to stop at the next file or sleep boundary.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Scan every library once, in configured order.
    ///
    /// A library that cannot be scanned is logged and does not stop the
    /// others.
    pub async fn run_cycle(&self) -> Vec<(String, anyhow::Result<ScanSummary>)> {
        let mut results = Vec::with_capacity(self.libraries.len());

        for library in &self.libraries {
            if self.cancel.is_cancelled() {
                break;
            }

            tracing::info!(library = %library.name, path = ?library.path, "Scanning library");
            let result = self.scanner.scan(&library.path, library.section).await;
            if let Err(e) = &result {
                tracing::error!(library = %library.name, "Library scan failed: {e:#}");
            }
            results.push((library.name.clone(), result));
        }

        results
    }

    /// Cycle forever, sleeping `interval` between passes.
    pub async fn run(&self) {
        tracing::info!(
            "Scheduler started with {} libraries, interval {:?}",
            self.libraries.len(),
            self.interval
        );

        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            self.run_cycle().await;

            tracing::info!("Cycle complete, sleeping for {:?}", self.interval);
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = self.cancel.cancelled() => { break; }
            }
        }

        tracing::info!("Scheduler stopped");
    }
}
