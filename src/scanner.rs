//! Library scanner.
//!
//! Walks a library root, picks out video files that have stopped changing,
//! and runs each through probe → compatibility check → conversion →
//! catalog notification. Files are handled one at a time and every pass
//! starts from scratch; nothing is remembered between passes.

use crate::config::{CompatibilityPolicy, Config};
use crate::notifications::CatalogNotifier;
use crate::policy;
use crate::probe::MediaTool;
use crate::transcode::{ConversionJob, Transcoder, TEMP_FILE_NAME};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

/// What happened to one candidate file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Modified too recently; may still be copying.
    SkippedRecent,
    /// Already playable.
    SkippedCompatible,
    /// Could not be inspected; retried next pass.
    ProbeFailed,
    /// Converted; holds the new path.
    Converted(PathBuf),
    /// Conversion attempted and failed.
    Failed,
}

/// Counts for one scan of one library root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub candidates: usize,
    pub skipped_recent: usize,
    pub skipped_compatible: usize,
    pub probe_failed: usize,
    pub converted: usize,
    pub failed: usize,
}

impl ScanSummary {
    fn record(&mut self, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::SkippedRecent => self.skipped_recent += 1,
            FileOutcome::SkippedCompatible => self.skipped_compatible += 1,
            FileOutcome::ProbeFailed => self.probe_failed += 1,
            FileOutcome::Converted(_) => self.converted += 1,
            FileOutcome::Failed => self.failed += 1,
        }
    }
}

/// Scanner for finding and converting incompatible files.
pub struct LibraryScanner {
    tool: Arc<dyn MediaTool>,
    transcoder: Transcoder,
    notifier: Arc<dyn CatalogNotifier>,
    policy: CompatibilityPolicy,
    extensions: Vec<String>,
    stability: Duration,
    settle: Duration,
    cancel: CancellationToken,
}

impl LibraryScanner {
    /// Create a scanner from configuration and its collaborators.
    pub fn new(
        config: &Config,
        tool: Arc<dyn MediaTool>,
        notifier: Arc<dyn CatalogNotifier>,
    ) -> Self {
        Self {
            transcoder: Transcoder::new(tool.clone(), config.encode.clone()),
            tool,
            notifier,
            policy: config.policy.clone(),
            extensions: config
                .scan
                .extensions
                .iter()
                .map(|e| e.to_lowercase())
                .collect(),
            stability: config.scan.stability(),
            settle: config.scan.settle(),
            cancel: CancellationToken::new(),
        }
    }

    /// Stop between files when `cancel` fires.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Whether `path` names a file this scanner would consider.
    pub fn is_candidate(&self, path: &Path) -> bool {
        if path.file_name().is_some_and(|n| n == TEMP_FILE_NAME) {
            return false;
        }

        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.iter().any(|e| e == &ext.to_lowercase()))
            .unwrap_or(false)
    }

    /// Whether a file last modified at `modified` has been quiet long enough.
    /// Modification times in the future count as recent.
    pub fn is_settled(&self, modified: SystemTime, now: SystemTime) -> bool {
        now.duration_since(modified)
            .map(|age| age >= self.stability)
            .unwrap_or(false)
    }

    /// Scan one library root and convert what needs converting.
    ///
    /// Only failing to read `root` itself is an error; per-file problems are
    /// logged and counted.
    pub async fn scan(&self, root: &Path, section: u32) -> Result<ScanSummary> {
        info!("Scanning directory: {:?}", root);

        let candidates = self.discover(root)?;
        let now = SystemTime::now();
        let mut summary = ScanSummary {
            candidates: candidates.len(),
            ..ScanSummary::default()
        };

        for path in candidates {
            if self.cancel.is_cancelled() {
                info!("Scan of {:?} cancelled", root);
                break;
            }

            let outcome = self.process_file(&path, section, now).await;
            summary.record(&outcome);
        }

        info!(
            "Scan complete for {:?}: {} candidates, {} converted, {} failed, {} probe failures, {} compatible, {} too recent",
            root,
            summary.candidates,
            summary.converted,
            summary.failed,
            summary.probe_failed,
            summary.skipped_compatible,
            summary.skipped_recent
        );

        Ok(summary)
    }

    /// List candidate files under `root`, fully, before anything is touched.
    fn discover(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let meta = std::fs::metadata(root)
            .with_context(|| format!("Cannot read library root: {:?}", root))?;
        if !meta.is_dir() {
            anyhow::bail!("Library root is not a directory: {:?}", root);
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(root).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    return Err(e).with_context(|| format!("Cannot enumerate {:?}", root));
                }
                Err(e) => {
                    warn!("Skipping unreadable entry under {:?}: {}", root, e);
                    continue;
                }
            };

            if entry.file_type().is_file() && self.is_candidate(entry.path()) {
                files.push(entry.into_path());
            }
        }

        files.sort();
        Ok(files)
    }

    /// Run a single file through the pipeline.
    pub async fn process_file(&self, path: &Path, section: u32, now: SystemTime) -> FileOutcome {
        let modified = match std::fs::metadata(path).and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) => {
                warn!("Skipping {:?} due to error checking time: {}", path, e);
                return FileOutcome::SkippedRecent;
            }
        };

        if !self.is_settled(modified, now) {
            debug!(file = %path.display(), "Skipping recently modified file");
            return FileOutcome::SkippedRecent;
        }

        let info = match self.tool.probe(path).await {
            Ok(info) => info,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "Failed to probe");
                return FileOutcome::ProbeFailed;
            }
        };

        if policy::is_compatible(Some(&info), &self.policy) {
            debug!("Already compatible: {:?}", path);
            return FileOutcome::SkippedCompatible;
        }

        let job = match ConversionJob::plan(path, Some(&info)) {
            Ok(job) => job,
            Err(e) => {
                error!("Cannot plan conversion for {:?}: {}", path, e);
                return FileOutcome::Failed;
            }
        };

        match self.transcoder.convert(&job).await {
            Ok(output) => {
                self.notifier.notify(section).await;
                self.settle().await;
                FileOutcome::Converted(output)
            }
            Err(e) => {
                error!(file = %path.display(), error = %e, "Conversion failed");
                FileOutcome::Failed
            }
        }
    }

    async fn settle(&self) {
        if self.settle.is_zero() {
            return;
        }
        tokio::select! {
            _ = self.cancel.cancelled() => {}
            _ = tokio::time::sleep(self.settle) => {}
        }
    }
}
