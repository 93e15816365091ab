//! Shared test harness for integration tests.
//!
//! Provides a [`StubTool`] standing in for ffprobe/ffmpeg, a
//! [`RecordingNotifier`] that remembers refreshed sections, and helpers for
//! laying out library directories with controlled modification times.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use filetime::FileTime;

use playready::config::{Config, LibraryConfig};
use playready::notifications::CatalogNotifier;
use playready::probe::{MediaInfo, MediaTool, StreamInfo};
use playready::scanner::LibraryScanner;
use playready_av::EncodeRequest;

/// File body the stub reports as h264/aac in mp4.
pub const COMPATIBLE: &[u8] = b"h264+aac in mp4";
/// File body the stub reports as hevc/dts in matroska, 6 channels.
pub const INCOMPATIBLE: &[u8] = b"hevc+dts in mkv";
/// File body the stub cannot probe.
pub const UNPROBEABLE: &[u8] = b"not media";

/// Well past the default stability threshold.
pub const OLD: Duration = Duration::from_secs(2 * 60 * 60);

/// Probes by file content and "encodes" by writing [`COMPATIBLE`].
pub struct StubTool {
    encode_ok: bool,
    pub probes: AtomicUsize,
    pub encodes: AtomicUsize,
    pub requests: Mutex<Vec<EncodeRequest>>,
}

impl StubTool {
    pub fn new() -> Arc<Self> {
        Self::with_encode_result(true)
    }

    pub fn failing() -> Arc<Self> {
        Self::with_encode_result(false)
    }

    fn with_encode_result(encode_ok: bool) -> Arc<Self> {
        Arc::new(Self {
            encode_ok,
            probes: AtomicUsize::new(0),
            encodes: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn encode_count(&self) -> usize {
        self.encodes.load(Ordering::SeqCst)
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaTool for StubTool {
    async fn probe(&self, path: &Path) -> playready_av::Result<MediaInfo> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        let body = tokio::fs::read(path).await?;

        if body == COMPATIBLE {
            Ok(MediaInfo::new(
                ["mov", "mp4", "m4a", "3gp", "3g2", "mj2"],
                vec![StreamInfo::video("h264"), StreamInfo::audio("aac", Some(2))],
            ))
        } else if body == INCOMPATIBLE {
            Ok(MediaInfo::new(
                ["matroska", "webm"],
                vec![StreamInfo::video("hevc"), StreamInfo::audio("dts", Some(6))],
            ))
        } else {
            Err(playready_av::Error::parse_error("ffprobe", "invalid data"))
        }
    }

    async fn encode(&self, request: &EncodeRequest) -> playready_av::Result<()> {
        self.encodes.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        if self.encode_ok {
            tokio::fs::write(&request.output, COMPATIBLE).await?;
            Ok(())
        } else {
            tokio::fs::write(&request.output, b"truncated").await?;
            Err(playready_av::Error::tool_failed("ffmpeg", "exit status: 1"))
        }
    }
}

/// Remembers every section it was asked to refresh.
#[derive(Default)]
pub struct RecordingNotifier {
    sections: Mutex<Vec<u32>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sections(&self) -> Vec<u32> {
        self.sections.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl CatalogNotifier for RecordingNotifier {
    async fn notify(&self, section: u32) {
        if let Ok(mut sections) = self.sections.lock() {
            sections.push(section);
        }
    }
}

/// Config with one library at `root`, no settle pause and the default
/// stability threshold.
pub fn test_config(root: &Path, section: u32) -> Config {
    let mut config = Config::default();
    config.scan.settle_secs = 0;
    config.libraries = vec![LibraryConfig {
        name: "test".to_string(),
        path: root.to_path_buf(),
        section,
    }];
    config
}

pub fn scanner(config: &Config, tool: Arc<StubTool>, notifier: Arc<RecordingNotifier>) -> LibraryScanner {
    LibraryScanner::new(config, tool, notifier)
}

/// Write `body` to `dir/name` and backdate its mtime by `age`.
pub fn write_aged(dir: &Path, name: &str, body: &[u8], age: Duration) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, body).unwrap();

    let mtime = FileTime::from_system_time(SystemTime::now() - age);
    filetime::set_file_mtime(&path, mtime).unwrap();
    path
}

/// Sorted file names directly inside `dir`.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}
