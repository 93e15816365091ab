use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub policy: CompatibilityPolicy,

    #[serde(default)]
    pub encode: EncodeConfig,

    #[serde(default)]
    pub scan: ScanConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default = "default_libraries")]
    pub libraries: Vec<LibraryConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            policy: CompatibilityPolicy::default(),
            encode: EncodeConfig::default(),
            scan: ScanConfig::default(),
            catalog: CatalogConfig::default(),
            tools: ToolsConfig::default(),
            libraries: default_libraries(),
        }
    }
}

/// What the playback target can play without conversion.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CompatibilityPolicy {
    /// The single accepted video codec.
    #[serde(default = "default_video_codec")]
    pub video_codec: String,

    /// Accepted audio codecs; any one of them is enough.
    #[serde(default = "default_audio_codecs")]
    pub audio_codecs: BTreeSet<String>,

    /// Accepted container aliases.
    #[serde(default = "default_containers")]
    pub containers: BTreeSet<String>,
}

fn default_video_codec() -> String {
    "h264".to_string()
}

fn default_audio_codecs() -> BTreeSet<String> {
    ["aac", "ac3"].into_iter().map(String::from).collect()
}

fn default_containers() -> BTreeSet<String> {
    ["mp4", "mkv"].into_iter().map(String::from).collect()
}

impl Default for CompatibilityPolicy {
    fn default() -> Self {
        Self {
            video_codec: default_video_codec(),
            audio_codecs: default_audio_codecs(),
            containers: default_containers(),
        }
    }
}

impl CompatibilityPolicy {
    /// Lower-case and trim every entry so comparisons against probe output
    /// (always lower-case) are exact.
    pub fn normalized(mut self) -> Self {
        self.video_codec = self.video_codec.trim().to_lowercase();
        self.audio_codecs = self
            .audio_codecs
            .iter()
            .map(|c| c.trim().to_lowercase())
            .collect();
        self.containers = self
            .containers
            .iter()
            .map(|c| c.trim().to_lowercase())
            .collect();
        self
    }
}

/// Fixed target profile handed to the encoder.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EncodeConfig {
    /// ffmpeg video encoder (default: libx264).
    #[serde(default = "default_video_encoder")]
    pub video_encoder: String,

    /// ffmpeg audio encoder (default: aac).
    #[serde(default = "default_audio_encoder")]
    pub audio_encoder: String,

    /// Encoding preset (default: medium).
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Constant rate factor (default: 23).
    #[serde(default = "default_crf")]
    pub crf: u32,
}

fn default_video_encoder() -> String {
    "libx264".to_string()
}

fn default_audio_encoder() -> String {
    "aac".to_string()
}

fn default_preset() -> String {
    "medium".to_string()
}

fn default_crf() -> u32 {
    23
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            video_encoder: default_video_encoder(),
            audio_encoder: default_audio_encoder(),
            preset: default_preset(),
            crf: default_crf(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScanConfig {
    /// Candidate file extensions, matched case-insensitively.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Minimum age since last modification before a file is touched.
    #[serde(default = "default_stability_secs")]
    pub stability_secs: u64,

    /// Pause after each conversion that triggered a catalog refresh.
    #[serde(default = "default_settle_secs")]
    pub settle_secs: u64,

    /// Sleep between full passes over all libraries.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

fn default_extensions() -> Vec<String> {
    ["mp4", "mkv", "avi", "mov"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_stability_secs() -> u64 {
    60 * 60
}

fn default_settle_secs() -> u64 {
    10
}

fn default_interval_secs() -> u64 {
    1500
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            stability_secs: default_stability_secs(),
            settle_secs: default_settle_secs(),
            interval_secs: default_interval_secs(),
        }
    }
}

impl ScanConfig {
    pub fn stability(&self) -> Duration {
        Duration::from_secs(self.stability_secs)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_secs(self.settle_secs)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Media catalog (Plex-style) refresh target.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_enabled")]
    pub enabled: bool,

    #[serde(default = "default_catalog_url")]
    pub url: String,

    #[serde(default)]
    pub token: String,

    /// Header carrying the token (default: X-Plex-Token).
    #[serde(default = "default_token_header")]
    pub token_header: String,

    #[serde(default = "default_catalog_timeout")]
    pub timeout_secs: u64,
}

fn default_catalog_enabled() -> bool {
    true
}

fn default_catalog_url() -> String {
    "http://127.0.0.1:32400".to_string()
}

fn default_token_header() -> String {
    "X-Plex-Token".to_string()
}

fn default_catalog_timeout() -> u64 {
    10
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            enabled: default_catalog_enabled(),
            url: default_catalog_url(),
            token: String::new(),
            token_header: default_token_header(),
            timeout_secs: default_catalog_timeout(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    #[serde(default)]
    pub ffprobe_path: Option<PathBuf>,
}

/// One library root and the catalog section it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LibraryConfig {
    pub name: String,

    pub path: PathBuf,

    /// Catalog section refreshed after a conversion in this library.
    pub section: u32,
}

fn default_libraries() -> Vec<LibraryConfig> {
    let (shows, movies) = if cfg!(windows) {
        ("T:", "M:")
    } else {
        ("/Shows", "/Movies")
    };

    vec![
        LibraryConfig {
            name: "shows".to_string(),
            path: PathBuf::from(shows),
            section: 2,
        },
        LibraryConfig {
            name: "movies".to_string(),
            path: PathBuf::from(movies),
            section: 1,
        },
    ]
}
