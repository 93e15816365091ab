//! Media information types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Structural snapshot of a media file as reported by the probe tool.
///
/// Fields are optional because the probe report may omit them; callers that
/// make decisions on a `MediaInfo` must treat a missing field as "unknown"
/// rather than as an empty value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Lower-cased container aliases (e.g. `mov`, `mp4`, `m4a`).
    pub containers: Option<BTreeSet<String>>,
    /// Streams in the order the tool reported them.
    pub streams: Option<Vec<StreamInfo>>,
}

/// Information about a single stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamInfo {
    /// Stream index within the container.
    pub index: Option<u32>,
    /// Kind of stream, if reported.
    pub codec_type: Option<CodecType>,
    /// Codec name (e.g. `h264`, `aac`).
    pub codec_name: Option<String>,
    /// Channel count, audio streams only.
    pub channels: Option<u32>,
}

/// Stream kinds the compatibility policy distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecType {
    Video,
    Audio,
    /// Subtitles, data, attachments and anything else.
    Other,
}

impl CodecType {
    /// Map the probe tool's `codec_type` string.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "video" => CodecType::Video,
            "audio" => CodecType::Audio,
            _ => CodecType::Other,
        }
    }
}

impl MediaInfo {
    /// Build a fully populated info value.
    pub fn new<I, S>(containers: I, streams: Vec<StreamInfo>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            containers: Some(parse_container_list(containers)),
            streams: Some(streams),
        }
    }

    /// Channel count of the first audio stream, if reported.
    pub fn first_audio_channels(&self) -> Option<u32> {
        self.streams
            .as_deref()?
            .iter()
            .find(|s| s.codec_type == Some(CodecType::Audio))
            .and_then(|s| s.channels)
    }
}

impl StreamInfo {
    /// A video stream with the given codec.
    pub fn video(codec: &str) -> Self {
        Self {
            index: None,
            codec_type: Some(CodecType::Video),
            codec_name: Some(codec.to_string()),
            channels: None,
        }
    }

    /// An audio stream with the given codec and channel count.
    pub fn audio(codec: &str, channels: Option<u32>) -> Self {
        Self {
            index: None,
            codec_type: Some(CodecType::Audio),
            codec_name: Some(codec.to_string()),
            channels,
        }
    }

    /// A stream of any other kind (subtitle, data).
    pub fn other(codec: &str) -> Self {
        Self {
            index: None,
            codec_type: Some(CodecType::Other),
            codec_name: Some(codec.to_string()),
            channels: None,
        }
    }
}

/// Normalise container aliases: trimmed, lower-cased, empty entries dropped.
pub fn parse_container_list<I, S>(names: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|s| s.as_ref().trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}
