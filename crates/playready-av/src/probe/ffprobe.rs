//! FFprobe-based media probing.

use super::types::*;
use crate::{Error, Result};
use serde::Deserialize;
use std::ffi::OsString;
use std::path::Path;
use tokio::process::Command;

/// Entries requested from ffprobe; everything the compatibility check and
/// channel detection need, nothing more.
const SHOW_ENTRIES: &str = "format=format_name:stream=index,codec_type,codec_name,channels";

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: Option<FfprobeFormat>,
    streams: Option<Vec<FfprobeStream>>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    format_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    index: Option<u32>,
    codec_type: Option<String>,
    codec_name: Option<String>,
    channels: Option<u32>,
}

/// Arguments passed to ffprobe for `path`.
pub fn ffprobe_args(path: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-v", "error", "-show_entries", SHOW_ENTRIES, "-of", "json"]
        .into_iter()
        .map(OsString::from)
        .collect();
    args.push(path.as_os_str().to_os_string());
    args
}

/// Probe a media file using the ffprobe binary at `ffprobe`.
pub async fn probe_with_ffprobe(ffprobe: &Path, path: &Path) -> Result<MediaInfo> {
    if !path.exists() {
        return Err(Error::file_not_found(path));
    }

    let output = Command::new(ffprobe)
        .args(ffprobe_args(path))
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| Error::from_spawn("ffprobe", e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::tool_failed(
            "ffprobe",
            format!("exited with {}: {}", output.status, stderr.trim()),
        ));
    }

    let json_str = String::from_utf8(output.stdout)
        .map_err(|e| Error::parse_error("ffprobe", format!("Invalid UTF-8: {}", e)))?;

    parse_ffprobe_json(&json_str)
}

/// Parse ffprobe's JSON report.
///
/// Blank output is an error. Missing `format`/`streams` sections are not:
/// they come back as `None` so the caller can decide how to treat them.
pub fn parse_ffprobe_json(json_str: &str) -> Result<MediaInfo> {
    if json_str.trim().is_empty() {
        return Err(Error::parse_error("ffprobe", "empty output"));
    }

    let output: FfprobeOutput = serde_json::from_str(json_str)?;

    let containers = output
        .format
        .and_then(|f| f.format_name)
        .map(|names| parse_container_list(names.split(',')));

    let streams = output.streams.map(|streams| {
        streams
            .into_iter()
            .map(|s| StreamInfo {
                index: s.index,
                codec_type: s.codec_type.as_deref().map(CodecType::from_name),
                codec_name: s.codec_name,
                channels: s.channels,
            })
            .collect()
    });

    Ok(MediaInfo {
        containers,
        streams,
    })
}
