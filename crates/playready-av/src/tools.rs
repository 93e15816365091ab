//! External tool detection and management.

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Information about an external tool.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    /// Name of the tool.
    pub name: String,
    /// Whether the tool is available.
    pub available: bool,
    /// Version string if available.
    pub version: Option<String>,
    /// Path to the tool executable.
    pub path: Option<PathBuf>,
}

/// Check the executable at `path`, reporting it under `name`.
///
/// # Example
///
/// ```no_run
/// use playready_av::tools::check_tool_at;
/// use std::path::Path;
///
/// let info = check_tool_at("ffprobe", Path::new("/usr/bin/ffprobe"), "-version");
/// if info.available {
///     println!("ffprobe version: {:?}", info.version);
/// }
/// ```
pub fn check_tool_at(name: &str, path: &Path, version_arg: &str) -> ToolInfo {
    match Command::new(path).arg(version_arg).output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .map(|s| s.to_string());

            ToolInfo {
                name: name.to_string(),
                available: true,
                version,
                path: Some(path.to_path_buf()),
            }
        }
        _ => ToolInfo::missing(name),
    }
}

/// Check the tools the conversion pipeline needs: ffmpeg and ffprobe.
///
/// Configured paths win over `PATH`, the same way [`get_tool_path`] resolves
/// them for a real run.
pub fn check_tools(ffmpeg_path: Option<&Path>, ffprobe_path: Option<&Path>) -> Vec<ToolInfo> {
    [("ffmpeg", ffmpeg_path), ("ffprobe", ffprobe_path)]
        .into_iter()
        .map(|(name, configured)| match get_tool_path(name, configured) {
            Ok(path) => check_tool_at(name, &path, "-version"),
            Err(_) => ToolInfo::missing(name),
        })
        .collect()
}

impl ToolInfo {
    fn missing(name: &str) -> Self {
        ToolInfo {
            name: name.to_string(),
            available: false,
            version: None,
            path: None,
        }
    }
}

/// Require that a tool is available on `PATH`, returning its path.
///
/// # Errors
///
/// Returns an error if the tool is not found.
pub fn require_tool(name: &str) -> Result<PathBuf> {
    which::which(name).map_err(|_| Error::tool_not_found(name))
}

/// Get the path to a tool, preferring a configured path over PATH lookup.
pub fn get_tool_path(name: &str, config_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = config_path {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        tracing::warn!(
            tool = name,
            path = %path.display(),
            "Configured tool path does not exist, falling back to PATH"
        );
    }

    require_tool(name)
}
