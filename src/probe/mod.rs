// Re-export probe functionality from playready-av
pub use playready_av::probe::*;
pub use playready_av::{get_tool_path, FfmpegTool, MediaTool, ToolInfo};

use crate::config::ToolsConfig;
use anyhow::Result;

/// Resolve ffmpeg/ffprobe from config or PATH and build the production tool.
pub fn ffmpeg_tool(tools: &ToolsConfig) -> Result<FfmpegTool> {
    let ffmpeg = get_tool_path("ffmpeg", tools.ffmpeg_path.as_deref())?;
    let ffprobe = get_tool_path("ffprobe", tools.ffprobe_path.as_deref())?;

    tracing::debug!("Using ffmpeg at {:?}, ffprobe at {:?}", ffmpeg, ffprobe);

    Ok(FfmpegTool::new(ffmpeg, ffprobe))
}

/// Availability of ffmpeg/ffprobe, resolved the same way [`ffmpeg_tool`] does.
pub fn check_configured_tools(tools: &ToolsConfig) -> Vec<ToolInfo> {
    playready_av::check_tools(tools.ffmpeg_path.as_deref(), tools.ffprobe_path.as_deref())
}
