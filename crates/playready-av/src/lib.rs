//! # playready-av
//!
//! Thin wrapper around the ffprobe and ffmpeg command-line tools.
//!
//! This crate provides:
//! - Probing a file's container aliases and streams into a [`MediaInfo`]
//! - Running a single ffmpeg transcode described by an [`EncodeRequest`]
//! - The [`MediaTool`] trait so callers can substitute stubs in tests
//! - Tool discovery helpers
//!
//! ## Example
//!
//! ```no_run
//! use playready_av::{FfmpegTool, MediaTool};
//! use std::path::Path;
//!
//! # async fn example() -> playready_av::Result<()> {
//! let tool = FfmpegTool::new("ffmpeg", "ffprobe");
//! let info = tool.probe(Path::new("/path/to/video.mkv")).await?;
//! println!("Containers: {:?}", info.containers);
//! # Ok(())
//! # }
//! ```

pub mod encode;
mod error;
pub mod probe;
pub mod tool;
pub mod tools;

// Re-exports
pub use encode::EncodeRequest;
pub use error::{Error, Result};
pub use probe::{CodecType, MediaInfo, StreamInfo};
pub use tool::{FfmpegTool, MediaTool};
pub use tools::{check_tool_at, check_tools, get_tool_path, require_tool, ToolInfo};
