//! Media file probing.
//!
//! Only the ffprobe CLI backend is used: it reports container aliases and
//! per-stream codec information in one JSON document.

mod ffprobe;
mod types;

pub use ffprobe::{ffprobe_args, parse_ffprobe_json, probe_with_ffprobe};
pub use types::*;
