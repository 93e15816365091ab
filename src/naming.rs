//! Output filename normalisation.
//!
//! Converted files are renamed from scene-release style names
//! (`The.Show.S01E01.WEB-DL.1080p.x264.mkv`) to a clean form
//! (`The Show S01E01.mp4`).

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Extension of every converted file.
pub const TARGET_EXTENSION: &str = "mp4";

/// Stem used when a name consists of nothing but tags and separators.
const FALLBACK_STEM: &str = "untitled";

/// A release tag removed from filenames.
#[derive(Debug, Clone, Copy)]
pub struct TagRule {
    /// Human-readable tag name.
    pub label: &'static str,
    /// Case-insensitive pattern for the tag body, without delimiters.
    pub pattern: &'static str,
}

const fn tag(label: &'static str, pattern: &'static str) -> TagRule {
    TagRule { label, pattern }
}

/// Tags stripped from names, applied in order.
pub const TAG_RULES: &[TagRule] = &[
    // Release source
    tag("WEB-DL", r"WEB[-_. ]?DL"),
    tag("WEBRip", r"WEBRip"),
    tag("BluRay", r"BluRay"),
    tag("HDRip", r"HDRip"),
    tag("HDTV", r"HDTV"),
    tag("DVDRip", r"DVDRip"),
    tag("Proper", r"Proper"),
    tag("Remux", r"Remux"),
    // Resolution / encoding
    tag("1080p", r"1080p"),
    tag("720p", r"720p"),
    tag("480p", r"480p"),
    tag("4K", r"4K"),
    tag("HEVC", r"HEVC"),
    tag("H.264", r"H\.?264"),
    tag("x264", r"x264"),
    tag("x265", r"x265"),
    // Audio
    tag("AAC", r"AAC"),
    tag("AC3", r"AC3"),
    tag("DD5.1", r"DD5\.1"),
    tag("MP3", r"MP3"),
    tag("DTS", r"DTS"),
];

/// A tag only matches as a whole token: bounded by the string edges or by
/// any character that is not a letter or digit.
static COMPILED_TAGS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    TAG_RULES
        .iter()
        .filter_map(|rule| {
            let pattern = format!(r"(?i)(^|[^\p{{L}}\p{{N}}])(?:{})($|[^\p{{L}}\p{{N}}])", rule.pattern);
            match Regex::new(&pattern) {
                Ok(re) => Some(re),
                Err(e) => {
                    tracing::error!("Invalid tag pattern for {}: {}", rule.label, e);
                    None
                }
            }
        })
        .collect()
});

/// Normalise a filename and give it the target extension.
///
/// ```
/// use playready::naming::normalize;
///
/// assert_eq!(
///     normalize("The.Show.S01E01.WEBDL-1080p.x264.mkv"),
///     "The Show S01E01.mp4"
/// );
/// ```
pub fn normalize(original_name: &str) -> String {
    format!("{}.{}", normalize_stem(original_name), TARGET_EXTENSION)
}

/// Normalised name without the extension.
///
/// The cleaning pass is repeated until the stem stops changing, so feeding
/// the result back in yields the same stem.
pub fn normalize_stem(original_name: &str) -> String {
    let stem = Path::new(original_name)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    let cleaned = clean(&stem);
    if !cleaned.is_empty() {
        return cleaned;
    }

    // Nothing but tags. Collapsing first breaks dotted tags ("DD5.1" becomes
    // "DD5 1"), so clean the collapsed form; the result is stable either way.
    let fallback = clean(&collapse_separators(&stem));
    if fallback.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        fallback
    }
}

/// Strip tags and collapse separators until the stem stops changing.
fn clean(stem: &str) -> String {
    let mut current = stem.to_string();
    loop {
        let next = collapse_separators(&strip_tags(&current));
        if next == current {
            return current;
        }
        current = next;
    }
}

fn strip_tags(stem: &str) -> String {
    let mut out = stem.to_string();
    for re in COMPILED_TAGS.iter() {
        // Adjacent tags share a delimiter, so one pass can miss the second.
        while re.is_match(&out) {
            out = re.replace_all(&out, "${1}${2}").into_owned();
        }
    }
    out
}

/// Dots, underscores and hyphens become spaces; whitespace runs collapse to
/// one space; the ends are trimmed.
fn collapse_separators(stem: &str) -> String {
    stem.replace(['.', '_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
