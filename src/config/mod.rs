mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Highest CRF libx264 accepts.
const MAX_CRF: u32 = 51;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    parse_config(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
}

/// Parse, normalise and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content)?;
    let config = prepare_config(config);

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./playready.toml",
        "./config.toml",
        "~/.config/playready/config.toml",
        "/etc/playready/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    // Return default config if no file found
    let config = prepare_config(Config::default());
    validate_config(&config)?;
    Ok(config)
}

fn prepare_config(mut config: Config) -> Config {
    config.policy = config.policy.normalized();

    config.scan.extensions = config
        .scan
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_lowercase())
        .collect();

    for library in &mut config.libraries {
        library.path = expand_path(&library.path);
    }

    config.tools.ffmpeg_path = config.tools.ffmpeg_path.as_deref().map(expand_path);
    config.tools.ffprobe_path = config.tools.ffprobe_path.as_deref().map(expand_path);

    config
}

fn expand_path(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    // Validate policy
    if config.policy.video_codec.is_empty() {
        anyhow::bail!("Policy video codec cannot be empty");
    }
    if config.policy.audio_codecs.is_empty() {
        anyhow::bail!("Policy must allow at least one audio codec");
    }
    if config.policy.containers.is_empty() {
        anyhow::bail!("Policy must allow at least one container");
    }

    // Validate encode profile
    if config.encode.crf > MAX_CRF {
        anyhow::bail!(
            "Encode CRF {} is out of range (0-{})",
            config.encode.crf,
            MAX_CRF
        );
    }

    // Validate scan settings
    if config.scan.extensions.iter().all(|e| e.is_empty()) {
        anyhow::bail!("Scan extensions cannot be empty");
    }

    // Validate catalog
    if config.catalog.enabled && config.catalog.url.trim().is_empty() {
        anyhow::bail!("Catalog is enabled but has no URL");
    }

    // Validate libraries
    let mut names = HashSet::new();
    for library in &config.libraries {
        if library.name.trim().is_empty() {
            anyhow::bail!("Library name cannot be empty");
        }
        if !names.insert(library.name.as_str()) {
            anyhow::bail!("Duplicate library name: '{}'", library.name);
        }
        if !library.path.exists() {
            tracing::warn!("Library path does not exist: {:?}", library.path);
        }
    }

    Ok(())
}
