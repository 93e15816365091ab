mod cli;

use playready::{
    config::{self, Config},
    naming, notifications, policy, probe,
    probe::MediaTool,
    scanner::LibraryScanner,
    scheduler::Scheduler,
};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn build_scheduler(config: &Config) -> Result<Scheduler> {
    let tool = Arc::new(probe::ffmpeg_tool(&config.tools)?);
    let notifier = notifications::from_config(&config.catalog);
    let scanner = LibraryScanner::new(config, tool, notifier);

    Ok(Scheduler::new(config, scanner))
}

async fn run_scheduler(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    tracing::info!("Starting Playready");
    for library in &config.libraries {
        tracing::info!(
            "Library '{}' at {:?} (section {})",
            library.name,
            library.path,
            library.section
        );
    }

    let scheduler = build_scheduler(&config)?;
    tokio::spawn(shutdown_signal(scheduler.cancel_token()));

    scheduler.run().await;

    tracing::info!("Shutting down...");
    Ok(())
}

async fn scan_once(config_path: Option<&Path>, library: Option<&str>) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    if let Some(name) = library {
        config.libraries.retain(|l| l.name == name);
        if config.libraries.is_empty() {
            anyhow::bail!("No library named '{}' in configuration", name);
        }
    }

    let scheduler = build_scheduler(&config)?;
    tokio::spawn(shutdown_signal(scheduler.cancel_token()));

    let results = scheduler.run_cycle().await;
    let mut failed = 0;

    for (name, result) in &results {
        match result {
            Ok(summary) => {
                println!("{}:", name);
                println!("  Candidates: {}", summary.candidates);
                println!("  Converted: {}", summary.converted);
                println!("  Failed: {}", summary.failed);
                println!("  Probe failures: {}", summary.probe_failed);
                println!("  Already compatible: {}", summary.skipped_compatible);
                println!("  Too recent: {}", summary.skipped_recent);
            }
            Err(e) => {
                failed += 1;
                println!("{}: scan failed: {:#}", name, e);
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} libraries could not be scanned", failed, results.len());
    }

    Ok(())
}

/// Wait for a shutdown signal (SIGINT or SIGTERM) and cancel `cancel`.
async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
        _ = cancel.cancelled() => return,
    }

    tracing::info!("Shutdown signal received");
    cancel.cancel();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "playready=trace,playready_av=trace".to_string()
        } else {
            "playready=debug,playready_av=debug".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_scheduler(cli.config.as_deref()))
        }
        Commands::Scan { library } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(scan_once(cli.config.as_deref(), library.as_deref()))
        }
        Commands::Probe { file, json } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(probe_file(&file, cli.config.as_deref(), json))
        }
        Commands::Normalize { name } => {
            println!("{}", naming::normalize(&name));
            Ok(())
        }
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("playready {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn probe_file(file: &Path, config_path: Option<&Path>, json: bool) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let config = config::load_config_or_default(config_path)?;
    let tool = probe::ffmpeg_tool(&config.tools)?;
    let media_info = tool.probe(file).await?;
    let verdict = policy::evaluate(Some(&media_info), &config.policy);
    let compatible = matches!(verdict, Ok(true));

    if json {
        let report = serde_json::json!({
            "file": file,
            "media_info": media_info,
            "compatible": compatible,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("File: {}", file.display());
    match &media_info.containers {
        Some(containers) => {
            let names: Vec<&str> = containers.iter().map(String::as_str).collect();
            println!("Container: {}", names.join(","));
        }
        None => println!("Container: unknown"),
    }

    match &media_info.streams {
        Some(streams) => {
            println!("\nStreams: {}", streams.len());
            for (i, stream) in streams.iter().enumerate() {
                let kind = stream
                    .codec_type
                    .map(|t| format!("{:?}", t).to_lowercase())
                    .unwrap_or_else(|| "unknown".to_string());
                print!(
                    "  [{}] {} {}",
                    i,
                    kind,
                    stream.codec_name.as_deref().unwrap_or("unknown")
                );
                if let Some(channels) = stream.channels {
                    print!(" {}ch", channels);
                }
                println!();
            }
        }
        None => println!("\nStreams: unknown"),
    }

    println!();
    match verdict {
        Ok(true) => println!("Compatible: yes"),
        Ok(false) => {
            println!("Compatible: no");
            println!("Would convert to: {}", converted_name(file));
        }
        Err(e) => {
            println!("Compatible: no ({})", e);
            println!("Would convert to: {}", converted_name(file));
        }
    }

    Ok(())
}

fn converted_name(file: &Path) -> String {
    file.file_name()
        .map(|n| naming::normalize(&n.to_string_lossy()))
        .unwrap_or_default()
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    println!("Checking external tools...\n");

    let tools = probe::check_configured_tools(&config.tools);
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install ffmpeg to enable conversion.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            config::load_config_or_default(None)?
        }
    };

    let containers: Vec<&str> = config.policy.containers.iter().map(String::as_str).collect();
    let audio: Vec<&str> = config.policy.audio_codecs.iter().map(String::as_str).collect();

    println!("  Video codec: {}", config.policy.video_codec);
    println!("  Audio codecs: {}", audio.join(", "));
    println!("  Containers: {}", containers.join(", "));
    println!(
        "  Encoder: {} (preset {}, crf {})",
        config.encode.video_encoder, config.encode.preset, config.encode.crf
    );
    println!("  Scan interval: {}s", config.scan.interval_secs);
    println!("  Catalog enabled: {}", config.catalog.enabled);
    println!("  Libraries: {}", config.libraries.len());
    for library in &config.libraries {
        println!(
            "    {} -> {} (section {})",
            library.name,
            library.path.display(),
            library.section
        );
    }

    Ok(())
}
