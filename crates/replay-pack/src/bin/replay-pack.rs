// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! replay-pack - Assemble a replay container from captured chunks.
//!
//! Usage:
//!   replay-pack --metadata metadata.json --header replay.header \
//!       --stream stream.0 --stream stream.1 --output session.replay
//!   replay-pack --config replay-pack.toml --metadata ... --output ...
//!   replay-pack gen-config --output replay-pack.toml
//!   replay-pack validate --config replay-pack.toml

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use replay_pack::{
    Assembler, BuildConfig, EventSource, FileSink, InputFiles, NoopProgress, TracingProgress,
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "replay-pack")]
#[command(about = "Assemble a replay container from session metadata and chunk files")]
#[command(version)]
struct Args {
    /// Session metadata JSON document
    #[arg(short, long)]
    metadata: Option<PathBuf>,

    /// Raw replay header chunk
    #[arg(long)]
    header: Option<PathBuf>,

    /// Raw data chunk file (repeat, in output order)
    #[arg(short, long)]
    stream: Vec<PathBuf>,

    /// Output replay file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum data chunks
    #[arg(long)]
    data_limit: Option<usize>,

    /// Maximum event chunks
    #[arg(long)]
    event_limit: Option<usize>,

    /// Maximum checkpoint chunks
    #[arg(long)]
    checkpoint_limit: Option<usize>,

    /// Document array backing checkpoint chunks
    #[arg(long, value_enum)]
    checkpoint_source: Option<EventSource>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Quiet mode (no progress output)
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a default configuration file
    GenConfig {
        /// Output file path
        #[arg(short, long, default_value = "replay-pack.toml")]
        output: PathBuf,
    },

    /// Validate a configuration file
    Validate {
        /// Configuration file path
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => BuildConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => BuildConfig::default(),
    };
    if let Some(level) = &args.log_level {
        config.log_level = level.clone();
    }

    // Initialize logging
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    if let Some(cmd) = args.command {
        return match cmd {
            Commands::GenConfig { output } => cmd_gen_config(output),
            Commands::Validate { config } => cmd_validate(config),
        };
    }

    // CLI flags override file values
    if args.data_limit.is_some() {
        config.data_limit = args.data_limit;
    }
    if args.event_limit.is_some() {
        config.event_limit = args.event_limit;
    }
    if args.checkpoint_limit.is_some() {
        config.checkpoint_limit = args.checkpoint_limit;
    }
    if let Some(source) = args.checkpoint_source {
        config.checkpoint_source = source;
    }
    config.validate()?;

    let (Some(metadata), Some(header), Some(output)) = (args.metadata, args.header, args.output)
    else {
        bail!("--metadata, --header and --output are required");
    };

    let files = InputFiles {
        metadata,
        header,
        streams: args.stream,
    };
    let mut sink = FileSink::new(&output);

    info!("replay-pack v{}", env!("CARGO_PKG_VERSION"));
    let summary = if args.quiet {
        Assembler::new(config.plan())
            .with_progress(NoopProgress)
            .run(&files, &mut sink)?
    } else {
        Assembler::new(config.plan())
            .with_progress(TracingProgress)
            .run(&files, &mut sink)?
    };

    info!("Replay saved: {}", output.display());
    info!("  Size: {} bytes", summary.bytes);
    info!("  Chunks: {}", summary.frames);
    if !summary.skipped.is_empty() {
        info!("  Skipped: {}", summary.skipped.len());
    }

    Ok(())
}

fn cmd_gen_config(output: PathBuf) -> anyhow::Result<()> {
    let toml = BuildConfig::default().to_toml_string()?;
    std::fs::write(&output, toml).with_context(|| format!("writing {}", output.display()))?;
    info!("Generated configuration: {}", output.display());
    Ok(())
}

fn cmd_validate(path: PathBuf) -> anyhow::Result<()> {
    let config = BuildConfig::from_file(&path)
        .with_context(|| format!("validating {}", path.display()))?;
    info!("Configuration is valid: {}", path.display());
    info!("  Order: {:?}", config.order);
    info!("  Checkpoint source: {:?}", config.checkpoint_source);
    Ok(())
}
