//! `imapsync-scriptgen` - turn a credential list into batched imapsync scripts.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use scriptgen_core::UnsafeScriptGenerator;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::Arguments;

fn main() -> Result<()> {
    let args = Arguments::parse();

    // Logs go to stderr so dry-run output on stdout stays clean.
    let default_filter = if args.verbose {
        "imapsync_scriptgen=debug,scriptgen_core=debug"
    } else {
        "imapsync_scriptgen=info,scriptgen_core=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cfg = args.to_config()?;
    let mut generator = UnsafeScriptGenerator::new(cfg).context("invalid generator settings")?;

    let summary = generator
        .process_file(&args.input_file)
        .with_context(|| format!("failed to process {}", args.input_file.display()))?;

    info!(
        files = summary.files.len(),
        commands = summary.commands,
        skipped = summary.skipped,
        "Finished generating scripts"
    );
    if !summary.domains.is_empty() {
        info!("Domains: {}", summary.domains.join(", "));
    }

    Ok(())
}
