//! `treemerge` command line entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use textdiff::Location;
use tracing::{info, warn};
use treemerge_kernel::infrastructure::config::{ExecutionStrategyKind, Settings};
use treemerge_kernel::infrastructure::telemetry::TelemetryBuilder;
use treemerge_kernel::pipeline::{CancellationFlag, Pipeline};
use treemerge_kernel::tree::{CompareMode, TreeBuilder};

/// Compare and merge directory trees.
#[derive(Parser, Debug)]
#[command(name = "treemerge", version, about = "Two- and three-way directory merge")]
struct Args {
    /// Common ancestor; enables three-way mode.
    #[arg(long)]
    base: Option<PathBuf>,

    /// Our tree.
    local: PathBuf,

    /// Their tree.
    remote: PathBuf,

    /// Write the merge here instead of into the local tree.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Ask about each conflict on the console.
    #[arg(short, long)]
    interactive: bool,

    /// Process one node at a time.
    #[arg(long)]
    serial: bool,

    /// Only compare; do not write anything.
    #[arg(long)]
    dry_run: bool,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let mut settings = match &args.config {
        Some(path) => Settings::from_file(path),
        None => Settings::new(),
    }
    .context("Failed to load configuration")?;
    if args.serial {
        settings.execution.strategy = ExecutionStrategyKind::Serial;
    }
    if args.output.is_some() {
        settings.merge.output_dir.clone_from(&args.output);
    }
    settings.merge.interactive |= args.interactive;

    TelemetryBuilder::from_settings(&settings.telemetry).init()?;

    let mode = if args.base.is_some() {
        CompareMode::ThreeWay
    } else {
        CompareMode::TwoWay
    };
    let mut builder = TreeBuilder::new(mode)
        .root(Location::Local, &args.local)
        .root(Location::Remote, &args.remote);
    if let Some(base) = &args.base {
        builder = builder.root(Location::Base, base);
    }
    if let Some(output) = &settings.merge.output_dir {
        builder = builder.output_root(output);
    }
    let tree = builder.scan().context("Failed to scan input trees")?.build();

    let pipeline = Pipeline::from_settings(&settings, None)?;
    watch_ctrl_c(pipeline.cancellation());

    info!(?mode, strategy = pipeline.strategy().name(), "Treemerge starting");
    let diff = pipeline.run_diff(&tree);
    if !args.dry_run {
        pipeline.run_interactive(&tree);
        pipeline.run_merge(&tree);
    }

    let summary = tree.summary();
    println!("{}", serde_json::to_string_pretty(&summary)?);
    if pipeline.strategy().is_cancelled() {
        warn!(cancelled = diff.cancelled, "Run was cancelled");
        return Ok(ExitCode::from(130));
    }
    if summary.failed > 0 || summary.conflicted > 0 {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Cancels the pipeline on the first Ctrl-C.
fn watch_ctrl_c(cancellation: CancellationFlag) {
    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!(error = %e, "Ctrl-C handler unavailable");
                return;
            }
        };
        if runtime.block_on(tokio::signal::ctrl_c()).is_ok() {
            warn!("Interrupt received, finishing running processors");
            cancellation.cancel();
        }
    });
}
