//! gen-ir CLI - LLVM IR extraction for Xcode archives

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::Cli;
use genir::buildlog::LogSource;
use genir::ops::{enforce_failure_threshold, gen_ir, GenIrOptions};
use genir::util::config::Config;
use genir::util::GlobalContext;

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("genir=debug")
    } else {
        EnvFilter::new("genir=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let mut ctx = match &cli.config {
        Some(path) => {
            let cwd = std::env::current_dir()?;
            let config = Config::load(&cwd.join(path))?;
            GlobalContext::with_config(cwd, config)
        }
        None => GlobalContext::new()?,
    };

    // Flags override the config file
    let config = ctx.config_mut();
    if cli.quieter {
        config.log.quieter = true;
    }
    if cli.jobs.is_some() {
        config.runner.jobs = cli.jobs;
    }
    if cli.fail_fast {
        config.runner.fail_fast = true;
    }
    if cli.failure_threshold.is_some() {
        config.runner.failure_threshold = cli.failure_threshold;
    }
    if cli.debug {
        config.model.verbose = true;
    }
    config.validate()?;

    let cancel = ctx.cancellation().clone();
    ctrlc::set_handler(move || {
        eprintln!("\nCancelling...");
        cancel.cancel();
    })
    .ok();

    let opts = GenIrOptions {
        log: LogSource::from_arg(&cli.log_path),
        archive: cli.xcarchive,
        project_path: cli.project_path,
        show_progress: !cli.debug,
    };

    let outcome = gen_ir(&ctx, &opts)?;
    if ctx.cancellation().is_cancelled() {
        anyhow::bail!("cancelled; partial results are in {}", outcome.ir_root.display());
    }

    enforce_failure_threshold(&outcome.report, ctx.config().runner.failure_threshold)
}
