//! warmswap command-line entry point.

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};
use warmswap::app::UnitApp;
use warmswap::cli::{self, Cli, Commands};
use warmswap::config::{Config, cfg, init_config};
use warmswap::reload::ReloadCoordinator;
use warmswap::watch::WatchOptions;
use warmswap::{debug, log};

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    warmswap::core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    warmswap::logger::set_verbose(cli.verbose);

    init_config(Config::load(&cli)?);

    match &cli.command {
        Commands::Serve { .. } => serve(),
        Commands::Fingerprint { path } => cli::fingerprint::run_fingerprint(path),
    }
}

/// Boot the application, attach the coordinator and serve until shutdown.
fn serve() -> Result<()> {
    let config = cfg();
    let output_dir = &config.watch.root;
    let app = UnitApp::new(output_dir, config.app.root_unit());
    let container = app.boot()?;

    let coordinator = ReloadCoordinator::new(output_dir, container, app)
        .context("failed to set up reload coordinator")?;

    // Bind before watching so a port error does not leave a watcher behind.
    let server = cli::serve::bind_server()?;

    let watcher = if config.serve.watch {
        Some(coordinator.watch(WatchOptions::from(&config.watch))?)
    } else {
        log!("serve"; "hot reload disabled");
        None
    };

    server.run(std::sync::Arc::clone(&coordinator))?;

    coordinator.stop();
    if let Some(watcher) = watcher {
        watcher.join();
    }
    debug!("serve"; "shutdown complete");
    Ok(())
}
