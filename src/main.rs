use std::error::Error;

use clap::Parser;
use env_logger::Builder;
use log::{debug, info, LevelFilter};

use prefix_sync::{config, HttpRegistry, SyncOptions, Synchronizer, SystemShell};

mod cli;

use cli::Args;

async fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    let config = config::from_file(&args.config_path)?;
    debug!(
        "Found {} VRFs in {}",
        config.vrfs.len(),
        args.config_path
    );
    for name in &args.vrf {
        if !config.vrfs.iter().any(|vrf| &vrf.name == name) {
            return Err(format!("VRF {} is not configured in {}", name, args.config_path).into());
        }
    }

    let registry = HttpRegistry::new(&config.registry)?;
    let options = SyncOptions {
        dry_run: args.dry_run,
        vrfs: args.vrf.clone(),
    };
    if options.dry_run {
        info!("Dry run, no configuration will be changed");
    }
    let report = Synchronizer::new(&config, &SystemShell, &registry, options)
        .run()
        .await;
    cli::print_report(&report);
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();

    let (sync_level, other_level) = match args.verbose {
        0 => (LevelFilter::Info, LevelFilter::Warn),
        1 => (LevelFilter::Debug, LevelFilter::Warn),
        2 => (LevelFilter::Trace, LevelFilter::Warn),
        _ => (LevelFilter::Trace, LevelFilter::Trace),
    };
    Builder::new()
        .filter(Some("prefix_sync"), sync_level)
        .filter(None, other_level)
        .init();
    info!("Logging at levels {}/{}", sync_level, other_level);

    if let Err(err) = run(&args).await {
        cli::print_error(err.as_ref());
        std::process::exit(1);
    }
}
