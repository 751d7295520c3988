use anyhow::Result;
use cells_app::Cli;
use clap::Parser;
use tracing::info;

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    info!(worlds = cli.worlds, ticks = cli.ticks, "Starting simulations");
    let reports = cells_app::run(&cli)?;
    let extinct = reports
        .iter()
        .filter(|report| report.extinct_after.is_some())
        .count();
    info!(worlds = reports.len(), extinct, "Simulations finished");
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
