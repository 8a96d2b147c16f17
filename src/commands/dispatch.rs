use anyhow::{Context, Result};
use autoinstaller_core::{AppConfig, ServiceEvent};
use autoinstaller_panels::{DispatchOutcome, Dispatcher};

use super::print_report;

pub async fn run(config: AppConfig, event_path: &str) -> Result<()> {
    let raw = std::fs::read_to_string(event_path)
        .with_context(|| format!("reading event file {}", event_path))?;
    let event: ServiceEvent =
        serde_json::from_str(&raw).with_context(|| format!("parsing event file {}", event_path))?;

    match Dispatcher::new(config).handle(&event).await? {
        DispatchOutcome::Installed(report) => print_report(&report),
        DispatchOutcome::Skipped(reason) => println!("Skipped: {}", reason),
    }
    Ok(())
}
