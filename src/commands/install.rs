use anyhow::Result;
use autoinstaller_core::{AppConfig, InstallOptions, PanelTarget};
use autoinstaller_panels::Installer;

use super::print_report;

pub async fn run(config: AppConfig, target: PanelTarget, options: InstallOptions) -> Result<()> {
    let installer = Installer::new(config);
    let report = installer.install(&target, &options).await?;
    print_report(&report);
    Ok(())
}
