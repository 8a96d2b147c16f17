pub mod dispatch;
pub mod install;
pub mod scripts;

use autoinstaller_core::InstallReport;

pub(crate) fn print_report(report: &InstallReport) {
    println!("Installed {} (sid {}) on {}", report.script, report.sid, report.domain);
    println!("  Panel:    {} @ {}", report.panel, report.host);
    if let Some(message) = &report.message {
        println!("  Message:  {}", message);
    }
    println!("  Took:     {} ms", report.duration_ms());
}
