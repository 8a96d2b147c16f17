use clap::{Parser, Subcommand};

use autoinstaller_core::PanelKind;

#[derive(Parser)]
#[command(name = "autoinstaller", about = "Softaculous script installs through hosting panels")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install a script on one panel account
    Install {
        /// cpanel, plesk, direct_admin, ispmanager, centoswebpanel or webuzo
        #[arg(short, long, value_parser = parse_panel)]
        panel: PanelKind,

        /// Panel host name or IP
        #[arg(long)]
        host: String,

        /// Panel port (defaults per panel from the config)
        #[arg(long)]
        port: Option<u16>,

        #[arg(short, long)]
        username: String,

        #[arg(long, env = "AUTOINSTALL_PANEL_PASSWORD", hide_env_values = true)]
        password: String,

        /// CentOS Web Panel API key
        #[arg(long)]
        api_key: Option<String>,

        /// Domain the script is installed on
        #[arg(short, long)]
        domain: String,

        /// Script name as listed by Softaculous
        #[arg(short, long)]
        script: String,

        /// Sub directory under the domain, empty for the document root
        #[arg(long, default_value = "")]
        directory: String,

        #[arg(long, default_value = "admin")]
        admin_name: String,

        #[arg(long, env = "AUTOINSTALL_ADMIN_PASSWORD", hide_env_values = true)]
        admin_pass: String,

        #[arg(long)]
        admin_email: String,

        /// Talk plain HTTP to the panel
        #[arg(long)]
        http: bool,
    },
    /// Handle a billing service event stored as JSON
    Dispatch {
        /// Path to the event file
        #[arg(short, long)]
        event: String,
    },
    /// List the Softaculous catalog
    Scripts {
        /// Resolve a single script name
        #[arg(short, long)]
        name: Option<String>,
    },
}

fn parse_panel(value: &str) -> Result<PanelKind, String> {
    PanelKind::from_module(value).ok_or_else(|| {
        let known: Vec<&str> = PanelKind::ALL.iter().map(|k| k.module_name()).collect();
        format!("unknown panel '{}' (expected one of: {})", value, known.join(", "))
    })
}
