use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Hosting control panels that embed Softaculous
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelKind {
    Cpanel,
    Plesk,
    DirectAdmin,
    Ispmanager,
    Centoswebpanel,
    Webuzo,
}

impl PanelKind {
    pub const ALL: [PanelKind; 6] = [
        PanelKind::Cpanel,
        PanelKind::Plesk,
        PanelKind::DirectAdmin,
        PanelKind::Ispmanager,
        PanelKind::Centoswebpanel,
        PanelKind::Webuzo,
    ];

    /// Billing module class name, also the prefix of the service field keys
    pub fn module_name(&self) -> &'static str {
        match self {
            PanelKind::Cpanel => "cpanel",
            PanelKind::Plesk => "plesk",
            PanelKind::DirectAdmin => "direct_admin",
            PanelKind::Ispmanager => "ispmanager",
            PanelKind::Centoswebpanel => "centoswebpanel",
            PanelKind::Webuzo => "webuzo",
        }
    }

    pub fn from_module(module: &str) -> Option<Self> {
        let module = module.trim().to_lowercase();
        Self::ALL.into_iter().find(|k| k.module_name() == module)
    }
}

impl fmt::Display for PanelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.module_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    #[default]
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

/// Where and as whom to log in
#[derive(Debug, Clone)]
pub struct PanelTarget {
    pub kind: PanelKind,
    pub scheme: Scheme,
    pub host: String,
    /// Falls back to the configured default port for the panel
    pub port: Option<u16>,
    pub username: String,
    pub password: String,
    /// CWP only
    pub api_key: Option<String>,
    /// Domain the script is installed on
    pub domain: String,
}

impl PanelTarget {
    pub fn new(kind: PanelKind, host: impl Into<String>) -> Self {
        Self {
            kind,
            scheme: Scheme::Https,
            host: host.into(),
            port: None,
            username: String::new(),
            password: String::new(),
            api_key: None,
            domain: String::new(),
        }
    }

    pub fn base_url(&self, default_port: u16) -> String {
        format!(
            "{}://{}:{}",
            self.scheme.as_str(),
            self.host,
            self.port.unwrap_or(default_port)
        )
    }
}

/// What to install and with which admin account
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstallOptions {
    pub script: String,
    /// Empty installs into the document root
    #[serde(default)]
    pub directory: String,
    pub admin_username: String,
    pub admin_password: String,
    pub admin_email: String,
}

/// Billing service event, as handed over by the billing platform
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceEvent {
    /// `Services.add` or `Services.edit`
    pub event: String,
    pub status: String,
    #[serde(default)]
    pub old_status: Option<String>,
    /// Module class of the package, e.g. `cpanel`
    pub module: String,
    pub client_email: String,
    /// Service fields (`cpanel_username`, `cpanel_domain`, ...)
    #[serde(default)]
    pub fields: HashMap<String, String>,
    /// Configurable options (`script`, `directory`, `admin_name`, `admin_pass`)
    #[serde(default)]
    pub options: HashMap<String, String>,
    #[serde(default)]
    pub server: ServerMeta,
}

/// Module row meta data of the server hosting the service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerMeta {
    #[serde(default)]
    pub server_name: Option<String>,
    #[serde(default)]
    pub host_name: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub use_ssl: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl ServerMeta {
    /// `use_ssl` is stored as "1"/"true" depending on the module
    pub fn ssl_enabled(&self) -> Option<bool> {
        self.use_ssl
            .as_deref()
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
    }
}

/// Result of a successful installation
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub panel: PanelKind,
    pub host: String,
    pub domain: String,
    pub script: String,
    pub sid: u32,
    pub message: Option<String>,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub finished_at: chrono::DateTime<chrono::Utc>,
}

impl InstallReport {
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}
