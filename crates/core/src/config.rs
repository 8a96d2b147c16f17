use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub panels: PanelPorts,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    /// Panels usually run on self-signed certificates, so this stays off unless asked for.
    #[serde(default)]
    pub verify_tls: bool,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            verify_tls: false,
            connect_timeout_seconds: default_connect_timeout(),
            request_timeout_seconds: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_url")]
    pub url: String,
    /// Locally known scripts merged over the downloaded list (same sid wins).
    #[serde(default)]
    pub extra_scripts: Vec<ExtraScript>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            url: default_catalog_url(),
            extra_scripts: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExtraScript {
    pub sid: u32,
    pub name: String,
    #[serde(rename = "type", default = "default_script_type")]
    pub script_type: String,
}

/// Default ports per panel, used when the target does not carry its own.
#[derive(Debug, Deserialize, Clone)]
pub struct PanelPorts {
    #[serde(default = "default_cpanel_port")]
    pub cpanel: u16,
    #[serde(default = "default_webuzo_port")]
    pub webuzo: u16,
    #[serde(default = "default_plesk_port")]
    pub plesk: u16,
    #[serde(default = "default_direct_admin_port")]
    pub direct_admin: u16,
    #[serde(default = "default_ispmanager_port")]
    pub ispmanager: u16,
    #[serde(default = "default_cwp_api_port")]
    pub centoswebpanel_api: u16,
    #[serde(default = "default_cwp_user_port")]
    pub centoswebpanel_user: u16,
}

impl Default for PanelPorts {
    fn default() -> Self {
        Self {
            cpanel: default_cpanel_port(),
            webuzo: default_webuzo_port(),
            plesk: default_plesk_port(),
            direct_admin: default_direct_admin_port(),
            ispmanager: default_ispmanager_port(),
            centoswebpanel_api: default_cwp_api_port(),
            centoswebpanel_user: default_cwp_user_port(),
        }
    }
}

fn default_connect_timeout() -> u64 {
    15
}
fn default_request_timeout() -> u64 {
    120
}
fn default_user_agent() -> String {
    concat!("autoinstaller/", env!("CARGO_PKG_VERSION")).to_string()
}
fn default_catalog_url() -> String {
    "https://api.softaculous.com/scripts.php?in=serialize".to_string()
}
fn default_script_type() -> String {
    "php".to_string()
}
fn default_cpanel_port() -> u16 {
    2083
}
fn default_webuzo_port() -> u16 {
    2003
}
fn default_plesk_port() -> u16 {
    8443
}
fn default_direct_admin_port() -> u16 {
    2222
}
fn default_ispmanager_port() -> u16 {
    1500
}
fn default_cwp_api_port() -> u16 {
    2304
}
fn default_cwp_user_port() -> u16 {
    2083
}
