pub mod autoinstall;
pub mod catalog;
pub mod dispatch;
pub mod installer;
pub mod session;

pub mod centoswebpanel;
pub mod cpanel;
pub mod directadmin;
pub mod ispmanager;
pub mod plesk;
pub mod webuzo;

pub use self::catalog::{fetch_catalog, ScriptCatalog, ScriptEntry, ScriptType};
pub use self::dispatch::{should_install, DispatchOutcome, Dispatcher};
pub use self::installer::{Installer, PanelInstaller, SoftaculousEndpoint};
pub use self::session::{PanelResponse, PanelSession};

pub use self::centoswebpanel::CentoswebpanelInstaller;
pub use self::cpanel::CpanelInstaller;
pub use self::directadmin::DirectAdminInstaller;
pub use self::ispmanager::IspmanagerInstaller;
pub use self::plesk::PleskInstaller;
pub use self::webuzo::WebuzoInstaller;

#[cfg(test)]
pub(crate) mod test_support {
    use autoinstaller_core::{AppConfig, InstallOptions, PanelKind, PanelTarget, Scheme};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// WordPress (26, php), jQuery (413, js), Drupal (72, php) and one bogus key
    pub const SAMPLE_CATALOG: &str = concat!(
        r#"a:4:{"#,
        r#"i:26;a:3:{s:4:"name";s:9:"WordPress";s:4:"type";s:3:"php";s:8:"category";s:5:"blogs";}"#,
        r#"i:413;a:2:{s:4:"name";s:6:"jQuery";s:4:"type";s:2:"js";}"#,
        r#"i:72;a:2:{s:4:"name";s:9:" Drupal  ";s:4:"type";s:3:"php";}"#,
        r#"s:3:"bad";a:1:{s:4:"name";s:7:"Ignored";}"#,
        r#"}"#
    );

    /// Catalog and every panel port pointed at the mock server
    pub fn test_config(server: &MockServer) -> AppConfig {
        let port = server.address().port();
        let mut config = AppConfig::default();
        config.http.connect_timeout_seconds = 5;
        config.http.request_timeout_seconds = 10;
        config.catalog.url = format!("{}/scripts.php?in=serialize", server.uri());
        config.panels.cpanel = port;
        config.panels.webuzo = port;
        config.panels.plesk = port;
        config.panels.direct_admin = port;
        config.panels.ispmanager = port;
        config.panels.centoswebpanel_api = port;
        config.panels.centoswebpanel_user = port;
        config
    }

    pub async fn mount_catalog(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/scripts.php"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SAMPLE_CATALOG))
            .mount(server)
            .await;
    }

    pub fn http_target(kind: PanelKind, server: &MockServer) -> PanelTarget {
        PanelTarget {
            kind,
            scheme: Scheme::Http,
            host: "127.0.0.1".to_string(),
            port: Some(server.address().port()),
            username: "alice".to_string(),
            password: "s3cret".to_string(),
            api_key: None,
            domain: "example.com".to_string(),
        }
    }

    pub fn options(script: &str) -> InstallOptions {
        InstallOptions {
            script: script.to_string(),
            directory: String::new(),
            admin_username: "admin".to_string(),
            admin_password: "adminpass".to_string(),
            admin_email: "owner@example.com".to_string(),
        }
    }
}
