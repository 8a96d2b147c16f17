use tracing::{info, warn};

use autoinstaller_core::{
    AppConfig, InstallError, InstallOptions, InstallReport, PanelKind, PanelTarget, Scheme,
    ServiceEvent,
};

use crate::installer::Installer;

/// What happened to one billing event
#[derive(Debug)]
pub enum DispatchOutcome {
    Skipped(String),
    Installed(InstallReport),
}

/// True for a newly added active service, or one that just left review
pub fn should_install(event: &ServiceEvent) -> bool {
    if event.status != "active" {
        return false;
    }
    match event.event.as_str() {
        "Services.add" => true,
        "Services.edit" => matches!(event.old_status.as_deref(), Some("pending" | "in_review")),
        _ => false,
    }
}

/// Turns billing service events into Softaculous installs
pub struct Dispatcher {
    installer: Installer,
}

impl Dispatcher {
    pub fn new(config: AppConfig) -> Self {
        Self {
            installer: Installer::new(config),
        }
    }

    pub async fn handle(&self, event: &ServiceEvent) -> Result<DispatchOutcome, InstallError> {
        if !should_install(event) {
            return Ok(skip(format!(
                "{} with status {} does not trigger an install",
                event.event, event.status
            )));
        }

        let Some(kind) = PanelKind::from_module(&event.module) else {
            return Ok(skip(format!("module {} has no Softaculous adapter", event.module)));
        };

        let Some(options) = install_options(event) else {
            return Ok(skip("no script selected for this service".to_string()));
        };

        let target = build_target(kind, event)?;
        let report = self.installer.install(&target, &options).await?;
        Ok(DispatchOutcome::Installed(report))
    }
}

fn skip(reason: String) -> DispatchOutcome {
    info!(reason = %reason, "skipping service event");
    DispatchOutcome::Skipped(reason)
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty()).map(str::to_string)
}

fn field(event: &ServiceEvent, kind: PanelKind, suffix: &str) -> String {
    let key = format!("{}_{}", kind.module_name(), suffix);
    event.fields.get(&key).cloned().unwrap_or_default()
}

fn build_target(kind: PanelKind, event: &ServiceEvent) -> Result<PanelTarget, InstallError> {
    let meta = &event.server;
    let host_name = || non_empty(meta.host_name.as_ref());
    let host = || non_empty(meta.host.as_ref());

    // Servers registered under the name "Plesk" are addressed by IP
    let plesk_server = meta
        .server_name
        .as_deref()
        .is_some_and(|name| name.trim().eq_ignore_ascii_case("plesk"));
    let host = if plesk_server {
        non_empty(meta.ip_address.as_ref()).or_else(host_name)
    } else {
        match kind {
            PanelKind::Webuzo => host().or_else(host_name),
            _ => host_name().or_else(host),
        }
    }
    .ok_or_else(|| InstallError::Config(format!("server for {} has no host name", kind)))?;

    // `use_ssl` and `port` describe the admin API of the server. Only
    // DirectAdmin and ISPmanager serve users on it with a switchable scheme,
    // the other panels always use HTTPS on their own user port.
    let scheme = match kind {
        PanelKind::DirectAdmin | PanelKind::Ispmanager => match meta.ssl_enabled() {
            Some(true) => Scheme::Https,
            _ => Scheme::Http,
        },
        _ => Scheme::Https,
    };
    let port = match kind {
        PanelKind::DirectAdmin | PanelKind::Plesk | PanelKind::Centoswebpanel => meta.port,
        _ => None,
    };

    // Plesk logs in with the reseller account of the server, not the service's
    let (username, password) = match kind {
        PanelKind::Plesk => (
            meta.username.clone().unwrap_or_default(),
            meta.password.clone().unwrap_or_default(),
        ),
        _ => (field(event, kind, "username"), field(event, kind, "password")),
    };
    if username.is_empty() {
        warn!(panel = %kind, host = %host, "no panel username on the service");
    }

    Ok(PanelTarget {
        kind,
        scheme,
        host,
        port,
        username,
        password,
        api_key: non_empty(meta.api_key.as_ref()),
        domain: field(event, kind, "domain"),
    })
}

/// `None` when the service carries no script choice
fn install_options(event: &ServiceEvent) -> Option<InstallOptions> {
    let script = non_empty(event.options.get("script"))?;
    let option = |name: &str| event.options.get(name).cloned().unwrap_or_default();
    Some(InstallOptions {
        script,
        directory: option("directory"),
        admin_username: option("admin_name"),
        admin_password: option("admin_pass"),
        admin_email: event.client_email.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{mount_catalog, test_config};
    use std::collections::HashMap;
    use wiremock::matchers::{body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn event(module: &str) -> ServiceEvent {
        let prefix = module.to_string();
        ServiceEvent {
            event: "Services.add".to_string(),
            status: "active".to_string(),
            old_status: None,
            module: module.to_string(),
            client_email: "owner@example.com".to_string(),
            fields: HashMap::from([
                (format!("{prefix}_username"), "alice".to_string()),
                (format!("{prefix}_password"), "s3cret".to_string()),
                (format!("{prefix}_domain"), "example.com".to_string()),
            ]),
            options: HashMap::from([
                ("script".to_string(), "WordPress".to_string()),
                ("directory".to_string(), "blog".to_string()),
                ("admin_name".to_string(), "admin".to_string()),
                ("admin_pass".to_string(), "adminpass".to_string()),
            ]),
            server: Default::default(),
        }
    }

    #[test]
    fn test_should_install_rules() {
        let mut ev = event("cpanel");
        assert!(should_install(&ev));

        ev.status = "pending".to_string();
        assert!(!should_install(&ev));

        ev.status = "active".to_string();
        ev.event = "Services.edit".to_string();
        assert!(!should_install(&ev));
        ev.old_status = Some("in_review".to_string());
        assert!(should_install(&ev));
        ev.old_status = Some("pending".to_string());
        assert!(should_install(&ev));
        ev.old_status = Some("suspended".to_string());
        assert!(!should_install(&ev));

        ev.event = "Services.delete".to_string();
        assert!(!should_install(&ev));
    }

    #[test]
    fn test_build_target_host_rules() {
        let mut ev = event("plesk");
        ev.server.host_name = Some("panel.example.com".to_string());
        ev.server.ip_address = Some("10.0.0.5".to_string());
        ev.server.host = Some("other.example.com".to_string());
        ev.server.username = Some("admin".to_string());
        ev.server.password = Some("root-pass".to_string());
        ev.server.port = Some(8880);

        let plesk = build_target(PanelKind::Plesk, &ev).unwrap();
        assert_eq!(plesk.host, "panel.example.com");
        assert_eq!(plesk.username, "admin");
        assert_eq!(plesk.password, "root-pass");
        assert_eq!(plesk.domain, "example.com");
        assert_eq!(plesk.base_url(8443), "https://panel.example.com:8880");

        ev.server.server_name = Some("Plesk".to_string());
        assert_eq!(build_target(PanelKind::Plesk, &ev).unwrap().host, "10.0.0.5");

        let mut ev = event("webuzo");
        ev.server.host_name = Some("panel.example.com".to_string());
        ev.server.host = Some("webuzo.example.com".to_string());
        assert_eq!(build_target(PanelKind::Webuzo, &ev).unwrap().host, "webuzo.example.com");

        let mut ev = event("direct_admin");
        ev.server.host = Some("da.example.com".to_string());
        ev.server.port = Some(2222);
        let da = build_target(PanelKind::DirectAdmin, &ev).unwrap();
        assert_eq!(da.host, "da.example.com");
        assert_eq!(da.username, "alice");
        assert_eq!(da.base_url(2222), "http://da.example.com:2222");

        ev.server.use_ssl = Some("1".to_string());
        assert_eq!(build_target(PanelKind::DirectAdmin, &ev).unwrap().scheme, Scheme::Https);
    }

    #[test]
    fn test_admin_api_settings_do_not_leak_into_user_panels() {
        let mut ev = event("cpanel");
        ev.server.host_name = Some("cp.example.com".to_string());
        ev.server.use_ssl = Some("false".to_string());
        ev.server.port = Some(2087);

        let cpanel = build_target(PanelKind::Cpanel, &ev).unwrap();
        assert_eq!(cpanel.base_url(2083), "https://cp.example.com:2083");

        let mut ev = event("webuzo");
        ev.server.host = Some("wz.example.com".to_string());
        ev.server.use_ssl = Some("0".to_string());
        ev.server.port = Some(2004);
        let webuzo = build_target(PanelKind::Webuzo, &ev).unwrap();
        assert_eq!(webuzo.base_url(2003), "https://wz.example.com:2003");

        let mut ev = event("ispmanager");
        ev.server.host_name = Some("isp.example.com".to_string());
        ev.server.port = Some(1501);
        ev.server.use_ssl = Some("true".to_string());
        let isp = build_target(PanelKind::Ispmanager, &ev).unwrap();
        assert_eq!(isp.base_url(1500), "https://isp.example.com:1500");

        let mut ev = event("centoswebpanel");
        ev.server.host_name = Some("cwp.example.com".to_string());
        ev.server.port = Some(2304);
        ev.server.use_ssl = Some("0".to_string());
        let cwp = build_target(PanelKind::Centoswebpanel, &ev).unwrap();
        assert_eq!(cwp.base_url(2304), "https://cwp.example.com:2304");
    }

    #[test]
    fn test_build_target_without_host() {
        let ev = event("cpanel");
        let err = build_target(PanelKind::Cpanel, &ev).unwrap_err();
        assert!(matches!(err, InstallError::Config(_)));
    }

    #[test]
    fn test_install_options_from_event() {
        let opts = install_options(&event("cpanel")).unwrap();
        assert_eq!(opts.script, "WordPress");
        assert_eq!(opts.directory, "blog");
        assert_eq!(opts.admin_email, "owner@example.com");

        let mut ev = event("cpanel");
        ev.options.insert("script".to_string(), "  ".to_string());
        assert!(install_options(&ev).is_none());
    }

    #[tokio::test]
    async fn test_handle_skips_unknown_module_and_missing_script() {
        let dispatcher = Dispatcher::new(AppConfig::default());

        let outcome = dispatcher.handle(&event("vultr")).await.unwrap();
        assert!(matches!(outcome, DispatchOutcome::Skipped(ref r) if r.contains("vultr")));

        let mut ev = event("cpanel");
        ev.options.remove("script");
        let outcome = dispatcher.handle(&ev).await.unwrap();
        assert!(matches!(outcome, DispatchOutcome::Skipped(_)));

        ev.status = "suspended".to_string();
        let outcome = dispatcher.handle(&ev).await.unwrap();
        assert!(matches!(outcome, DispatchOutcome::Skipped(_)));
    }

    #[tokio::test]
    async fn test_handle_installs_on_directadmin() {
        let server = MockServer::start().await;
        mount_catalog(&server).await;
        Mock::given(method("POST"))
            .and(path("/CMD_LOGIN"))
            .and(body_string_contains("username=alice"))
            .respond_with(
                ResponseTemplate::new(302)
                    .append_header("Set-Cookie", "session=da9")
                    .insert_header("Location", "/"),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/CMD_PLUGINS/softaculous/index.raw"))
            .and(query_param("soft", "26"))
            .respond_with(ResponseTemplate::new(200).set_body_string("installed"))
            .expect(1)
            .mount(&server)
            .await;

        let mut ev = event("direct_admin");
        ev.server.host_name = Some("127.0.0.1".to_string());
        ev.server.port = Some(server.address().port());
        ev.server.use_ssl = Some("0".to_string());

        let dispatcher = Dispatcher::new(test_config(&server));
        match dispatcher.handle(&ev).await.unwrap() {
            DispatchOutcome::Installed(report) => {
                assert_eq!(report.panel, PanelKind::DirectAdmin);
                assert_eq!(report.domain, "example.com");
                assert_eq!(report.sid, 26);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
