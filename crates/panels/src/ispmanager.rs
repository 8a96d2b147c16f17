use std::collections::HashMap;

use async_trait::async_trait;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use autoinstaller_core::{InstallError, PanelKind, PanelTarget};

use crate::installer::{PanelInstaller, SoftaculousEndpoint};
use crate::session::{PanelResponse, PanelSession};

/// Script id whose install page is fetched only to read a CSRF token
const TOKEN_PAGE_SID: &str = "26";

/// ISPmanager: JSON API session, then a redirect hop into Softaculous which
/// wants a CSRF token on every call.
pub struct IspmanagerInstaller {
    default_port: u16,
}

impl IspmanagerInstaller {
    pub fn new(default_port: u16) -> Self {
        Self { default_port }
    }
}

#[async_trait]
impl PanelInstaller for IspmanagerInstaller {
    fn kind(&self) -> PanelKind {
        PanelKind::Ispmanager
    }

    async fn open_softaculous(
        &self,
        session: &PanelSession,
        target: &PanelTarget,
    ) -> Result<SoftaculousEndpoint, InstallError> {
        let api_url = Url::parse(&format!("{}/ispmgr", target.base_url(self.default_port)))?;

        // Panel session
        let authinfo = format!("{}:{}", target.username, target.password);
        let login = session
            .get(
                &api_url,
                &[
                    ("authinfo", authinfo.as_str()),
                    ("func", "auth"),
                    ("out", "json"),
                    ("sok", "ok"),
                ],
            )
            .await?
            .json()?;
        let session_id = login
            .pointer("/doc/auth/$id")
            .and_then(Value::as_str)
            .ok_or_else(|| InstallError::Login(remote_error(&login)))?
            .to_string();

        // Softaculous login link
        let redirect = session
            .get(
                &api_url,
                &[
                    ("auth", session_id.as_str()),
                    ("func", "softaculous.redirect"),
                    ("out", "json"),
                    ("sok", "ok"),
                ],
            )
            .await?
            .json()?;
        let link = redirect
            .pointer("/doc/ok/$")
            .and_then(Value::as_str)
            .ok_or_else(|| InstallError::Remote(remote_error(&redirect)))?;

        let mut login_url = api_url.join(link)?;
        let query: HashMap<String, String> = login_url.query_pairs().into_owned().collect();
        login_url.set_query(None);

        let hop = session
            .get(
                &login_url,
                &[
                    ("func", "redirect"),
                    ("auth", query_value(&query, "auth")),
                    ("authm", query_value(&query, "authm")),
                    ("lang", query_value(&query, "lang")),
                    ("redirect_uri", query_value(&query, "redirect_uri")),
                    ("sok", "ok"),
                ],
            )
            .await?;
        let location = hop.redirect_url().cloned();
        debug!(
            host = %target.host,
            location = ?location.as_ref().map(|l| l.path()),
            "ISPmanager softaculous hop"
        );

        let api = location.clone().unwrap_or_else(|| login_url.clone());
        let token = fetch_csrf_token(session, &api).await?;

        let url = match location {
            Some(location) => location.join("index.php")?,
            None => login_url,
        };

        let mut endpoint = SoftaculousEndpoint::new(url);
        endpoint.extras.push(("csrf_token".to_string(), token));
        Ok(endpoint)
    }
}

fn query_value<'q>(query: &'q HashMap<String, String>, name: &str) -> &'q str {
    query.get(name).map(String::as_str).unwrap_or("")
}

async fn fetch_csrf_token(session: &PanelSession, api: &Url) -> Result<String, InstallError> {
    let page = session
        .get(api, &[("act", "software"), ("soft", TOKEN_PAGE_SID)])
        .await?;
    let token = extract_csrf_token(&page);
    if token.is_empty() {
        warn!(url = %page.url, "no csrf_token on the Softaculous page");
    }
    Ok(token)
}

/// Value of the hidden `csrf_token` input, empty when the page has none
fn extract_csrf_token(page: &PanelResponse) -> String {
    let document = Html::parse_document(&page.body);
    Selector::parse(r#"input[name="csrf_token"]"#)
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .and_then(|el| el.value().attr("value"))
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}

/// ISPmanager reports failures as `{"doc":{"error":{"msg":{"$":"..."}}}}`
fn remote_error(doc: &Value) -> String {
    doc.pointer("/doc/error/msg/$")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| "unexpected response from ISPmanager".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{http_target, mount_catalog, options, test_config};
    use crate::Installer;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_panel_session(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/ispmgr"))
            .and(query_param("func", "auth"))
            .and(query_param("authinfo", "alice:s3cret"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"doc": {"auth": {"$id": "sess42"}}})),
            )
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/ispmgr"))
            .and(query_param("func", "softaculous.redirect"))
            .and(query_param("auth", "sess42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"doc": {"ok": {
                "$": format!(
                    "{}/softlogin?auth=k1&authm=key&lang=en&redirect_uri=%2Fsoft%2F",
                    server.uri()
                )
            }}})))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_ispmanager_install_carries_csrf_token() {
        let server = MockServer::start().await;
        mount_catalog(&server).await;
        mount_panel_session(&server).await;
        Mock::given(method("GET"))
            .and(path("/softlogin"))
            .and(query_param("func", "redirect"))
            .and(query_param("auth", "k1"))
            .and(query_param("authm", "key"))
            .and(query_param("redirect_uri", "/soft/"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", "/soft/"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/soft/"))
            .and(query_param("act", "software"))
            .and(query_param("soft", "26"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<form><input type="hidden" name="csrf_token" value=" t0k3n " /></form>"#,
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/soft/index.php"))
            .and(query_param("api", "json"))
            .and(query_param("soft", "72"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"done":1}"#))
            .expect(1)
            .mount(&server)
            .await;

        let session = PanelSession::new(&test_config(&server).http).unwrap();
        let endpoint = IspmanagerInstaller::new(1500)
            .open_softaculous(&session, &http_target(PanelKind::Ispmanager, &server))
            .await
            .unwrap();
        assert_eq!(endpoint.url.path(), "/soft/index.php");
        assert_eq!(endpoint.extras, vec![("csrf_token".to_string(), "t0k3n".to_string())]);

        let installer = Installer::new(test_config(&server));
        let report = installer
            .install(&http_target(PanelKind::Ispmanager, &server), &options("drupal"))
            .await
            .unwrap();
        assert_eq!(report.sid, 72);
    }

    #[tokio::test]
    async fn test_ispmanager_without_redirect_stays_on_login_url() {
        let server = MockServer::start().await;
        mount_panel_session(&server).await;
        Mock::given(method("GET"))
            .and(path("/softlogin"))
            .and(query_param("func", "redirect"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/softlogin"))
            .and(query_param("act", "software"))
            .and(query_param("soft", "26"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<input type="hidden" name="csrf_token" value="plain" />"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let session = PanelSession::new(&test_config(&server).http).unwrap();
        let endpoint = IspmanagerInstaller::new(1500)
            .open_softaculous(&session, &http_target(PanelKind::Ispmanager, &server))
            .await
            .unwrap();

        assert_eq!(endpoint.url.path(), "/softlogin");
        assert_eq!(endpoint.url.query(), None);
        assert_eq!(endpoint.extras, vec![("csrf_token".to_string(), "plain".to_string())]);
    }

    #[tokio::test]
    async fn test_ispmanager_auth_error_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ispmgr"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "doc": {"error": {"$type": "auth", "msg": {"$": "Invalid username or password"}}}
            })))
            .mount(&server)
            .await;

        let session = PanelSession::new(&test_config(&server).http).unwrap();
        let err = IspmanagerInstaller::new(1500)
            .open_softaculous(&session, &http_target(PanelKind::Ispmanager, &server))
            .await
            .unwrap_err();

        assert!(matches!(err, InstallError::Login(ref m) if m == "Invalid username or password"));
    }

    #[test]
    fn test_extract_csrf_token_missing() {
        let page = PanelResponse {
            url: Url::parse("http://h/soft/").unwrap(),
            status: 200,
            location: None,
            body: "<html><body>No form</body></html>".to_string(),
        };
        assert_eq!(extract_csrf_token(&page), "");
    }
}
