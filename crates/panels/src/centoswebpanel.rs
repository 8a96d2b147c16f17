use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;
use url::Url;

use autoinstaller_core::{InstallError, PanelKind, PanelTarget};

use crate::installer::{PanelInstaller, SoftaculousEndpoint};
use crate::session::PanelSession;

/// CentOS Web Panel: the API key buys a one-time user session token, which the
/// user panel trades for a redirect into Softaculous.
pub struct CentoswebpanelInstaller {
    api_port: u16,
    /// The user panel listens on its own port, `PanelTarget::port` only moves the API
    user_port: u16,
}

impl CentoswebpanelInstaller {
    pub fn new(api_port: u16, user_port: u16) -> Self {
        Self { api_port, user_port }
    }

    async fn session_token(
        &self,
        session: &PanelSession,
        target: &PanelTarget,
        api_key: &str,
    ) -> Result<String, InstallError> {
        let url = Url::parse(&format!("{}/v1/user_session", target.base_url(self.api_port)))?;
        let reply = session
            .post(
                &url,
                &[
                    ("action", "list"),
                    ("key", api_key),
                    ("user", target.username.as_str()),
                    ("module", "softaculous"),
                ],
            )
            .await
            .map_err(|e| InstallError::Login(e.to_string()))?
            .json()?;

        let status = reply.get("status").and_then(Value::as_str).unwrap_or("");
        if status.eq_ignore_ascii_case("error") {
            return Err(InstallError::Remote(message_text(reply.get("msj"))));
        }

        reply
            .pointer("/msj/details/0/token")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                InstallError::Remote("CentOS Web Panel returned no session token".to_string())
            })
    }
}

#[async_trait]
impl PanelInstaller for CentoswebpanelInstaller {
    fn kind(&self) -> PanelKind {
        PanelKind::Centoswebpanel
    }

    async fn open_softaculous(
        &self,
        session: &PanelSession,
        target: &PanelTarget,
    ) -> Result<SoftaculousEndpoint, InstallError> {
        let api_key = target
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| InstallError::Config("CentOS Web Panel needs an API key".to_string()))?;

        let token = self.session_token(session, target, api_key).await?;

        let user_url = Url::parse(&format!(
            "{}://{}:{}/{}/",
            target.scheme.as_str(),
            target.host,
            self.user_port,
            urlencoding::encode(&target.username)
        ))?;
        let login = session
            .post(
                &user_url,
                &[("username", target.username.as_str()), ("token", token.as_str())],
            )
            .await
            .map_err(|e| InstallError::Login(e.to_string()))?;

        let url = match login.redirect_url() {
            Some(url) => url.clone(),
            None => {
                let redirect = login
                    .json()
                    .ok()
                    .and_then(|body| {
                        body.get("redirect_url")
                            .and_then(Value::as_str)
                            .map(str::to_string)
                    })
                    .ok_or_else(|| {
                        InstallError::Login(format!(
                            "CentOS Web Panel user login did not redirect (HTTP {})",
                            login.status
                        ))
                    })?;
                user_url.join(&redirect)?
            }
        };
        debug!(host = %target.host, path = url.path(), "CWP softaculous location");

        Ok(SoftaculousEndpoint::new(url))
    }
}

fn message_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "CentOS Web Panel reported an error".to_string(),
        Some(other) => other.to_string(),
    }
}
