use async_trait::async_trait;
use tracing::{debug, warn};
use url::Url;

use autoinstaller_core::{InstallError, PanelKind, PanelTarget};

use crate::installer::{PanelInstaller, SoftaculousEndpoint};
use crate::session::{softaculous_dir, with_credentials, PanelSession};

/// cPanel: form login, then Softaculous under the `cpsess` path the login redirects to
pub struct CpanelInstaller {
    default_port: u16,
}

impl CpanelInstaller {
    pub fn new(default_port: u16) -> Self {
        Self { default_port }
    }
}

#[async_trait]
impl PanelInstaller for CpanelInstaller {
    fn kind(&self) -> PanelKind {
        PanelKind::Cpanel
    }

    async fn open_softaculous(
        &self,
        session: &PanelSession,
        target: &PanelTarget,
    ) -> Result<SoftaculousEndpoint, InstallError> {
        let base = target.base_url(self.default_port);
        let login_url = Url::parse(&format!("{}/login/", base))?;

        let resp = session
            .post(
                &login_url,
                &[
                    ("user", target.username.as_str()),
                    ("pass", target.password.as_str()),
                    ("goto_uri", "/"),
                ],
            )
            .await
            .map_err(|e| InstallError::Login(e.to_string()))?;

        if matches!(resp.status, 401 | 403) {
            return Err(InstallError::Login(format!(
                "cPanel rejected the credentials for {} (HTTP {})",
                target.username, resp.status
            )));
        }

        // The redirect carries the security token and theme: /cpsessNNN/frontend/<theme>/...
        let path = softaculous_dir(resp.effective_url());
        if path.is_empty() {
            warn!(
                host = %target.host,
                status = resp.status,
                "cPanel login did not redirect into a session"
            );
            return Err(InstallError::SoftaculousNotLocated);
        }
        debug!(host = %target.host, path = %path, "cPanel session path");

        let mut url = Url::parse(&format!("{}{}/softaculous/index.live.php", base, path))?;
        with_credentials(&mut url, &target.username, &target.password)?;
        Ok(SoftaculousEndpoint::new(url))
    }
}
