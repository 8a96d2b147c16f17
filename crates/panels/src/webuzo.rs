use async_trait::async_trait;
use tracing::debug;
use url::Url;

use autoinstaller_core::{InstallError, PanelKind, PanelTarget};

use crate::installer::{PanelInstaller, SoftaculousEndpoint};
use crate::session::{softaculous_dir, with_credentials, PanelSession};

pub struct WebuzoInstaller {
    default_port: u16,
}

impl WebuzoInstaller {
    pub fn new(default_port: u16) -> Self {
        Self { default_port }
    }
}

#[async_trait]
impl PanelInstaller for WebuzoInstaller {
    fn kind(&self) -> PanelKind {
        PanelKind::Webuzo
    }

    async fn open_softaculous(
        &self,
        session: &PanelSession,
        target: &PanelTarget,
    ) -> Result<SoftaculousEndpoint, InstallError> {
        let base = target.base_url(self.default_port);
        let login_url = Url::parse(&format!("{}/index.php?api=json", base))?;

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
            .map_err(|e| InstallError::Remote(format!("Webuzo login request failed: {}", e)))?;

        if matches!(resp.status, 401 | 403) {
            return Err(InstallError::Login(format!(
                "Webuzo rejected the credentials for {} (HTTP {})",
                target.username, resp.status
            )));
        }

        // Session path when Webuzo redirects, document root otherwise
        let path = softaculous_dir(resp.effective_url());
        debug!(host = %target.host, path = %path, "Webuzo session path");

        let mut url = Url::parse(&format!("{}{}/softaculous/index.php", base, path))?;
        with_credentials(&mut url, &target.username, &target.password)?;
        Ok(SoftaculousEndpoint::new(url))
    }
}
