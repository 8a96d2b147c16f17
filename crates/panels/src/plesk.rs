use async_trait::async_trait;
use tracing::warn;
use url::Url;

use autoinstaller_core::{InstallError, PanelKind, PanelTarget};

use crate::installer::{PanelInstaller, SoftaculousEndpoint};
use crate::session::PanelSession;

/// Plesk authenticates the Softaculous module through the login session cookie
pub struct PleskInstaller {
    default_port: u16,
}

impl PleskInstaller {
    pub fn new(default_port: u16) -> Self {
        Self { default_port }
    }
}

#[async_trait]
impl PanelInstaller for PleskInstaller {
    fn kind(&self) -> PanelKind {
        PanelKind::Plesk
    }

    async fn open_softaculous(
        &self,
        session: &PanelSession,
        target: &PanelTarget,
    ) -> Result<SoftaculousEndpoint, InstallError> {
        let base = target.base_url(self.default_port);
        let login_url = Url::parse(&format!("{}/login_up.php3", base))?;

        let resp = session
            .post(
                &login_url,
                &[
                    ("login_name", target.username.as_str()),
                    ("passwd", target.password.as_str()),
                ],
            )
            .await
            .map_err(|e| InstallError::Login(e.to_string()))?;

        if resp.status >= 400 {
            return Err(InstallError::Login(format!(
                "Plesk login failed for {} (HTTP {})",
                target.username, resp.status
            )));
        }
        if !session.has_cookies_for(&login_url) {
            warn!(host = %target.host, "Plesk login returned no session cookie");
        }

        let url = Url::parse(&format!("{}/modules/softaculous/index.php", base))?;
        Ok(SoftaculousEndpoint::new(url))
    }
}
