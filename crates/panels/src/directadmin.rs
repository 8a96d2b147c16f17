use async_trait::async_trait;
use url::Url;

use autoinstaller_core::{InstallError, PanelKind, PanelTarget};

use crate::installer::{PanelInstaller, SoftaculousEndpoint};
use crate::session::PanelSession;

pub struct DirectAdminInstaller {
    default_port: u16,
}

impl DirectAdminInstaller {
    pub fn new(default_port: u16) -> Self {
        Self { default_port }
    }
}

#[async_trait]
impl PanelInstaller for DirectAdminInstaller {
    fn kind(&self) -> PanelKind {
        PanelKind::DirectAdmin
    }

    async fn open_softaculous(
        &self,
        session: &PanelSession,
        target: &PanelTarget,
    ) -> Result<SoftaculousEndpoint, InstallError> {
        let base = target.base_url(self.default_port);
        let login_url = Url::parse(&format!("{}/CMD_LOGIN", base))?;

        let resp = session
            .post(
                &login_url,
                &[
                    ("username", target.username.as_str()),
                    ("password", target.password.as_str()),
                ],
            )
            .await
            .map_err(|e| InstallError::Login(e.to_string()))?;

        if resp.status >= 400 {
            return Err(InstallError::Login(format!(
                "DirectAdmin login failed for {} (HTTP {})",
                target.username, resp.status
            )));
        }

        let url = Url::parse(&format!("{}/CMD_PLUGINS/softaculous/index.raw", base))?;
        Ok(SoftaculousEndpoint::new(url))
    }
}
