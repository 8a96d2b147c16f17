use async_trait::async_trait;
use tracing::{debug, error, info};
use url::Url;

use autoinstaller_core::{
    AppConfig, InstallError, InstallOptions, InstallReport, PanelKind, PanelTarget,
};

use crate::autoinstall::{install_url, interpret_response, AutoInstallData, InstallVerdict};
use crate::catalog::fetch_catalog;
use crate::session::PanelSession;
use crate::{
    CentoswebpanelInstaller, CpanelInstaller, DirectAdminInstaller, IspmanagerInstaller,
    PleskInstaller, WebuzoInstaller,
};

/// Softaculous entry point of a logged-in panel session
#[derive(Debug, Clone)]
pub struct SoftaculousEndpoint {
    /// May carry `user:pass@` for panels that want basic auth on every call
    pub url: Url,
    /// Extra fields the panel wants inside the autoinstall payload
    pub extras: Vec<(String, String)>,
}

impl SoftaculousEndpoint {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            extras: Vec::new(),
        }
    }
}

/// Every hosting panel implements this
#[async_trait]
pub trait PanelInstaller: Send + Sync {
    fn kind(&self) -> PanelKind;

    /// Log in to the panel and find where it serves Softaculous
    async fn open_softaculous(
        &self,
        session: &PanelSession,
        target: &PanelTarget,
    ) -> Result<SoftaculousEndpoint, InstallError>;
}

/// Runs the shared login → catalog → install flow against any panel
pub struct Installer {
    config: AppConfig,
}

impl Installer {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn adapter_for(&self, kind: PanelKind) -> Box<dyn PanelInstaller> {
        let ports = &self.config.panels;
        match kind {
            PanelKind::Cpanel => Box::new(CpanelInstaller::new(ports.cpanel)),
            PanelKind::Plesk => Box::new(PleskInstaller::new(ports.plesk)),
            PanelKind::DirectAdmin => Box::new(DirectAdminInstaller::new(ports.direct_admin)),
            PanelKind::Ispmanager => Box::new(IspmanagerInstaller::new(ports.ispmanager)),
            PanelKind::Centoswebpanel => Box::new(CentoswebpanelInstaller::new(
                ports.centoswebpanel_api,
                ports.centoswebpanel_user,
            )),
            PanelKind::Webuzo => Box::new(WebuzoInstaller::new(ports.webuzo)),
        }
    }

    pub async fn install(
        &self,
        target: &PanelTarget,
        options: &InstallOptions,
    ) -> Result<InstallReport, InstallError> {
        let adapter = self.adapter_for(target.kind);
        self.install_with(adapter.as_ref(), target, options).await
    }

    pub async fn install_with(
        &self,
        adapter: &dyn PanelInstaller,
        target: &PanelTarget,
        options: &InstallOptions,
    ) -> Result<InstallReport, InstallError> {
        let started_at = chrono::Utc::now();
        info!(
            panel = %adapter.kind(),
            host = %target.host,
            domain = %target.domain,
            script = %options.script,
            "starting softaculous install"
        );

        let session = PanelSession::new(&self.config.http)?;
        let endpoint = adapter.open_softaculous(&session, target).await?;
        debug!(panel = %adapter.kind(), path = endpoint.url.path(), "softaculous located");

        let catalog = fetch_catalog(&session, &self.config.catalog).await?;
        let script = catalog
            .find_by_name(&options.script)
            .ok_or_else(|| InstallError::ScriptNotFound(options.script.trim().to_string()))?;

        let data = AutoInstallData::new(&target.domain, options).with_extras(&endpoint.extras);
        let url = install_url(&endpoint.url, script, &data)?;

        let resp = session.get(&url, &[]).await.map_err(|e| match e {
            InstallError::Network(msg) => {
                InstallError::InstallRejected(format!("installation not completed: {}", msg))
            }
            other => other,
        })?;

        match interpret_response(&resp.body) {
            InstallVerdict::Installed { message } => {
                info!(
                    panel = %adapter.kind(),
                    domain = %target.domain,
                    script = %script.name.trim(),
                    sid = script.sid,
                    "script installed"
                );
                Ok(InstallReport {
                    panel: adapter.kind(),
                    host: target.host.clone(),
                    domain: target.domain.clone(),
                    script: script.name.trim().to_string(),
                    sid: script.sid,
                    message,
                    started_at,
                    finished_at: chrono::Utc::now(),
                })
            }
            InstallVerdict::Failed(reason) => {
                error!(
                    panel = %adapter.kind(),
                    domain = %target.domain,
                    sid = script.sid,
                    status = resp.status,
                    reason = %reason,
                    "softaculous refused the install"
                );
                Err(InstallError::InstallRejected(reason))
            }
        }
    }
}
