use tracing::{debug, info, warn};
use url::Url;

use autoinstaller_core::config::{CatalogConfig, ExtraScript};
use autoinstaller_core::php_serialize::{self, PhpValue};
use autoinstaller_core::InstallError;

use crate::session::PanelSession;

/// Runtime family of a Softaculous script, decides the `act` of the install page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptType {
    Php,
    Js,
    Perl,
    Java,
    Other(String),
}

impl ScriptType {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "" | "php" => ScriptType::Php,
            "js" => ScriptType::Js,
            "perl" => ScriptType::Perl,
            "java" => ScriptType::Java,
            other => ScriptType::Other(other.to_string()),
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            ScriptType::Js => "js",
            ScriptType::Perl => "perl",
            ScriptType::Java => "java",
            ScriptType::Php | ScriptType::Other(_) => "software",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScriptEntry {
    pub sid: u32,
    pub name: String,
    pub kind: ScriptType,
    pub category: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ScriptCatalog {
    scripts: Vec<ScriptEntry>,
}

impl ScriptCatalog {
    /// Build from the decoded `sid => [name, type, ...]` array.
    /// Entries without a usable id or name are skipped.
    pub fn from_php(value: &PhpValue) -> Result<Self, InstallError> {
        let items = value.as_array().ok_or_else(|| {
            InstallError::CatalogUnavailable("script list is not an array".to_string())
        })?;

        let mut scripts = Vec::with_capacity(items.len());
        for (key, info) in items {
            let Some(sid) = key.as_int().and_then(|i| u32::try_from(i).ok()) else {
                continue;
            };
            let Some(name) = info.get("name").and_then(PhpValue::to_text) else {
                continue;
            };
            let text = |field: &str| info.get(field).and_then(PhpValue::to_text);

            scripts.push(ScriptEntry {
                sid,
                name,
                kind: ScriptType::parse(&text("type").unwrap_or_default()),
                category: text("category"),
                version: text("ver").or_else(|| text("version")),
            });
        }

        Ok(Self { scripts })
    }

    /// Locally configured scripts replace downloaded ones with the same id
    pub fn merge_extra(&mut self, extra: &[ExtraScript]) {
        for script in extra {
            let entry = ScriptEntry {
                sid: script.sid,
                name: script.name.clone(),
                kind: ScriptType::parse(&script.script_type),
                category: None,
                version: None,
            };
            match self.scripts.iter_mut().find(|s| s.sid == script.sid) {
                Some(existing) => *existing = entry,
                None => self.scripts.push(entry),
            }
        }
    }

    /// First script whose name matches, ignoring case and surrounding whitespace
    pub fn find_by_name(&self, name: &str) -> Option<&ScriptEntry> {
        let wanted = name.trim().to_lowercase();
        if wanted.is_empty() {
            return None;
        }
        self.scripts
            .iter()
            .find(|s| s.name.trim().to_lowercase() == wanted)
    }

    pub fn get(&self, sid: u32) -> Option<&ScriptEntry> {
        self.scripts.iter().find(|s| s.sid == sid)
    }

    pub fn scripts(&self) -> &[ScriptEntry] {
        &self.scripts
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}

/// Download the Softaculous script list. Fetched fresh on every call.
pub async fn fetch_catalog(
    session: &PanelSession,
    config: &CatalogConfig,
) -> Result<ScriptCatalog, InstallError> {
    let url = Url::parse(&config.url)?;
    debug!(url = %url, "fetching script catalog");

    let resp = session
        .get(&url, &[])
        .await
        .map_err(|e| InstallError::CatalogUnavailable(e.to_string()))?;

    if resp.status >= 400 {
        warn!(url = %url, status = resp.status, "script catalog request rejected");
        return Err(InstallError::CatalogUnavailable(format!(
            "HTTP {} from {}",
            resp.status, url
        )));
    }

    let value = php_serialize::from_str(&resp.body)
        .map_err(|e| InstallError::CatalogUnavailable(e.to_string()))?;
    let mut catalog = ScriptCatalog::from_php(&value)?;
    catalog.merge_extra(&config.extra_scripts);

    info!(scripts = catalog.len(), "script catalog loaded");
    Ok(catalog)
}
