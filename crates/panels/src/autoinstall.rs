//! Building the Softaculous autoinstall request and reading its answer.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::Value;
use url::Url;

use autoinstaller_core::php_serialize::{self, PhpValue};
use autoinstaller_core::{InstallError, InstallOptions};

use crate::catalog::ScriptEntry;

/// Fields Softaculous reads from the `autoinstall` blob, in the order it expects them
#[derive(Debug, Clone, PartialEq)]
pub struct AutoInstallData {
    pub softdomain: String,
    pub softdirectory: String,
    pub admin_username: String,
    pub admin_pass: String,
    pub admin_email: String,
    /// Panel specific additions such as `csrf_token`
    pub extras: Vec<(String, String)>,
}

impl AutoInstallData {
    pub fn new(domain: &str, options: &InstallOptions) -> Self {
        Self {
            softdomain: domain.to_string(),
            softdirectory: options.directory.trim().to_string(),
            admin_username: options.admin_username.clone(),
            admin_pass: options.admin_password.clone(),
            admin_email: options.admin_email.clone(),
            extras: Vec::new(),
        }
    }

    pub fn with_extras(mut self, extras: &[(String, String)]) -> Self {
        self.extras.extend(extras.iter().cloned());
        self
    }

    fn to_php(&self) -> PhpValue {
        let mut pairs = vec![
            ("softdomain".to_string(), self.softdomain.clone()),
            ("softdirectory".to_string(), self.softdirectory.clone()),
            ("admin_username".to_string(), self.admin_username.clone()),
            ("admin_pass".to_string(), self.admin_pass.clone()),
            ("admin_email".to_string(), self.admin_email.clone()),
        ];
        pairs.extend(self.extras.iter().cloned());
        PhpValue::string_map(pairs)
    }
}

/// rawurlencode(base64_encode(serialize($data)))
pub fn encode_autoinstall(data: &AutoInstallData) -> String {
    let serialized = php_serialize::to_string(&data.to_php());
    urlencoding::encode(&STANDARD.encode(serialized)).into_owned()
}

/// Softaculous install page URL carrying the autoinstall request
pub fn install_url(
    base: &Url,
    script: &ScriptEntry,
    data: &AutoInstallData,
) -> Result<Url, InstallError> {
    let mut raw = base.to_string();
    raw.push(if base.query().is_some() { '&' } else { '?' });
    raw.push_str(&format!(
        "act={}&api=json&soft={}&autoinstall={}",
        script.kind.action(),
        script.sid,
        encode_autoinstall(data)
    ));
    Ok(Url::parse(&raw)?)
}

#[derive(Debug, Clone, PartialEq)]
pub enum InstallVerdict {
    Installed { message: Option<String> },
    Failed(String),
}

/// Decide whether Softaculous accepted the install.
///
/// Depending on panel and Softaculous version the answer is the bare word
/// `installed`, a JSON object with `done`/`error`, or a PHP serialized list of
/// error messages.
pub fn interpret_response(body: &str) -> InstallVerdict {
    let body = body.trim();

    if body.eq_ignore_ascii_case("installed") {
        return InstallVerdict::Installed { message: None };
    }

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        if map.get("done").map(is_truthy).unwrap_or(false) {
            let message = map
                .get("done_msg")
                .or_else(|| map.get("__settings").and_then(|s| s.get("softurl")))
                .and_then(Value::as_str)
                .map(str::to_string);
            return InstallVerdict::Installed { message };
        }
        return match map.get("error").and_then(error_text) {
            Some(error) => InstallVerdict::Failed(error),
            None => InstallVerdict::Failed(body.to_string()),
        };
    }

    if let Ok(value) = php_serialize::from_str(body) {
        if let Some(first) = value
            .as_array()
            .and_then(|items| items.first())
            .and_then(|(_, v)| v.to_text())
        {
            return InstallVerdict::Failed(first);
        }
    }

    if body.is_empty() {
        return InstallVerdict::Failed("empty response from Softaculous".to_string());
    }
    InstallVerdict::Failed(body.to_string())
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn error_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .filter_map(error_text)
            .collect::<Vec<_>>()
            .join("; "),
        Value::Object(map) => map
            .values()
            .filter_map(error_text)
            .collect::<Vec<_>>()
            .join("; "),
        other => other.to_string(),
    };
    let text = text.trim().to_string();
    (!text.is_empty()).then_some(text)
}
