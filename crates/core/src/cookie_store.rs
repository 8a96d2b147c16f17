//! Cookie jar for a single install session
//! Panels authenticate the follow-up Softaculous requests through the session cookies
//! handed out by their login endpoints, so every Set-Cookie is captured and replayed.

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::trace;

pub struct CookieJar {
    // host -> cookie name -> value
    store: Arc<DashMap<String, BTreeMap<String, String>>>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self {
            store: Arc::new(DashMap::new()),
        }
    }

    /// Record a raw `Set-Cookie` header value for a host.
    /// Only the leading `name=value` pair is kept, attributes are ignored.
    pub fn capture(&self, host: &str, set_cookie: &str) {
        let pair = set_cookie.split(';').next().unwrap_or("").trim();
        let Some((name, value)) = pair.split_once('=') else {
            trace!(host, header = set_cookie, "ignoring malformed Set-Cookie");
            return;
        };
        let name = name.trim();
        if name.is_empty() {
            trace!(host, header = set_cookie, "ignoring Set-Cookie without a name");
            return;
        }

        self.store
            .entry(host.to_string())
            .or_default()
            .insert(name.to_string(), value.trim().to_string());
    }

    /// `Cookie` header value for a host, if we hold any cookies for it
    pub fn header_for(&self, host: &str) -> Option<String> {
        let entry = self.store.get(host)?;
        if entry.is_empty() {
            return None;
        }

        Some(
            entry
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    pub fn has_cookies(&self, host: &str) -> bool {
        self.store.get(host).map(|c| !c.is_empty()).unwrap_or(false)
    }
}

impl Default for CookieJar {
    fn default() -> Self {
        Self::new()
    }
}
