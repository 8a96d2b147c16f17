use std::time::{Duration, Instant};

use reqwest::header::{COOKIE, LOCATION, SET_COOKIE};
use reqwest::redirect::Policy;
use tracing::{debug, warn};
use url::Url;

use autoinstaller_core::config::HttpConfig;
use autoinstaller_core::{CookieJar, InstallError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

/// Browser-like HTTP session against a single panel.
///
/// Redirects are never followed: the `Location` a panel answers a login with
/// is how most adapters find out where Softaculous lives.
pub struct PanelSession {
    client: reqwest::Client,
    cookies: CookieJar,
}

#[derive(Debug, Clone)]
pub struct PanelResponse {
    /// Requested URL, without credentials
    pub url: Url,
    pub status: u16,
    /// `Location` header resolved against `url`
    pub location: Option<Url>,
    /// Trimmed response body
    pub body: String,
}

impl PanelResponse {
    /// Where the panel wants to send us, if anywhere else than the requested URL
    pub fn redirect_url(&self) -> Option<&Url> {
        self.location.as_ref().filter(|location| *location != &self.url)
    }

    /// Redirect target when redirected, the requested URL otherwise
    pub fn effective_url(&self) -> &Url {
        self.redirect_url().unwrap_or(&self.url)
    }

    pub fn json(&self) -> Result<serde_json::Value, InstallError> {
        serde_json::from_str(&self.body)
            .map_err(|e| InstallError::Parse(format!("expected JSON from {}: {}", self.url, e)))
    }
}

impl PanelSession {
    pub fn new(config: &HttpConfig) -> Result<Self, InstallError> {
        let client = reqwest::Client::builder()
            .redirect(Policy::none())
            .danger_accept_invalid_certs(!config.verify_tls)
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| InstallError::Network(e.to_string()))?;

        Ok(Self {
            client,
            cookies: CookieJar::new(),
        })
    }

    /// Whether the jar holds cookies for the host of `url`, keyed like `request` keys them
    pub fn has_cookies_for(&self, url: &Url) -> bool {
        self.cookies.has_cookies(url.host_str().unwrap_or_default())
    }

    /// Send a request the way a browser form would.
    ///
    /// GET/DELETE carry `params` in the query string, POST as an urlencoded body.
    /// Credentials embedded in the URL are sent as basic auth.
    pub async fn request(
        &self,
        method: Method,
        url: &Url,
        params: &[(&str, &str)],
    ) -> Result<PanelResponse, InstallError> {
        let start = Instant::now();
        let mut url = url.clone();
        let credentials = take_credentials(&mut url);

        if method != Method::Post && !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params.iter());
        }

        let host = url.host_str().unwrap_or_default().to_string();

        let mut builder = match method {
            Method::Get => self.client.get(url.clone()),
            Method::Delete => self.client.delete(url.clone()),
            Method::Post => self.client.post(url.clone()).form(params),
        };
        if let Some((user, pass)) = credentials {
            builder = builder.basic_auth(user, Some(pass));
        }
        if let Some(cookie) = self.cookies.header_for(&host) {
            builder = builder.header(COOKIE, cookie);
        }

        debug!(method = ?method, url = %url, "panel request");

        let resp = builder.send().await.map_err(|e| {
            warn!(url = %url, error = %e, "panel request failed");
            InstallError::Network(e.to_string())
        })?;

        let status = resp.status().as_u16();

        for value in resp.headers().get_all(SET_COOKIE) {
            if let Ok(value) = value.to_str() {
                self.cookies.capture(&host, value);
            }
        }

        let location = resp
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|loc| url.join(loc).ok());

        let body = resp
            .text()
            .await
            .map_err(|e| InstallError::Network(e.to_string()))?;

        debug!(
            url = %url,
            status,
            redirected = location.is_some(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "panel response"
        );

        Ok(PanelResponse {
            url,
            status,
            location,
            body: body.trim().to_string(),
        })
    }

    pub async fn get(
        &self,
        url: &Url,
        params: &[(&str, &str)],
    ) -> Result<PanelResponse, InstallError> {
        self.request(Method::Get, url, params).await
    }

    pub async fn post(
        &self,
        url: &Url,
        params: &[(&str, &str)],
    ) -> Result<PanelResponse, InstallError> {
        self.request(Method::Post, url, params).await
    }
}

/// Embed `user:pass@` into the URL (percent-encoded by `url`)
pub fn with_credentials(url: &mut Url, user: &str, pass: &str) -> Result<(), InstallError> {
    url.set_username(user)
        .and_then(|_| url.set_password(Some(pass)))
        .map_err(|_| InstallError::InvalidUrl(format!("cannot carry credentials: {}", url)))
}

/// Strip `user:pass@` from the URL, returning the decoded pair
fn take_credentials(url: &mut Url) -> Option<(String, String)> {
    if url.username().is_empty() {
        return None;
    }

    let decode = |s: &str| {
        urlencoding::decode(s)
            .map(|c| c.into_owned())
            .unwrap_or_else(|_| s.to_string())
    };
    let user = decode(url.username());
    let pass = url.password().map(decode).unwrap_or_default();

    let _ = url.set_username("");
    let _ = url.set_password(None);

    Some((user, pass))
}

/// Directory part of a URL path, the way panels lay out per-session paths.
///
/// `/cpsess42/frontend/jupiter/index.html` becomes `/cpsess42/frontend/jupiter`.
/// Always starts with `/` unless empty, never ends with one.
pub fn softaculous_dir(url: &Url) -> String {
    let path = url.path().trim_end_matches('/');
    let dir = match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    };
    let dir = dir.trim().trim_end_matches('/');

    if dir.is_empty() {
        String::new()
    } else if dir.starts_with('/') {
        dir.to_string()
    } else {
        format!("/{}", dir)
    }
}
