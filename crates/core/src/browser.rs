//! Page fetching capability.
//!
//! The archiver only needs two things from a browser: an isolated page per
//! publication and the ability to load a URL into it and read the result.
//! [`Browser`] and [`Page`] capture exactly that, so tests can drive the whole
//! pipeline from memory and the CLI can plug in [`HttpBrowser`].

use std::time::Duration;

use async_trait::async_trait;

use crate::Result;

/// Factory of isolated browsing contexts.
#[async_trait]
pub trait Browser: Send + Sync {
    /// Opens a new page for the publication at `base_url`.
    ///
    /// Pages never share cookies or session state with each other.
    async fn new_page(&self, base_url: &str) -> Result<Box<dyn Page>>;
}

/// One browsing context with a single current document.
#[async_trait]
pub trait Page: Send {
    /// Loads `url`, replacing the current document.
    ///
    /// A load the server refuses outright is reported as
    /// [`crate::ArchiveError::NavigationAborted`].
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<()>;

    /// The last successfully loaded document, or an empty string.
    fn content(&self) -> &str;
}

/// Browser-like User-Agent sent by [`HttpBrowser`] unless overridden.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

/// Login credentials for publications behind a paywall.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials").field("email", &self.email).field("password", &"***").finish()
    }
}

/// Settings for [`HttpBrowser`].
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    pub user_agent: String,
    /// Stored session (Playwright storage-state format), used when the file exists.
    pub storage_state: Option<std::path::PathBuf>,
    /// Used to log in when no stored session is available.
    pub credentials: Option<Credentials>,
    /// Refuse to open a page when login fails instead of continuing anonymously.
    pub require_login: bool,
    /// Login request timeout in seconds.
    pub login_timeout: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            storage_state: None,
            credentials: None,
            require_login: false,
            login_timeout: 30,
        }
    }
}

#[cfg(feature = "fetch")]
pub use http::{HttpBrowser, HttpPage, StorageState, StoredCookie};

#[cfg(feature = "fetch")]
mod http {
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use reqwest::Client;
    use reqwest::cookie::Jar;
    use reqwest::header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue, REFERER};
    use serde::Deserialize;
    use serde_json::json;
    use tracing::{debug, error, info, warn};
    use url::Url;

    use super::{Browser, BrowserConfig, Credentials, Page};
    use crate::{ArchiveError, Result};

    /// Cookie entry of a Playwright storage-state file.
    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct StoredCookie {
        pub name: String,
        pub value: String,
        pub domain: String,
        #[serde(default = "root_path")]
        pub path: String,
        #[serde(default)]
        pub secure: bool,
        #[serde(default)]
        pub http_only: bool,
        /// Unix seconds; `-1` for session cookies.
        #[serde(default)]
        pub expires: Option<f64>,
    }

    fn root_path() -> String {
        "/".to_string()
    }

    /// Serialized browser session.
    #[derive(Debug, Clone, Default, Deserialize)]
    pub struct StorageState {
        #[serde(default)]
        pub cookies: Vec<StoredCookie>,
    }

    impl StorageState {
        /// Reads a storage-state file.
        pub fn load(path: &Path) -> Result<Self> {
            let content = std::fs::read_to_string(path)
                .map_err(|e| ArchiveError::StorageStateError(format!("cannot read {}: {}", path.display(), e)))?;
            serde_json::from_str(&content)
                .map_err(|e| ArchiveError::StorageStateError(format!("{}: {}", path.display(), e)))
        }

        /// Adds every unexpired cookie to `jar`, returning how many were added.
        pub fn apply_to(&self, jar: &Jar) -> usize {
            let now = chrono::Utc::now().timestamp() as f64;
            let mut added = 0;

            for cookie in &self.cookies {
                if cookie.expires.is_some_and(|exp| exp > 0.0 && exp < now) {
                    debug!(name = %cookie.name, "skipping expired stored cookie");
                    continue;
                }

                let host = cookie.domain.trim_start_matches('.');
                let scheme = if cookie.secure { "https" } else { "http" };
                let Ok(url) = Url::parse(&format!("{scheme}://{host}{}", cookie.path)) else {
                    warn!(domain = %cookie.domain, "skipping stored cookie with an invalid domain");
                    continue;
                };

                let mut header = format!("{}={}; Path={}", cookie.name, cookie.value, cookie.path);
                // A leading dot marks a domain cookie; otherwise the cookie is host-only.
                if cookie.domain.starts_with('.') {
                    header.push_str(&format!("; Domain={host}"));
                }
                if cookie.secure {
                    header.push_str("; Secure");
                }
                if cookie.http_only {
                    header.push_str("; HttpOnly");
                }

                jar.add_cookie_str(&header, &url);
                added += 1;
            }

            added
        }
    }

    /// [`Browser`] over plain HTTP requests with a cookie jar per page.
    #[derive(Debug)]
    pub struct HttpBrowser {
        config: BrowserConfig,
        session: Option<StorageState>,
    }

    impl HttpBrowser {
        /// Creates the browser, reading the stored session if its file exists.
        pub fn new(config: BrowserConfig) -> Result<Self> {
            let session = match &config.storage_state {
                Some(path) if path.is_file() => {
                    info!(path = %path.display(), "loading stored session");
                    Some(StorageState::load(path)?)
                }
                Some(path) => {
                    warn!(path = %path.display(), "stored session not found, login will be attempted if credentials are set");
                    None
                }
                None => None,
            };
            Ok(Self { config, session })
        }

        fn build_client(&self, base_url: &str, jar: Arc<Jar>) -> Result<Client> {
            let mut headers = HeaderMap::new();
            headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
            if let Ok(referer) = HeaderValue::from_str(base_url) {
                headers.insert(REFERER, referer);
            }

            Client::builder()
                .user_agent(&self.config.user_agent)
                .default_headers(headers)
                .cookie_provider(jar)
                .build()
                .map_err(ArchiveError::HttpError)
        }

        async fn login(&self, client: &Client, base_url: &str, credentials: &Credentials) -> Result<()> {
            let login_url = format!("{base_url}/api/v1/login");
            info!(url = %login_url, "attempting login");

            let response = client
                .post(&login_url)
                .timeout(Duration::from_secs(self.config.login_timeout))
                .json(&json!({
                    "email": credentials.email,
                    "password": credentials.password,
                    "captcha_response": null,
                }))
                .send()
                .await
                .map_err(|e| ArchiveError::LoginFailed(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(ArchiveError::LoginFailed(format!("{login_url} returned HTTP {}", status.as_u16())));
            }

            info!("login successful");
            Ok(())
        }
    }

    #[async_trait]
    impl Browser for HttpBrowser {
        async fn new_page(&self, base_url: &str) -> Result<Box<dyn Page>> {
            Url::parse(base_url).map_err(|e| ArchiveError::InvalidUrl(format!("{base_url}: {e}")))?;

            let jar = Arc::new(Jar::default());
            let client = self.build_client(base_url, Arc::clone(&jar))?;

            if let Some(session) = &self.session {
                let count = session.apply_to(&jar);
                debug!(cookies = count, "session loaded, skipping login");
            } else if let Some(credentials) = &self.config.credentials {
                if let Err(e) = self.login(&client, base_url, credentials).await {
                    if self.config.require_login {
                        return Err(e);
                    }
                    error!(error = %e, "login failed, continuing without a session");
                }
            } else {
                warn!("no stored session and no credentials, continuing without login");
            }

            Ok(Box::new(HttpPage::new(client)))
        }
    }

    /// Page backed by a reqwest client.
    #[derive(Debug)]
    pub struct HttpPage {
        client: Client,
        content: String,
    }

    impl HttpPage {
        pub fn new(client: Client) -> Self {
            Self { client, content: String::new() }
        }
    }

    #[async_trait]
    impl Page for HttpPage {
        async fn goto(&mut self, url: &str, timeout: Duration) -> Result<()> {
            self.content.clear();

            let parsed = Url::parse(url).map_err(|e| ArchiveError::InvalidUrl(format!("{url}: {e}")))?;
            let to_error = |e: reqwest::Error| {
                if e.is_timeout() {
                    ArchiveError::Timeout { url: url.to_string(), timeout: timeout.as_secs() }
                } else {
                    ArchiveError::HttpError(e)
                }
            };

            let response = self.client.get(parsed).timeout(timeout).send().await.map_err(to_error)?;

            let status = response.status().as_u16();
            match status {
                401..=403 => return Err(ArchiveError::NavigationAborted { url: url.to_string(), status }),
                _ if !response.status().is_success() => {
                    return Err(ArchiveError::HttpStatus { url: url.to_string(), status });
                }
                _ => {}
            }

            self.content = response.text().await.map_err(to_error)?;
            Ok(())
        }

        fn content(&self) -> &str {
            &self.content
        }
    }

}
