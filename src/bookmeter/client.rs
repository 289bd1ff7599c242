//! HTTP session for Bookmeter requests using wreq for TLS fingerprint emulation.

use crate::bookmeter::listings::{profile_path, ListingKind, ROOT_URI};
use crate::bookmeter::parser::Parser;
use crate::config::Config;
use crate::error::ScraperError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::RngExt;
use std::time::Duration;
use tracing::{debug, info, warn};
use wreq::{Client, RequestBuilder, StatusCode};
use wreq_util::Emulation;

/// A Bookmeter session - enables mocking for tests.
#[async_trait]
pub trait BookmeterSession: Send + Sync {
    /// Returns true if the session holds a valid login.
    fn is_authenticated(&self) -> bool;

    /// Id of the logged-in user, if any.
    fn log_in_user_id(&self) -> Option<&str>;

    /// Fetches page `page` (1-based) of a user's listing.
    async fn fetch_listing_page(&self, user_id: &str, kind: ListingKind, page: u32)
        -> Result<String>;

    /// Fetches a book page by its site-relative path.
    async fn fetch_book_page(&self, path: &str) -> Result<String>;

    /// Fetches a user's profile page.
    async fn fetch_profile_page(&self, user_id: &str) -> Result<String>;
}

/// Headers sent with every request, on top of the emulated browser's own.
const BROWSER_HEADERS: &[(&str, &str)] = &[
    ("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    ("Accept-Language", "ja,en-US;q=0.9,en;q=0.8"),
    ("Cache-Control", "no-cache"),
    ("Upgrade-Insecure-Requests", "1"),
];

/// Pause taken before each request: a base plus random jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub base_ms: u64,
    pub jitter_ms: u64,
}

impl Pacing {
    /// Picks the next pause. `None` when pacing is off.
    pub fn next_pause(&self) -> Option<Duration> {
        if self.base_ms == 0 {
            return None;
        }
        let jitter = match self.jitter_ms {
            0 => 0,
            max => rand::rng().random_range(0..=max),
        };
        Some(Duration::from_millis(self.base_ms + jitter))
    }
}

/// Bookmeter HTTP client with browser impersonation and a cookie-backed login.
pub struct BookmeterClient {
    client: Client,
    pacing: Pacing,
    base_url: Option<String>,
    log_in_user_id: Option<String>,
}

impl BookmeterClient {
    /// Creates a new, logged-out client with the given configuration.
    pub async fn new(config: &Config) -> Result<Self> {
        Self::with_base_url(config, None).await
    }

    /// Creates a new client with an optional custom base URL (for testing).
    pub async fn with_base_url(config: &Config, base_url: Option<String>) -> Result<Self> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10));

        if let Some(proxy_url) = &config.proxy {
            debug!("Configuring proxy: {}", proxy_url);
            let proxy = wreq::Proxy::all(proxy_url).context("Failed to configure proxy")?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            pacing: Pacing { base_ms: config.delay_ms, jitter_ms: config.delay_jitter_ms },
            base_url,
            log_in_user_id: None,
        })
    }

    /// Returns the base URL (custom for testing, or the live site).
    fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(ROOT_URI)
    }

    /// Logs in with the given credentials and remembers the logged-in user id.
    pub async fn log_in(&mut self, mail: &str, password: &str) -> Result<&str> {
        let login_url = format!("{}/login", self.base_url());
        let login_page = self.get(&login_url).await.context("Failed to load login page")?;

        let parser = Parser::new();
        let mut form = vec![
            ("session[email_address]", mail.to_string()),
            ("session[password]", password.to_string()),
            ("session[keep]", "1".to_string()),
        ];
        if let Some(token) = parser.parse_authenticity_token(&login_page) {
            form.push(("authenticity_token", token));
        }

        let body = form
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        info!("Logging in as {}", mail);
        self.delay().await;

        let response = with_browser_headers(self.client.post(&login_url))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .context("Failed to send login request")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!(ScraperError::LoginFailed(format!("login returned status {}", status)));
        }

        let landing = response.text().await.context("Failed to read login response")?;
        let user_id = parser
            .parse_login_user_id(&landing)
            .ok_or_else(|| ScraperError::LoginFailed("no logged-in user on landing page".into()))?;

        info!("Logged in as user {}", user_id);
        Ok(self.log_in_user_id.insert(user_id).as_str())
    }

    /// GETs `url` and returns the page body.
    async fn get(&self, url: &str) -> Result<String> {
        self.delay().await;

        debug!("GET {}", url);
        let response = with_browser_headers(self.client.get(url))
            .send()
            .await
            .context("Failed to send request")?;

        check_status(response.status())?;
        response.text().await.context("Failed to read response body")
    }

    async fn delay(&self) {
        if let Some(pause) = self.pacing.next_pause() {
            debug!("Waiting {}ms before next request", pause.as_millis());
            tokio::time::sleep(pause).await;
        }
    }
}

fn with_browser_headers(request: RequestBuilder) -> RequestBuilder {
    BROWSER_HEADERS
        .iter()
        .fold(request.emulation(Emulation::Chrome131), |req, (name, value)| req.header(*name, *value))
}

fn check_status(status: StatusCode) -> Result<()> {
    debug!("Response status: {}", status);

    if status == StatusCode::SERVICE_UNAVAILABLE || status == StatusCode::TOO_MANY_REQUESTS {
        warn!("Rate limited ({}). Consider using a proxy or increasing delay.", status);
        anyhow::bail!(ScraperError::RateLimited);
    }
    if !status.is_success() {
        anyhow::bail!("Request failed with status: {}", status);
    }
    Ok(())
}

#[async_trait]
impl BookmeterSession for BookmeterClient {
    fn is_authenticated(&self) -> bool {
        self.log_in_user_id.is_some()
    }

    fn log_in_user_id(&self) -> Option<&str> {
        self.log_in_user_id.as_deref()
    }

    async fn fetch_listing_page(
        &self,
        user_id: &str,
        kind: ListingKind,
        page: u32,
    ) -> Result<String> {
        let url = format!("{}{}", self.base_url(), kind.path(user_id, page));

        info!("Fetching {} of user {} (page {})", kind, user_id, page);
        self.get(&url).await
    }

    async fn fetch_book_page(&self, path: &str) -> Result<String> {
        let url = format!("{}{}", self.base_url(), path);

        debug!("Fetching book page: {}", path);
        self.get(&url).await
    }

    async fn fetch_profile_page(&self, user_id: &str) -> Result<String> {
        let url = format!("{}{}", self.base_url(), profile_path(user_id));

        info!("Fetching profile of user {}", user_id);
        self.get(&url).await
    }
}
