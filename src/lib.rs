// Re-export modules
pub mod collector;
pub mod config;
pub mod error;
pub mod export;
pub mod filter;
pub mod messenger;
pub mod protocol;
pub mod records;
pub mod scan;
pub mod session;
pub mod snapshot;
pub mod store;
pub mod utils;
pub mod visibility;

// Re-export commonly used types for convenience
pub use config::HarvesterConfig;
pub use error::{HarvestError, Result};
pub use records::{EmailRecord, LinkRecord, ScanResult};
pub use session::PageSession;

use fantoccini::{Client, ClientBuilder};

/// Main builder for harvesting sessions against a live browser page
pub struct Harvester {
    config: HarvesterConfig,
}

impl Default for Harvester {
    fn default() -> Self {
        Self::new()
    }
}

impl Harvester {
    /// Create a new Harvester builder with default configuration
    pub fn new() -> Self {
        Self {
            config: HarvesterConfig::new(),
        }
    }

    /// Set the full configuration
    pub fn with_config(mut self, config: HarvesterConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the WebDriver URL to connect to
    pub fn with_webdriver_url(mut self, url: &str) -> Self {
        self.config.webdriver_url = url.to_string();
        self
    }

    /// Set the highlight auto-revert delay in milliseconds
    pub fn with_highlight_duration_ms(mut self, duration_ms: u64) -> Self {
        self.config.highlight_duration_ms = duration_ms;
        self
    }

    /// Set the scan safety timeout in seconds
    pub fn with_scan_timeout_secs(mut self, secs: u64) -> Self {
        self.config.scan_timeout_secs = secs;
        self
    }

    /// Connect to a WebDriver server and start a page session.
    ///
    /// The `WEBDRIVER_URL` environment variable overrides the configured
    /// URL; common fallback addresses are tried when the first connection
    /// fails.
    pub async fn connect(mut self) -> Result<PageSession<Client>> {
        if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
            if !webdriver_url.is_empty() {
                self.config.webdriver_url = webdriver_url;
            }
        }

        let client = connect_to_webdriver(&self.config.webdriver_url).await?;
        Ok(PageSession::with_transport(client, self.config))
    }
}

/// Connects to the WebDriver instance, trying common fallback URLs
async fn connect_to_webdriver(webdriver_url: &str) -> Result<Client> {
    match ClientBuilder::native().connect(webdriver_url).await {
        Ok(client) => {
            ::log::debug!("Connected to WebDriver at {}", webdriver_url);
            return Ok(client);
        }
        Err(e) => {
            ::log::error!("Failed to connect to WebDriver at {}: {}", webdriver_url, e);
        }
    }

    // If we couldn't connect, try with common alternative URLs
    let fallback_urls = [
        "http://localhost:9515", // ChromeDriver default
        "http://localhost:4444", // Selenium / geckodriver default
        "http://127.0.0.1:4444", // Try with IP instead of localhost
    ];

    for url in fallback_urls.iter() {
        if *url == webdriver_url {
            continue; // Skip if it's the same as the one we already tried
        }

        ::log::info!("Trying fallback WebDriver URL: {}", url);
        if let Ok(client) = ClientBuilder::native().connect(url).await {
            ::log::debug!("Connected to fallback WebDriver at {}", url);
            return Ok(client);
        }
    }

    ::log::error!("Failed to connect to any WebDriver server");
    Err(HarvestError::Connect(format!(
        "no WebDriver server reachable at {webdriver_url} or fallback addresses; \
         start one (e.g. ChromeDriver) or set WEBDRIVER_URL"
    )))
}
