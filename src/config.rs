use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

/// Configuration for a harvesting session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvesterConfig {
    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Maximum number of send attempts before falling back to injection
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay between retries in milliseconds (scaled by attempt number)
    #[serde(default = "default_retry_base_ms")]
    pub retry_base_ms: u64,

    /// Settle delay after injecting the scanner, in milliseconds
    #[serde(default = "default_injection_settle_ms")]
    pub injection_settle_ms: u64,

    /// How long a highlight stays applied before auto-reverting, in milliseconds
    #[serde(default = "default_highlight_duration_ms")]
    pub highlight_duration_ms: u64,

    /// Safety timeout for a whole scan, in seconds
    #[serde(default = "default_scan_timeout_secs")]
    pub scan_timeout_secs: u64,

    /// How long to wait for the document to finish loading, in milliseconds
    #[serde(default = "default_ready_timeout_ms")]
    pub ready_timeout_ms: u64,
}

impl Default for HarvesterConfig {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            max_attempts: default_max_attempts(),
            retry_base_ms: default_retry_base_ms(),
            injection_settle_ms: default_injection_settle_ms(),
            highlight_duration_ms: default_highlight_duration_ms(),
            scan_timeout_secs: default_scan_timeout_secs(),
            ready_timeout_ms: default_ready_timeout_ms(),
        }
    }
}

impl HarvesterConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn Error>> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config: Self = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Backoff delay before the given 1-based attempt number
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.retry_base_ms * u64::from(attempt))
    }

    /// Settle delay applied after scanner injection
    pub fn injection_settle(&self) -> Duration {
        Duration::from_millis(self.injection_settle_ms)
    }

    /// Safety timeout for a whole scan
    pub fn scan_timeout(&self) -> Duration {
        Duration::from_secs(self.scan_timeout_secs)
    }
}

/// Default value for webdriver_url
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

/// Default number of send attempts before injection
fn default_max_attempts() -> u32 {
    3
}

/// Default retry backoff base in milliseconds
fn default_retry_base_ms() -> u64 {
    250
}

/// Default injection settle delay in milliseconds
fn default_injection_settle_ms() -> u64 {
    400
}

/// Default highlight auto-revert delay in milliseconds
fn default_highlight_duration_ms() -> u64 {
    4000
}

/// Default scan safety timeout in seconds
fn default_scan_timeout_secs() -> u64 {
    15
}

/// Default document-ready wait in milliseconds
fn default_ready_timeout_ms() -> u64 {
    5000
}
