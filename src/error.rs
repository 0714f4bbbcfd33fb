//! Error types for harvest-page.
//!
//! Failures on the page side are always carried back as structured
//! `{success: false, error}` responses and surface here as `Scanner`; the
//! remaining variants belong to the coordinator side of the boundary.

/// Error type for harvesting operations.
#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    /// Could not establish a WebDriver session.
    #[error("failed to connect to WebDriver: {0}")]
    Connect(String),

    /// A WebDriver command failed outright (navigation, script execution).
    #[error("webdriver command failed: {0}")]
    Command(String),

    /// Retries and injection were both exhausted. Not retried further.
    #[error("could not communicate with page; refresh the page and try again ({0})")]
    PageUnreachable(String),

    /// The target is a browser-internal page the scanner cannot run on.
    #[error("cannot access browser internal pages")]
    RestrictedPage,

    /// The in-page scanner reported a failure of its own.
    #[error("scanner error: {0}")]
    Scanner(String),

    /// A response crossed the boundary but did not decode to the expected shape.
    #[error("malformed scanner response: {0}")]
    Protocol(String),

    /// A scan is already running; new scan requests are rejected until it resolves.
    #[error("an extraction is already in progress")]
    ExtractionInProgress,

    /// The safety timeout elapsed while waiting for a scan to resolve.
    #[error("timed out waiting for the scan to complete")]
    ScanTimeout,

    /// No record with this id exists in the last completed scan.
    #[error("link {0} not found in the last scan")]
    LinkNotFound(usize),

    /// The highlight target could not be located or is not visible.
    #[error("highlight failed: {0}")]
    Highlight(String),
}

impl From<serde_json::Error> for HarvestError {
    fn from(err: serde_json::Error) -> Self {
        HarvestError::Protocol(err.to_string())
    }
}

/// Result type alias for harvesting operations.
pub type Result<T> = std::result::Result<T, HarvestError>;
