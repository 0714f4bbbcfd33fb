use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A hyperlink discovered on the page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LinkRecord {
    /// Sequence number within the scan, assigned after deduplication
    pub id: usize,

    /// Absolute resolved address of the anchor's target
    pub url: String,

    /// Display label: visible text, falling back to title, falling back to the URL
    pub text: String,

    /// Anchor's title attribute (empty string if absent)
    pub title: String,

    /// True when the resolved hostname differs from the page's own hostname
    pub is_external: bool,

    /// Resolved hostname, or the page's own hostname if resolution failed
    pub domain: String,

    /// Whether the anchor is reachable by scrolling
    pub is_visible: bool,

    /// Structural locator for re-finding the element on a later highlight request
    pub locator: String,
}

/// Where an email address was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailSource {
    /// A match inside a text node
    Text,
    /// A `mailto:` anchor
    Mailto,
    /// An input or textarea value
    Input,
}

impl std::fmt::Display for EmailSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmailSource::Text => write!(f, "text"),
            EmailSource::Mailto => write!(f, "mailto"),
            EmailSource::Input => write!(f, "input"),
        }
    }
}

/// An email address discovered on the page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmailRecord {
    /// Sequence number within the scan
    pub id: usize,

    /// The address as found on the page (deduplicated case-insensitively)
    pub email: String,

    /// Which of the three sources produced this record
    pub source: EmailSource,

    /// Whether the containing element is reachable by scrolling
    pub is_visible: bool,

    /// Surrounding text for text matches, or a link/field label otherwise
    pub context: String,

    /// The substring after the last `@`, case preserved as found
    pub domain: String,
}

/// Aggregate counts derived from one scan
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScanCounts {
    pub total: usize,
    pub visible: usize,
    pub hidden: usize,

    /// Count of same-host links (links scans only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal: Option<usize>,

    /// Count of cross-host links (links scans only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external: Option<usize>,
}

impl ScanCounts {
    /// Derive counts from a set of link records
    pub fn for_links(records: &[LinkRecord]) -> Self {
        let visible = records.iter().filter(|r| r.is_visible).count();
        let external = records.iter().filter(|r| r.is_external).count();
        Self {
            total: records.len(),
            visible,
            hidden: records.len() - visible,
            internal: Some(records.len() - external),
            external: Some(external),
        }
    }

    /// Derive counts from a set of email records
    pub fn for_emails(records: &[EmailRecord]) -> Self {
        let visible = records.iter().filter(|r| r.is_visible).count();
        Self {
            total: records.len(),
            visible,
            hidden: records.len() - visible,
            internal: None,
            external: None,
        }
    }
}

/// Result of one discovery call
///
/// Created fresh on each scan request; the next scan supersedes it entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult<T> {
    /// Discovered records in document order
    pub records: Vec<T>,

    /// Derived counts
    pub counts: ScanCounts,

    /// URL of the scanned page
    pub page_url: String,

    /// Title of the scanned page
    pub page_title: String,

    /// When the scan completed
    pub extracted_at: DateTime<Utc>,
}

impl ScanResult<LinkRecord> {
    /// Build a link scan result, deriving counts and stamping the time
    pub fn links(records: Vec<LinkRecord>, page_url: String, page_title: String) -> Self {
        let counts = ScanCounts::for_links(&records);
        Self {
            records,
            counts,
            page_url,
            page_title,
            extracted_at: Utc::now(),
        }
    }
}

impl ScanResult<EmailRecord> {
    /// Build an email scan result, deriving counts and stamping the time
    pub fn emails(records: Vec<EmailRecord>, page_url: String, page_title: String) -> Self {
        let counts = ScanCounts::for_emails(&records);
        Self {
            records,
            counts,
            page_url,
            page_title,
            extracted_at: Utc::now(),
        }
    }
}

impl<T> ScanResult<T> {
    /// True when the scan completed but found nothing (a legitimate outcome,
    /// distinct from a failed call)
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(id: usize, external: bool, visible: bool) -> LinkRecord {
        LinkRecord {
            id,
            url: format!("https://example.com/{id}"),
            text: "link".to_string(),
            title: String::new(),
            is_external: external,
            domain: "example.com".to_string(),
            is_visible: visible,
            locator: String::new(),
        }
    }

    #[test]
    fn test_link_counts() {
        let records = vec![link(0, false, true), link(1, true, true), link(2, true, false)];
        let counts = ScanCounts::for_links(&records);
        assert_eq!(counts.total, 3);
        assert_eq!(counts.visible, 2);
        assert_eq!(counts.hidden, 1);
        assert_eq!(counts.internal, Some(1));
        assert_eq!(counts.external, Some(2));
    }

    #[test]
    fn test_email_counts_omit_origin_split() {
        let counts = ScanCounts::for_emails(&[]);
        assert_eq!(counts.internal, None);
        let json = serde_json::to_string(&counts).unwrap();
        assert!(!json.contains("internal"));
    }

    #[test]
    fn test_email_source_serialization() {
        assert_eq!(
            serde_json::to_string(&EmailSource::Mailto).unwrap(),
            "\"mailto\""
        );
    }
}
