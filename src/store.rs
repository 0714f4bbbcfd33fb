//! The coordinator's result store.
//!
//! Exclusively owned by the coordinator side and mutated only when a
//! protocol call completes. Holds the last completed scan of each kind (a
//! new scan supersedes the previous one entirely) plus the view filter, and
//! tracks the extraction-in-progress flag that every completion path
//! (success, error, timeout) must reset.

use crate::filter::ViewFilter;
use crate::records::{EmailRecord, LinkRecord, ScanResult};

/// In-memory view state over completed scans
#[derive(Debug, Default)]
pub struct ResultStore {
    links: Option<ScanResult<LinkRecord>>,
    emails: Option<ScanResult<EmailRecord>>,
    filter: ViewFilter,
    extracting: bool,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks an extraction as started. Returns false when one is already
    /// running, in which case the new request must be rejected.
    pub fn begin_extraction(&mut self) -> bool {
        if self.extracting {
            ::log::debug!("Ignoring scan request: extraction already in progress");
            return false;
        }
        self.extracting = true;
        true
    }

    /// Clears the in-progress flag. Called on every completion path.
    pub fn finish_extraction(&mut self) {
        self.extracting = false;
    }

    pub fn is_extracting(&self) -> bool {
        self.extracting
    }

    /// Replaces the stored link scan (the previous one is superseded)
    pub fn set_links(&mut self, result: ScanResult<LinkRecord>) {
        self.links = Some(result);
    }

    /// Replaces the stored email scan
    pub fn set_emails(&mut self, result: ScanResult<EmailRecord>) {
        self.emails = Some(result);
    }

    pub fn links(&self) -> Option<&ScanResult<LinkRecord>> {
        self.links.as_ref()
    }

    pub fn emails(&self) -> Option<&ScanResult<EmailRecord>> {
        self.emails.as_ref()
    }

    pub fn filter(&self) -> &ViewFilter {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: ViewFilter) {
        self.filter = filter;
    }

    /// Link records passing the current filter, in scan order
    pub fn filtered_links(&self) -> Vec<&LinkRecord> {
        self.links
            .iter()
            .flat_map(|r| &r.records)
            .filter(|record| self.filter.matches_link(record))
            .collect()
    }

    /// Email records passing the current filter, in scan order
    pub fn filtered_emails(&self) -> Vec<&EmailRecord> {
        self.emails
            .iter()
            .flat_map(|r| &r.records)
            .filter(|record| self.filter.matches_email(record))
            .collect()
    }

    /// Looks a link up by its id from the last completed scan
    pub fn link_by_id(&self, id: usize) -> Option<&LinkRecord> {
        self.links
            .iter()
            .flat_map(|r| &r.records)
            .find(|record| record.id == id)
    }

    /// Newline-joined URLs of the filtered view, for clipboard use
    pub fn copy_payload(&self) -> String {
        self.filtered_links()
            .iter()
            .map(|record| record.url.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// One-line count summary of the last link scan
    pub fn link_summary(&self) -> String {
        match &self.links {
            Some(result) => {
                let counts = &result.counts;
                let filtered = self.filtered_links().len();
                if filtered != counts.total {
                    format!("Showing {} of {} links", filtered, counts.total)
                } else {
                    format!(
                        "{} links found ({} visible, {} hidden) - {} internal, {} external",
                        counts.total,
                        counts.visible,
                        counts.hidden,
                        counts.internal.unwrap_or(0),
                        counts.external.unwrap_or(0)
                    )
                }
            }
            None => "No scan yet".to_string(),
        }
    }
}
