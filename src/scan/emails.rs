use crate::records::{EmailRecord, EmailSource, ScanResult};
use crate::snapshot::DocumentSnapshot;
use crate::utils::char_window;
use crate::visibility::is_visible;
use regex::Regex;
use std::collections::HashSet;

/// Characters of surrounding text captured on each side of a text match
const CONTEXT_MARGIN: usize = 50;

/// Conservative address pattern. Intentionally loose: a borderline match is
/// worth surfacing, a silently dropped real address is not.
const EMAIL_PATTERN: &str = r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}";

/// Email discovery over the three snapshot sources
pub struct EmailScanner {
    pattern: Regex,
}

impl Default for EmailScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl EmailScanner {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(EMAIL_PATTERN).expect("email pattern should be valid"),
        }
    }

    /// Discovers email addresses from text nodes, `mailto:` anchors and
    /// input fields, in that order.
    ///
    /// Addresses are deduplicated case-insensitively across all three
    /// sources with the first occurrence winning, so a prose match (which
    /// carries surrounding context) beats a later mailto or input duplicate
    /// of the same address.
    pub fn discover(&self, snapshot: &DocumentSnapshot) -> ScanResult<EmailRecord> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut records = Vec::new();

        self.scan_text_runs(snapshot, &mut seen, &mut records);
        self.scan_mailto_anchors(snapshot, &mut seen, &mut records);
        self.scan_fields(snapshot, &mut seen, &mut records);

        ::log::info!("Found {} emails in {}", records.len(), snapshot.page_url);

        ScanResult::emails(
            records,
            snapshot.page_url.clone(),
            snapshot.page_title.clone(),
        )
    }

    fn scan_text_runs(
        &self,
        snapshot: &DocumentSnapshot,
        seen: &mut HashSet<String>,
        records: &mut Vec<EmailRecord>,
    ) {
        for run in &snapshot.text_runs {
            for found in self.pattern.find_iter(&run.text) {
                if !seen.insert(found.as_str().to_lowercase()) {
                    continue;
                }
                let context = char_window(&run.text, found.start(), found.end(), CONTEXT_MARGIN)
                    .trim()
                    .to_string();
                records.push(EmailRecord {
                    id: records.len(),
                    email: found.as_str().to_string(),
                    source: EmailSource::Text,
                    is_visible: is_visible(&run.element, &snapshot.bounds),
                    context,
                    domain: domain_of(found.as_str()),
                });
            }
        }
    }

    fn scan_mailto_anchors(
        &self,
        snapshot: &DocumentSnapshot,
        seen: &mut HashSet<String>,
        records: &mut Vec<EmailRecord>,
    ) {
        for anchor in &snapshot.anchors {
            let Some(rest) = strip_mailto(&anchor.href) else {
                continue;
            };
            // Drop any ?subject=... tail
            let email = rest.split('?').next().unwrap_or("").trim();
            if email.is_empty() || !seen.insert(email.to_lowercase()) {
                continue;
            }
            let label = anchor.text.trim();
            records.push(EmailRecord {
                id: records.len(),
                email: email.to_string(),
                source: EmailSource::Mailto,
                is_visible: is_visible(&anchor.element, &snapshot.bounds),
                context: if label.is_empty() {
                    email.to_string()
                } else {
                    label.to_string()
                },
                domain: domain_of(email),
            });
        }
    }

    fn scan_fields(
        &self,
        snapshot: &DocumentSnapshot,
        seen: &mut HashSet<String>,
        records: &mut Vec<EmailRecord>,
    ) {
        for field in &snapshot.fields {
            let value = field.value.trim();
            if value.is_empty() {
                continue;
            }

            // Dedicated email inputs, fields whose name/id hints at email,
            // or any field whose value already looks like an address.
            let qualifies = field.input_type.eq_ignore_ascii_case("email")
                || field.name.to_ascii_lowercase().contains("email")
                || field.id.to_ascii_lowercase().contains("email")
                || self.pattern.is_match(value);
            if !qualifies || !self.pattern.is_match(value) {
                continue;
            }

            if !seen.insert(value.to_lowercase()) {
                continue;
            }

            let label = if !field.name.is_empty() {
                field.name.as_str()
            } else if !field.id.is_empty() {
                field.id.as_str()
            } else {
                "email"
            };

            records.push(EmailRecord {
                id: records.len(),
                email: value.to_string(),
                source: EmailSource::Input,
                is_visible: is_visible(&field.element, &snapshot.bounds),
                context: format!("Input field: {label}"),
                domain: domain_of(value),
            });
        }
    }
}

/// Substring after the last `@`, case preserved as found
fn domain_of(email: &str) -> String {
    email.rsplit('@').next().unwrap_or("").to_string()
}

/// Strips a `mailto:` scheme prefix, case-insensitively
fn strip_mailto(href: &str) -> Option<&str> {
    const PREFIX: &str = "mailto:";
    match href.get(..PREFIX.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(PREFIX) => Some(&href[PREFIX.len()..]),
        _ => None,
    }
}
