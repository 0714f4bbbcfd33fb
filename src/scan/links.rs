use crate::records::{LinkRecord, ScanResult};
use crate::snapshot::DocumentSnapshot;
use crate::visibility::is_visible;
use std::collections::HashSet;
use url::Url;

/// Discovers every hyperlink in the snapshot, in document order.
///
/// Script and data URLs are excluded entirely; `mailto:` anchors are left to
/// the email engine so the same address is not counted twice. Duplicate
/// targets (a nav menu repeated in header and footer) collapse to the first
/// occurrence, compared on the fragment-stripped absolute URL.
pub fn discover(snapshot: &DocumentSnapshot) -> ScanResult<LinkRecord> {
    let base = Url::parse(&snapshot.page_url).ok();
    let mut seen = HashSet::new();
    let mut records = Vec::new();

    for anchor in &snapshot.anchors {
        let href = anchor.href.trim();
        if href.is_empty() {
            continue;
        }
        if has_scheme(href, "javascript") || has_scheme(href, "data") {
            ::log::trace!("Skipping script/data href: {}", href);
            continue;
        }
        if has_scheme(href, "mailto") {
            continue;
        }

        // Resolution failure falls open: keep the raw href and classify the
        // link as internal rather than dropping or over-flagging it.
        let (url, dedup_key, is_external, domain) = match resolve(base.as_ref(), href) {
            Some(resolved) => {
                let (is_external, domain) = match resolved.host_str() {
                    Some(host) => (host != snapshot.hostname, host.to_string()),
                    None => (false, snapshot.hostname.clone()),
                };
                let url = resolved.as_str().to_string();
                let mut normalized = resolved;
                normalized.set_fragment(None);
                (url, normalized.to_string(), is_external, domain)
            }
            None => {
                ::log::debug!("Could not resolve href, keeping raw: {}", href);
                (
                    href.to_string(),
                    href.to_string(),
                    false,
                    snapshot.hostname.clone(),
                )
            }
        };

        if !seen.insert(dedup_key) {
            ::log::trace!("Skipping duplicate link target: {}", url);
            continue;
        }

        let text = display_text(&anchor.text, &anchor.title, &url);

        records.push(LinkRecord {
            id: 0, // assigned after dedup
            url,
            text,
            title: anchor.title.trim().to_string(),
            is_external,
            domain,
            is_visible: is_visible(&anchor.element, &snapshot.bounds),
            locator: anchor.element.locator.clone(),
        });
    }

    for (id, record) in records.iter_mut().enumerate() {
        record.id = id;
    }

    ::log::info!("Found {} links in {}", records.len(), snapshot.page_url);

    ScanResult::links(
        records,
        snapshot.page_url.clone(),
        snapshot.page_title.clone(),
    )
}

/// Display label fallback chain: visible text, then title, then the URL itself
fn display_text(text: &str, title: &str, url: &str) -> String {
    let text = text.trim();
    if !text.is_empty() {
        return text.to_string();
    }
    let title = title.trim();
    if !title.is_empty() {
        return title.to_string();
    }
    url.to_string()
}

fn resolve(base: Option<&Url>, href: &str) -> Option<Url> {
    match base {
        Some(base) => base.join(href).ok(),
        None => Url::parse(href).ok(),
    }
}

/// Case-insensitive scheme prefix check on a raw href
fn has_scheme(href: &str, scheme: &str) -> bool {
    match href.get(..scheme.len() + 1) {
        Some(prefix) => {
            prefix.ends_with(':') && prefix[..scheme.len()].eq_ignore_ascii_case(scheme)
        }
        None => false,
    }
}
