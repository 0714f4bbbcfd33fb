//! A harvesting session against one live page.
//!
//! `PageSession` is the coordinator: it issues typed requests through the
//! messenger, runs the discovery engines over the returned snapshot, and
//! keeps the result store consistent. Scans never overlap (an in-progress
//! scan makes new scan requests fail fast) and the in-progress flag is
//! reset on every completion path, so no error can leave the session stuck.

use crate::config::HarvesterConfig;
use crate::error::{HarvestError, Result};
use crate::messenger::{Messenger, ScannerTransport};
use crate::protocol::{ElementLocator, ProbeRequest, ResolvedElement};
use crate::records::{EmailRecord, LinkRecord, ScanResult};
use crate::scan::emails::EmailScanner;
use crate::scan::links;
use crate::snapshot::DocumentSnapshot;
use crate::store::ResultStore;
use crate::visibility::is_visible;
use tokio::time::timeout;
use url::Url;

/// Browser-internal schemes the scanner cannot run on
const RESTRICTED_SCHEMES: [&str; 5] = [
    "chrome",
    "chrome-extension",
    "edge",
    "about",
    "moz-extension",
];

/// One page's coordinator state: messenger, result store, discovery engines
pub struct PageSession<T: ScannerTransport> {
    messenger: Messenger<T>,
    store: ResultStore,
    email_scanner: EmailScanner,
    page_url: Option<Url>,
}

impl<T: ScannerTransport> PageSession<T> {
    pub fn with_transport(transport: T, config: HarvesterConfig) -> Self {
        Self {
            messenger: Messenger::new(transport, config),
            store: ResultStore::new(),
            email_scanner: EmailScanner::new(),
            page_url: None,
        }
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ResultStore {
        &mut self.store
    }

    /// Records the page the session is pointed at, for the restricted-page
    /// guard. `goto` does this automatically.
    pub fn set_page_url(&mut self, url: Url) {
        self.page_url = Some(url);
    }

    /// Scans the page for links and stores the result.
    pub async fn extract_links(&mut self) -> Result<ScanResult<LinkRecord>> {
        if !self.store.begin_extraction() {
            return Err(HarvestError::ExtractionInProgress);
        }

        let outcome = timeout(
            self.messenger.config().scan_timeout(),
            self.capture_snapshot(),
        )
        .await;

        // Whatever happened above, the in-progress flag comes back down.
        self.store.finish_extraction();

        let snapshot = match outcome {
            Ok(captured) => captured?,
            Err(_) => return Err(HarvestError::ScanTimeout),
        };

        let result = links::discover(&snapshot);
        self.store.set_links(result.clone());
        Ok(result)
    }

    /// Scans the page for email addresses and stores the result.
    pub async fn extract_emails(&mut self) -> Result<ScanResult<EmailRecord>> {
        if !self.store.begin_extraction() {
            return Err(HarvestError::ExtractionInProgress);
        }

        let outcome = timeout(
            self.messenger.config().scan_timeout(),
            self.capture_snapshot(),
        )
        .await;

        self.store.finish_extraction();

        let snapshot = match outcome {
            Ok(captured) => captured?,
            Err(_) => return Err(HarvestError::ScanTimeout),
        };

        let result = self.email_scanner.discover(&snapshot);
        self.store.set_emails(result.clone());
        Ok(result)
    }

    async fn capture_snapshot(&self) -> Result<DocumentSnapshot> {
        self.check_restricted()?;
        self.messenger.wait_for_ready().await?;
        let data = self.messenger.send(&ProbeRequest::CaptureSnapshot).await?;
        let snapshot = serde_json::from_value(data)?;
        Ok(snapshot)
    }

    fn check_restricted(&self) -> Result<()> {
        if let Some(url) = &self.page_url {
            if RESTRICTED_SCHEMES.contains(&url.scheme()) {
                return Err(HarvestError::RestrictedPage);
            }
        }
        Ok(())
    }

    /// Highlights a link from the last scan by its record id.
    ///
    /// The structural locator is authoritative; if it no longer resolves
    /// (the DOM changed since the scan), the record id doubles as a
    /// positional fallback into a fresh anchor query.
    pub async fn highlight_link(&mut self, id: usize) -> Result<()> {
        let selector = self
            .store
            .link_by_id(id)
            .ok_or(HarvestError::LinkNotFound(id))?
            .locator
            .clone();

        match self
            .highlight_locator(ElementLocator::Selector { selector })
            .await
        {
            Err(HarvestError::Scanner(reason)) if reason.contains("not found") => {
                ::log::debug!(
                    "Structural locator for link {} no longer resolves, trying by index",
                    id
                );
                self.highlight_locator(ElementLocator::AnchorIndex { index: id })
                    .await
            }
            settled => settled,
        }
    }

    /// Highlights an arbitrary element by CSS selector.
    pub async fn highlight_element(&mut self, selector: &str) -> Result<()> {
        self.highlight_locator(ElementLocator::Selector {
            selector: selector.to_string(),
        })
        .await
    }

    async fn highlight_locator(&self, locator: ElementLocator) -> Result<()> {
        // Re-locate fresh on every call; elements are never cached across
        // requests since the DOM may have mutated.
        let data = self
            .messenger
            .send(&ProbeRequest::ResolveElement {
                locator: locator.clone(),
            })
            .await?;
        let resolved: ResolvedElement = serde_json::from_value(data)?;

        if !is_visible(&resolved.element, &resolved.bounds) {
            return Err(HarvestError::Highlight(
                "link is not visible on the page".to_string(),
            ));
        }

        self.messenger
            .send(&ProbeRequest::ApplyHighlight {
                locator,
                duration_ms: self.messenger.config().highlight_duration_ms,
            })
            .await?;
        Ok(())
    }

    /// Reverts any applied highlight and cancels its pending auto-revert.
    pub async fn clear_highlights(&self) -> Result<()> {
        self.messenger.send(&ProbeRequest::ClearHighlights).await?;
        Ok(())
    }
}

impl PageSession<fantoccini::Client> {
    /// Navigates the browser to a page, refusing browser-internal URLs.
    pub async fn goto(&mut self, url: &str) -> Result<()> {
        let parsed = Url::parse(url)
            .map_err(|e| HarvestError::Command(format!("invalid URL {url}: {e}")))?;
        if RESTRICTED_SCHEMES.contains(&parsed.scheme()) {
            return Err(HarvestError::RestrictedPage);
        }

        self.messenger
            .transport()
            .goto(url)
            .await
            .map_err(|e| HarvestError::Command(e.to_string()))?;
        self.page_url = Some(parsed);
        ::log::info!("Navigated to {}", url);
        Ok(())
    }

    /// Ends the WebDriver session.
    pub async fn close(self) -> Result<()> {
        self.messenger
            .into_transport()
            .close()
            .await
            .map_err(|e| HarvestError::Command(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messenger::TransportError;
    use crate::snapshot;
    use serde_json::{Value, json};
    use std::sync::Mutex;

    /// Plays a page: answers protocol actions from a canned snapshot.
    struct ScriptedPage {
        snapshot: Value,
        resolve_response: Value,
        capture_fails: bool,
        log: Mutex<Vec<String>>,
    }

    impl ScriptedPage {
        fn from_html(html: &str, page_url: &str) -> Self {
            let snap = snapshot::from_html(html, page_url);
            Self {
                snapshot: serde_json::to_value(&snap).unwrap(),
                resolve_response: json!({"success": false, "error": "element not found"}),
                capture_fails: false,
                log: Mutex::new(Vec::new()),
            }
        }

        fn with_resolved(mut self, element: Value, bounds: Value) -> Self {
            self.resolve_response =
                json!({"success": true, "data": {"element": element, "bounds": bounds}});
            self
        }

        fn actions(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }
    }

    impl ScannerTransport for ScriptedPage {
        async fn run_script(
            &self,
            _script: &str,
            args: Vec<Value>,
        ) -> std::result::Result<Value, TransportError> {
            let action = args
                .first()
                .and_then(|a| a["action"].as_str())
                .unwrap_or("install")
                .to_string();
            self.log.lock().unwrap().push(action.clone());

            Ok(match action.as_str() {
                "ping" => {
                    json!({"success": true, "data": {"ready": true, "readyState": "complete"}})
                }
                "captureSnapshot" => {
                    if self.capture_fails {
                        json!({"success": false, "error": "snapshot capture blew up"})
                    } else {
                        json!({"success": true, "data": self.snapshot.clone()})
                    }
                }
                "resolveElement" => self.resolve_response.clone(),
                "applyHighlight" | "clearHighlights" => json!({"success": true}),
                _ => Value::Null,
            })
        }
    }

    fn session(page: ScriptedPage) -> PageSession<ScriptedPage> {
        let config = HarvesterConfig {
            retry_base_ms: 1,
            injection_settle_ms: 1,
            ..HarvesterConfig::default()
        };
        PageSession::with_transport(page, config)
    }

    #[tokio::test]
    async fn test_extract_links_updates_store() {
        let page = ScriptedPage::from_html(
            r#"<html><body>
               <a href="/about">About</a>
               <a href="https://other.example/x">Other</a>
               <a href="javascript:void(0)">Click</a>
               </body></html>"#,
            "https://example.com/page",
        );
        let mut session = session(page);

        let result = session.extract_links().await.unwrap();
        assert_eq!(result.records.len(), 2);
        assert!(!session.store().is_extracting());
        assert_eq!(session.store().links().unwrap().counts.external, Some(1));
    }

    #[tokio::test]
    async fn test_extract_emails_updates_store() {
        let page = ScriptedPage::from_html(
            r#"<html><body><p>write hello@example.com today</p></body></html>"#,
            "https://example.com/",
        );
        let mut session = session(page);

        let result = session.extract_emails().await.unwrap();
        assert_eq!(result.records.len(), 1);
        assert_eq!(session.store().emails().unwrap().counts.total, 1);
    }

    #[tokio::test]
    async fn test_failed_scan_resets_in_progress_flag() {
        let mut page = ScriptedPage::from_html("<html><body></body></html>", "https://e.com/");
        page.capture_fails = true;
        let mut session = session(page);

        let err = session.extract_links().await.unwrap_err();
        assert!(matches!(err, HarvestError::Scanner(_)));
        assert!(!session.store().is_extracting());
    }

    #[tokio::test]
    async fn test_restricted_page_is_refused_before_any_round_trip() {
        let page = ScriptedPage::from_html("<html><body></body></html>", "https://e.com/");
        let mut session = session(page);
        session.set_page_url(Url::parse("chrome://settings/").unwrap());

        let err = session.extract_links().await.unwrap_err();
        assert!(matches!(err, HarvestError::RestrictedPage));
        assert!(!session.store().is_extracting());
        assert!(session.messenger.transport().actions().is_empty());
    }

    #[tokio::test]
    async fn test_highlight_unknown_id() {
        let page = ScriptedPage::from_html("<html><body></body></html>", "https://e.com/");
        let mut session = session(page);

        let err = session.highlight_link(9).await.unwrap_err();
        assert!(matches!(err, HarvestError::LinkNotFound(9)));
    }

    #[tokio::test]
    async fn test_highlight_hidden_target_fails_without_styling() {
        let html = r#"<html><body><a href="/x">x</a></body></html>"#;
        let hidden_element = json!({
            "tag": "a",
            "locator": "body > a:nth-of-type(1)",
            "attached": true,
            "displayNone": true,
            "rect": {"top": 0.0, "left": 0.0, "width": 100.0, "height": 16.0}
        });
        let bounds = json!({
            "documentHeight": 600.0, "documentWidth": 1280.0,
            "viewportWidth": 1280.0, "viewportHeight": 720.0
        });
        let page =
            ScriptedPage::from_html(html, "https://e.com/").with_resolved(hidden_element, bounds);
        let mut session = session(page);

        session.extract_links().await.unwrap();
        let err = session.highlight_link(0).await.unwrap_err();
        assert!(err.to_string().contains("not visible"));

        let actions = session.messenger.transport().actions();
        assert!(!actions.iter().any(|a| a == "applyHighlight"));
    }

    #[tokio::test]
    async fn test_highlight_visible_target_applies_styling() {
        let html = r#"<html><body><a href="/x">x</a></body></html>"#;
        let element = json!({
            "tag": "a",
            "locator": "body > a:nth-of-type(1)",
            "attached": true,
            "rect": {"top": 40.0, "left": 0.0, "width": 100.0, "height": 16.0}
        });
        let bounds = json!({
            "documentHeight": 600.0, "documentWidth": 1280.0,
            "viewportWidth": 1280.0, "viewportHeight": 720.0
        });
        let page = ScriptedPage::from_html(html, "https://e.com/").with_resolved(element, bounds);
        let mut session = session(page);

        session.extract_links().await.unwrap();
        session.highlight_link(0).await.unwrap();

        let actions = session.messenger.transport().actions();
        assert!(actions.iter().any(|a| a == "applyHighlight"));
    }

    #[tokio::test]
    async fn test_clear_highlights() {
        let page = ScriptedPage::from_html("<html><body></body></html>", "https://e.com/");
        let session = session(page);
        session.clear_highlights().await.unwrap();
    }
}
