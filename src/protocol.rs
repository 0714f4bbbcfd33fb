//! Typed messages exchanged with the in-page scanner.
//!
//! Every request action has exactly one response shape, and every payload is
//! JSON-serializable: the messaging boundary is a serialization boundary, so
//! raw platform errors never cross it. Scanner-side failures always arrive
//! as `{success: false, error}`.

use crate::error::{HarvestError, Result};
use crate::snapshot::{DocumentBounds, ElementFacts};
use serde::{Deserialize, Serialize};

/// Error string the dispatch shim returns when the scanner is not installed.
/// Treated as a transient "no receiver" failure, not a scanner error.
pub const SCANNER_MISSING: &str = "scanner-not-installed";

/// A re-resolvable reference to a DOM element.
///
/// Element references cannot cross the messaging boundary; the structural
/// selector is authoritative and the anchor index is a fallback only (it is
/// fragile once the DOM has mutated between scan and highlight).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ElementLocator {
    /// Structural CSS path generated at scan time
    Selector { selector: String },
    /// Positional index into a fresh `a[href]` query
    AnchorIndex { index: usize },
}

/// Requests sent to the in-page scanner
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ProbeRequest {
    /// Readiness check; also reports the document's load state
    Ping,
    /// Capture the full document snapshot
    CaptureSnapshot,
    /// Re-find an element and report its current facts
    ResolveElement { locator: ElementLocator },
    /// Style and scroll to an element, auto-reverting after the duration
    ApplyHighlight {
        locator: ElementLocator,
        duration_ms: u64,
    },
    /// Revert any applied highlight immediately
    ClearHighlights,
}

/// Envelope every scanner response arrives in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeResponse {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProbeResponse {
    /// Unwraps the envelope into the payload or a scanner error
    pub fn into_data(self) -> Result<serde_json::Value> {
        if self.success {
            Ok(self.data.unwrap_or(serde_json::Value::Null))
        } else {
            Err(HarvestError::Scanner(
                self.error.unwrap_or_else(|| "unknown scanner error".to_string()),
            ))
        }
    }

    /// True when this is the dispatch shim's "no receiver" sentinel
    pub fn is_scanner_missing(&self) -> bool {
        !self.success && self.error.as_deref() == Some(SCANNER_MISSING)
    }
}

/// Payload of a `ping` response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PingStatus {
    /// Whether the document has finished loading
    #[serde(default)]
    pub ready: bool,

    /// The raw `document.readyState` value
    #[serde(default)]
    pub ready_state: String,
}

/// Payload of a `resolveElement` response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedElement {
    pub element: ElementFacts,

    #[serde(default)]
    pub bounds: DocumentBounds,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_action_tags() {
        let ping = serde_json::to_value(&ProbeRequest::Ping).unwrap();
        assert_eq!(ping["action"], "ping");

        let capture = serde_json::to_value(&ProbeRequest::CaptureSnapshot).unwrap();
        assert_eq!(capture["action"], "captureSnapshot");

        let clear = serde_json::to_value(&ProbeRequest::ClearHighlights).unwrap();
        assert_eq!(clear["action"], "clearHighlights");
    }

    #[test]
    fn test_highlight_request_fields_are_camel_case() {
        let request = ProbeRequest::ApplyHighlight {
            locator: ElementLocator::Selector {
                selector: "body > a:nth-of-type(2)".to_string(),
            },
            duration_ms: 4000,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["action"], "applyHighlight");
        assert_eq!(value["durationMs"], 4000);
        assert_eq!(value["locator"]["kind"], "selector");
    }

    #[test]
    fn test_anchor_index_locator() {
        let locator = ElementLocator::AnchorIndex { index: 3 };
        let value = serde_json::to_value(&locator).unwrap();
        assert_eq!(value["kind"], "anchorIndex");
        assert_eq!(value["index"], 3);

        let roundtrip: ElementLocator = serde_json::from_value(value).unwrap();
        assert_eq!(roundtrip, locator);
    }

    #[test]
    fn test_failure_envelope_becomes_scanner_error() {
        let response: ProbeResponse =
            serde_json::from_str(r#"{"success": false, "error": "element not found"}"#).unwrap();
        let err = response.into_data().unwrap_err();
        assert!(err.to_string().contains("element not found"));
    }

    #[test]
    fn test_missing_scanner_sentinel() {
        let response: ProbeResponse =
            serde_json::from_str(r#"{"success": false, "error": "scanner-not-installed"}"#)
                .unwrap();
        assert!(response.is_scanner_missing());
    }

    #[test]
    fn test_success_envelope_yields_data() {
        let response: ProbeResponse =
            serde_json::from_str(r#"{"success": true, "data": {"ready": true}}"#).unwrap();
        let data = response.into_data().unwrap();
        let status: PingStatus = serde_json::from_value(data).unwrap();
        assert!(status.ready);
    }
}
