//! Serialized document facts.
//!
//! DOM elements cannot cross the messaging boundary, so the in-page collector
//! reports raw facts (geometry, style flags, attributes, text runs) and the
//! coordinator side classifies them. `from_html` builds the same snapshot
//! shape from static markup for offline runs and tests; hiding styles are
//! honored, geometry is synthesized from document order.

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use url::Url;

/// Maximum number of path segments in a generated structural locator
const LOCATOR_MAX_DEPTH: usize = 8;

/// Bounding rectangle of an element, viewport-relative
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }
}

/// Total scrollable extent of the document plus the viewport dimensions
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentBounds {
    pub document_height: f64,
    pub document_width: f64,
    pub viewport_width: f64,
    pub viewport_height: f64,
}

/// Raw facts about one element, as reported by the collector
///
/// Every field defaults on deserialization so a partial payload degrades to
/// "not visible" rather than failing the whole snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementFacts {
    #[serde(default)]
    pub tag: String,

    /// Structural locator (tag-path with nth-of-type, capped depth)
    #[serde(default)]
    pub locator: String,

    /// Whether the element is contained in the live document
    #[serde(default)]
    pub attached: bool,

    #[serde(default)]
    pub display_none: bool,

    #[serde(default)]
    pub visibility_hidden: bool,

    #[serde(default)]
    pub opacity_zero: bool,

    #[serde(default)]
    pub rect: Rect,
}

/// An anchor element carrying an href
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorFacts {
    pub element: ElementFacts,

    /// The raw href attribute value
    #[serde(default)]
    pub href: String,

    /// Full text content of the anchor
    #[serde(default)]
    pub text: String,

    /// Title attribute, empty if absent
    #[serde(default)]
    pub title: String,
}

/// One text node's content together with its containing element's facts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRun {
    #[serde(default)]
    pub text: String,

    pub element: ElementFacts,
}

/// An input or textarea field
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldFacts {
    pub element: ElementFacts,

    /// The input's type attribute ("text" when absent, "textarea" for textareas)
    #[serde(default)]
    pub input_type: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub id: String,

    /// Current value of the field
    #[serde(default)]
    pub value: String,
}

/// Everything the scanner reads from the document in one capture
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSnapshot {
    #[serde(default)]
    pub page_url: String,

    #[serde(default)]
    pub page_title: String,

    /// The page's own hostname, used for internal/external classification
    #[serde(default)]
    pub hostname: String,

    #[serde(default)]
    pub bounds: DocumentBounds,

    #[serde(default)]
    pub anchors: Vec<AnchorFacts>,

    #[serde(default)]
    pub text_runs: Vec<TextRun>,

    #[serde(default)]
    pub fields: Vec<FieldFacts>,
}

/// Builds a snapshot from static HTML.
///
/// Inline `display:none`, `visibility:hidden` and `opacity:0` styles and the
/// `hidden` attribute are honored (including inheritance from ancestors);
/// geometry is synthesized from document order so everything else evaluates
/// as reachable.
pub fn from_html(html: &str, page_url: &str) -> DocumentSnapshot {
    let doc = Html::parse_document(html);

    let hostname = Url::parse(page_url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default();

    let page_title = select_first(&doc, "title")
        .map(|t| t.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    let mut anchors = Vec::new();
    let mut text_runs = Vec::new();
    let mut fields = Vec::new();
    let mut element_count = 0usize;

    if let Some(body) = select_first(&doc, "body") {
        // First pass: document-order index per element, for synthetic geometry.
        let mut orders = HashMap::new();
        for node in body.descendants() {
            if ElementRef::wrap(node).is_some() {
                orders.insert(node.id(), orders.len());
            }
        }
        element_count = orders.len();

        for node in body.descendants() {
            if let Some(el) = ElementRef::wrap(node) {
                let tag = el.value().name().to_ascii_lowercase();
                match tag.as_str() {
                    "a" => {
                        if let Some(href) = el.value().attr("href") {
                            anchors.push(AnchorFacts {
                                element: element_facts(el, orders[&node.id()]),
                                href: href.to_string(),
                                text: el.text().collect::<String>(),
                                title: el.value().attr("title").unwrap_or("").to_string(),
                            });
                        }
                    }
                    "input" => fields.push(FieldFacts {
                        element: element_facts(el, orders[&node.id()]),
                        input_type: el.value().attr("type").unwrap_or("text").to_string(),
                        name: el.value().attr("name").unwrap_or("").to_string(),
                        id: el.value().attr("id").unwrap_or("").to_string(),
                        value: el.value().attr("value").unwrap_or("").to_string(),
                    }),
                    "textarea" => fields.push(FieldFacts {
                        element: element_facts(el, orders[&node.id()]),
                        input_type: "textarea".to_string(),
                        name: el.value().attr("name").unwrap_or("").to_string(),
                        id: el.value().attr("id").unwrap_or("").to_string(),
                        value: el.text().collect::<String>(),
                    }),
                    _ => {}
                }
            } else if let Some(text) = node.value().as_text() {
                if text.trim().is_empty() {
                    continue;
                }
                let Some(parent) = node.parent().and_then(ElementRef::wrap) else {
                    continue;
                };
                let parent_tag = parent.value().name().to_ascii_lowercase();
                if matches!(parent_tag.as_str(), "script" | "style" | "noscript" | "template") {
                    continue;
                }
                text_runs.push(TextRun {
                    text: text.to_string(),
                    element: element_facts(parent, orders[&parent.id()]),
                });
            }
        }
    }

    DocumentSnapshot {
        page_url: page_url.to_string(),
        page_title,
        hostname,
        bounds: synthetic_bounds(element_count),
        anchors,
        text_runs,
        fields,
    }
}

fn select_first<'a>(doc: &'a Html, selector: &str) -> Option<ElementRef<'a>> {
    let sel = Selector::parse(selector).ok()?;
    doc.select(&sel).next()
}

fn synthetic_bounds(element_count: usize) -> DocumentBounds {
    DocumentBounds {
        document_height: 600f64.max((element_count * 20 + 40) as f64),
        document_width: 1280.0,
        viewport_width: 1280.0,
        viewport_height: 720.0,
    }
}

fn element_facts(el: ElementRef<'_>, order: usize) -> ElementFacts {
    let (display_none, visibility_hidden, opacity_zero) = effective_style_flags(el);
    ElementFacts {
        tag: el.value().name().to_ascii_lowercase(),
        locator: locator_for(el),
        attached: true,
        display_none,
        visibility_hidden,
        opacity_zero,
        rect: Rect {
            top: (order * 20) as f64,
            left: 0.0,
            width: 120.0,
            height: 16.0,
        },
    }
}

/// Hiding flags for an element, including flags inherited from ancestors
/// (a child of a `display:none` container is itself unreachable).
fn effective_style_flags(el: ElementRef<'_>) -> (bool, bool, bool) {
    let mut display_none = false;
    let mut visibility_hidden = false;
    let mut opacity_zero = false;

    let mut node = Some(*el);
    while let Some(current) = node {
        if let Some(current_el) = ElementRef::wrap(current) {
            if current_el.value().attr("hidden").is_some() {
                display_none = true;
            }
            if let Some(style) = current_el.value().attr("style") {
                let (d, v, o) = inline_style_flags(style);
                display_none |= d;
                visibility_hidden |= v;
                opacity_zero |= o;
            }
        }
        node = current.parent();
    }

    (display_none, visibility_hidden, opacity_zero)
}

fn inline_style_flags(style: &str) -> (bool, bool, bool) {
    let mut display_none = false;
    let mut visibility_hidden = false;
    let mut opacity_zero = false;

    for decl in style.split(';') {
        let Some((prop, value)) = decl.split_once(':') else {
            continue;
        };
        let prop = prop.trim().to_ascii_lowercase();
        let value = value.trim().to_ascii_lowercase();
        match prop.as_str() {
            "display" if value == "none" => display_none = true,
            "visibility" if value == "hidden" => visibility_hidden = true,
            "opacity" => {
                if value.parse::<f64>().map(|o| o == 0.0).unwrap_or(false) {
                    opacity_zero = true;
                }
            }
            _ => {}
        }
    }

    (display_none, visibility_hidden, opacity_zero)
}

/// Structural locator: child-combinator tag path with nth-of-type, rooted at
/// body, truncated from the top past `LOCATOR_MAX_DEPTH` segments.
fn locator_for(el: ElementRef<'_>) -> String {
    let mut segments = Vec::new();
    let mut node = Some(*el);

    while let Some(current) = node {
        let Some(current_el) = ElementRef::wrap(current) else {
            break;
        };
        let tag = current_el.value().name().to_ascii_lowercase();
        if tag == "body" || tag == "html" {
            break;
        }
        let nth = 1 + current
            .prev_siblings()
            .filter(|sib| {
                ElementRef::wrap(*sib)
                    .map(|e| e.value().name().eq_ignore_ascii_case(&tag))
                    .unwrap_or(false)
            })
            .count();
        segments.push(format!("{tag}:nth-of-type({nth})"));
        node = current.parent();
    }

    segments.reverse();
    if segments.len() > LOCATOR_MAX_DEPTH {
        segments.drain(..segments.len() - LOCATOR_MAX_DEPTH);
        segments.join(" > ")
    } else {
        let mut path = vec!["body".to_string()];
        path.extend(segments);
        path.join(" > ")
    }
}
