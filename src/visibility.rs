//! Reachability-by-scroll visibility predicate.
//!
//! "Visible" means the user could scroll the element into view, not that it
//! is currently painted in the viewport: highlight requests scroll to their
//! target, so an element below the fold still counts. Only elements hidden
//! by CSS, collapsed to zero size, or outside the document's scrollable
//! bounds are unreachable.

use crate::snapshot::{DocumentBounds, ElementFacts};

/// Whether an element is reachable by scrolling.
///
/// Conditions are checked in order, short-circuiting on the first failure.
/// Never panics; absent facts (the deserialization defaults) evaluate false.
pub fn is_visible(element: &ElementFacts, bounds: &DocumentBounds) -> bool {
    if !element.attached {
        return false;
    }

    if element.display_none || element.visibility_hidden || element.opacity_zero {
        return false;
    }

    let rect = &element.rect;
    if rect.width == 0.0 || rect.height == 0.0 {
        return false;
    }

    // Within the document's scrollable extent, even if below the fold.
    rect.top < bounds.document_height
        && rect.bottom() > 0.0
        && rect.left < bounds.viewport_width
        && rect.right() > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::Rect;

    fn bounds() -> DocumentBounds {
        DocumentBounds {
            document_height: 5000.0,
            document_width: 1280.0,
            viewport_width: 1280.0,
            viewport_height: 720.0,
        }
    }

    fn visible_element() -> ElementFacts {
        ElementFacts {
            tag: "a".to_string(),
            locator: "body > a:nth-of-type(1)".to_string(),
            attached: true,
            display_none: false,
            visibility_hidden: false,
            opacity_zero: false,
            rect: Rect {
                top: 100.0,
                left: 10.0,
                width: 120.0,
                height: 16.0,
            },
        }
    }

    #[test]
    fn test_plain_element_is_visible() {
        assert!(is_visible(&visible_element(), &bounds()));
    }

    #[test]
    fn test_detached_element_is_not_visible() {
        let el = ElementFacts {
            attached: false,
            ..visible_element()
        };
        assert!(!is_visible(&el, &bounds()));
    }

    #[test]
    fn test_display_none_is_not_visible() {
        let el = ElementFacts {
            display_none: true,
            ..visible_element()
        };
        assert!(!is_visible(&el, &bounds()));
    }

    #[test]
    fn test_hidden_or_transparent_is_not_visible() {
        let hidden = ElementFacts {
            visibility_hidden: true,
            ..visible_element()
        };
        let transparent = ElementFacts {
            opacity_zero: true,
            ..visible_element()
        };
        assert!(!is_visible(&hidden, &bounds()));
        assert!(!is_visible(&transparent, &bounds()));
    }

    #[test]
    fn test_zero_size_is_not_visible() {
        let mut el = visible_element();
        el.rect.width = 0.0;
        assert!(!is_visible(&el, &bounds()));

        let mut el = visible_element();
        el.rect.height = 0.0;
        assert!(!is_visible(&el, &bounds()));
    }

    #[test]
    fn test_below_the_fold_is_still_visible() {
        let mut el = visible_element();
        el.rect.top = 3000.0;
        assert!(is_visible(&el, &bounds()), "reachable by scrolling");
    }

    #[test]
    fn test_past_document_end_is_not_visible() {
        let mut el = visible_element();
        el.rect.top = 6000.0;
        assert!(!is_visible(&el, &bounds()));
    }

    #[test]
    fn test_fully_off_left_edge_is_not_visible() {
        let mut el = visible_element();
        el.rect.left = -500.0;
        el.rect.width = 100.0;
        assert!(!is_visible(&el, &bounds()));
    }

    #[test]
    fn test_default_facts_are_not_visible() {
        assert!(!is_visible(&ElementFacts::default(), &bounds()));
    }
}
