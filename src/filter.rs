use crate::records::{EmailRecord, LinkRecord};
use serde::{Deserialize, Serialize};

/// Configuration for filtering scan results into a view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewFilter {
    /// Case-insensitive substring matched against URL/text (links) or
    /// address/context (emails); empty matches everything
    #[serde(default)]
    pub query: String,

    /// Whether same-host links are shown
    #[serde(default = "default_show")]
    pub show_internal: bool,

    /// Whether cross-host links are shown
    #[serde(default = "default_show")]
    pub show_external: bool,

    /// Restrict the view to records reachable by scrolling
    #[serde(default)]
    pub visible_only: bool,
}

/// Default value for the show_internal/show_external toggles
fn default_show() -> bool {
    true
}

impl Default for ViewFilter {
    fn default() -> Self {
        Self {
            query: String::new(),
            show_internal: true,
            show_external: true,
            visible_only: false,
        }
    }
}

impl ViewFilter {
    /// Whether a link record passes the current filter
    pub fn matches_link(&self, record: &LinkRecord) -> bool {
        let origin_shown = if record.is_external {
            self.show_external
        } else {
            self.show_internal
        };
        if !origin_shown {
            return false;
        }

        if self.visible_only && !record.is_visible {
            return false;
        }

        self.query_matches(&[&record.url, &record.text])
    }

    /// Whether an email record passes the current filter
    ///
    /// The internal/external toggles only apply to links.
    pub fn matches_email(&self, record: &EmailRecord) -> bool {
        if self.visible_only && !record.is_visible {
            return false;
        }

        self.query_matches(&[&record.email, &record.context])
    }

    fn query_matches(&self, haystacks: &[&str]) -> bool {
        if self.query.is_empty() {
            return true;
        }
        let needle = self.query.to_lowercase();
        haystacks
            .iter()
            .any(|hay| hay.to_lowercase().contains(&needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::EmailSource;

    fn link(url: &str, text: &str, external: bool, visible: bool) -> LinkRecord {
        LinkRecord {
            id: 0,
            url: url.to_string(),
            text: text.to_string(),
            title: String::new(),
            is_external: external,
            domain: String::new(),
            is_visible: visible,
            locator: String::new(),
        }
    }

    #[test]
    fn test_default_filter_matches_everything() {
        let filter = ViewFilter::default();
        assert!(filter.matches_link(&link("https://a.com/x", "x", true, false)));
        assert!(filter.matches_link(&link("https://a.com/y", "y", false, true)));
    }

    #[test]
    fn test_origin_toggles() {
        let filter = ViewFilter {
            show_external: false,
            ..ViewFilter::default()
        };
        assert!(!filter.matches_link(&link("https://b.com/", "b", true, true)));
        assert!(filter.matches_link(&link("https://a.com/", "a", false, true)));
    }

    #[test]
    fn test_query_matches_url_or_text_case_insensitively() {
        let filter = ViewFilter {
            query: "DOCS".to_string(),
            ..ViewFilter::default()
        };
        assert!(filter.matches_link(&link("https://a.com/docs/intro", "intro", false, true)));
        assert!(filter.matches_link(&link("https://a.com/x", "Read the Docs", false, true)));
        assert!(!filter.matches_link(&link("https://a.com/blog", "blog", false, true)));
    }

    #[test]
    fn test_visible_only() {
        let filter = ViewFilter {
            visible_only: true,
            ..ViewFilter::default()
        };
        assert!(!filter.matches_link(&link("https://a.com/", "a", false, false)));
        assert!(filter.matches_link(&link("https://a.com/", "a", false, true)));
    }

    #[test]
    fn test_email_filtering_ignores_origin_toggles() {
        let filter = ViewFilter {
            show_internal: false,
            show_external: false,
            query: "sales".to_string(),
            ..ViewFilter::default()
        };
        let record = EmailRecord {
            id: 0,
            email: "sales@example.com".to_string(),
            source: EmailSource::Mailto,
            is_visible: true,
            context: "Talk to sales".to_string(),
            domain: "example.com".to_string(),
        };
        assert!(filter.matches_email(&record));
    }
}
