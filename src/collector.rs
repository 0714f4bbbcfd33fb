//! The in-page half of the scanner.
//!
//! A single script installed into the page context. It only reads raw DOM
//! facts (geometry, computed-style flags, attributes, text runs) and applies
//! or reverts highlight styling; classification happens on the Rust side of
//! the boundary. Install is idempotent: a page-global marker flag makes a
//! repeat injection a no-op, so re-injecting over a scanner that is present
//! but was temporarily unresponsive never double-registers handlers. The
//! flag is never reset except by page navigation.

/// Installs the scanner into the page context. Safe to execute repeatedly.
pub const COLLECTOR_JS: &str = r#"
(function () {
    'use strict';

    if (window.__harvestScannerInstalled) {
        return;
    }
    window.__harvestScannerInstalled = true;

    var LOCATOR_MAX_DEPTH = 8;

    function styleFlags(el) {
        var style = window.getComputedStyle(el);
        return {
            displayNone: style.display === 'none',
            visibilityHidden: style.visibility === 'hidden',
            opacityZero: parseFloat(style.opacity) === 0
        };
    }

    function rectOf(el) {
        var rect = el.getBoundingClientRect();
        return { top: rect.top, left: rect.left, width: rect.width, height: rect.height };
    }

    function locatorFor(el) {
        var segments = [];
        var node = el;
        while (node && node.tagName) {
            var tag = node.tagName.toLowerCase();
            if (tag === 'body' || tag === 'html') {
                break;
            }
            var nth = 1;
            var sib = node.previousElementSibling;
            while (sib) {
                if (sib.tagName === node.tagName) {
                    nth += 1;
                }
                sib = sib.previousElementSibling;
            }
            segments.unshift(tag + ':nth-of-type(' + nth + ')');
            node = node.parentElement;
        }
        if (segments.length > LOCATOR_MAX_DEPTH) {
            return segments.slice(segments.length - LOCATOR_MAX_DEPTH).join(' > ');
        }
        return ['body'].concat(segments).join(' > ');
    }

    function elementFacts(el) {
        var flags = styleFlags(el);
        return {
            tag: el.tagName.toLowerCase(),
            locator: locatorFor(el),
            attached: document.contains(el),
            displayNone: flags.displayNone,
            visibilityHidden: flags.visibilityHidden,
            opacityZero: flags.opacityZero,
            rect: rectOf(el)
        };
    }

    function docBounds() {
        var body = document.body;
        var docEl = document.documentElement;
        return {
            documentHeight: Math.max(
                body.scrollHeight, body.offsetHeight,
                docEl.clientHeight, docEl.scrollHeight, docEl.offsetHeight
            ),
            documentWidth: Math.max(
                body.scrollWidth, body.offsetWidth,
                docEl.clientWidth, docEl.scrollWidth, docEl.offsetWidth
            ),
            viewportWidth: window.innerWidth || docEl.clientWidth,
            viewportHeight: window.innerHeight || docEl.clientHeight
        };
    }

    function captureSnapshot() {
        var anchors = [];
        document.querySelectorAll('a[href]').forEach(function (anchor) {
            anchors.push({
                element: elementFacts(anchor),
                href: anchor.getAttribute('href') || '',
                text: anchor.textContent || '',
                title: anchor.getAttribute('title') || ''
            });
        });

        var textRuns = [];
        var walker = document.createTreeWalker(document.body, NodeFilter.SHOW_TEXT, null);
        var node;
        while ((node = walker.nextNode())) {
            var content = node.textContent;
            if (!content || !content.trim()) {
                continue;
            }
            var parent = node.parentElement;
            if (!parent) {
                continue;
            }
            var parentTag = parent.tagName.toLowerCase();
            if (parentTag === 'script' || parentTag === 'style' ||
                parentTag === 'noscript' || parentTag === 'template') {
                continue;
            }
            textRuns.push({ text: content, element: elementFacts(parent) });
        }

        var fields = [];
        document.querySelectorAll('input, textarea').forEach(function (field) {
            fields.push({
                element: elementFacts(field),
                inputType: field.tagName.toLowerCase() === 'textarea'
                    ? 'textarea'
                    : (field.getAttribute('type') || 'text'),
                name: field.getAttribute('name') || '',
                id: field.getAttribute('id') || '',
                value: field.value || ''
            });
        });

        return {
            pageUrl: window.location.href,
            pageTitle: document.title,
            hostname: window.location.hostname,
            bounds: docBounds(),
            anchors: anchors,
            textRuns: textRuns,
            fields: fields
        };
    }

    function resolveTarget(locator) {
        if (!locator) {
            return null;
        }
        if (locator.kind === 'selector') {
            return document.querySelector(locator.selector);
        }
        if (locator.kind === 'anchorIndex') {
            var anchors = document.querySelectorAll('a[href]');
            return locator.index >= 0 && locator.index < anchors.length
                ? anchors[locator.index]
                : null;
        }
        return null;
    }

    // At most one highlight is active; a new one clears the previous first,
    // and the pending auto-revert timer goes with it.
    var highlight = { el: null, timer: null, saved: null };

    function clearHighlight() {
        if (highlight.timer !== null) {
            clearTimeout(highlight.timer);
            highlight.timer = null;
        }
        if (highlight.el !== null && highlight.saved !== null) {
            highlight.el.style.outline = highlight.saved.outline;
            highlight.el.style.backgroundColor = highlight.saved.backgroundColor;
            highlight.el.style.boxShadow = highlight.saved.boxShadow;
            highlight.el.style.borderRadius = highlight.saved.borderRadius;
            highlight.el.style.transition = highlight.saved.transition;
        }
        highlight.el = null;
        highlight.saved = null;
    }

    function applyHighlight(el, durationMs) {
        clearHighlight();
        highlight.el = el;
        highlight.saved = {
            outline: el.style.outline,
            backgroundColor: el.style.backgroundColor,
            boxShadow: el.style.boxShadow,
            borderRadius: el.style.borderRadius,
            transition: el.style.transition
        };
        el.style.transition = 'all 0.3s ease';
        el.style.outline = '3px solid #ff6b6b';
        el.style.backgroundColor = 'rgba(255, 107, 107, 0.15)';
        el.style.boxShadow = '0 0 15px rgba(255, 107, 107, 0.5)';
        el.style.borderRadius = '4px';
        el.scrollIntoView({ behavior: 'smooth', block: 'center', inline: 'nearest' });
        highlight.timer = setTimeout(clearHighlight, durationMs);
    }

    window.__harvestScanner = {
        handle: function (request) {
            try {
                switch (request && request.action) {
                    case 'ping':
                        return {
                            success: true,
                            data: {
                                ready: document.readyState !== 'loading',
                                readyState: document.readyState
                            }
                        };
                    case 'captureSnapshot':
                        return { success: true, data: captureSnapshot() };
                    case 'resolveElement': {
                        var found = resolveTarget(request.locator);
                        if (!found) {
                            return { success: false, error: 'element not found' };
                        }
                        return {
                            success: true,
                            data: { element: elementFacts(found), bounds: docBounds() }
                        };
                    }
                    case 'applyHighlight': {
                        var target = resolveTarget(request.locator);
                        if (!target) {
                            return { success: false, error: 'element not found' };
                        }
                        applyHighlight(target, request.durationMs || 4000);
                        return { success: true };
                    }
                    case 'clearHighlights':
                        clearHighlight();
                        return { success: true };
                    default:
                        return {
                            success: false,
                            error: 'unknown action: ' + (request && request.action)
                        };
                }
            } catch (e) {
                return { success: false, error: String((e && e.message) || e) };
            }
        }
    };

    window.__harvestScannerReady = true;
})();
"#;

/// Dispatch shim executed for every request. Reports a sentinel error when
/// the scanner is not installed so the messenger can tell "no receiver"
/// apart from a scanner-side failure.
pub const DISPATCH_JS: &str = r#"
if (!window.__harvestScanner) {
    return { success: false, error: 'scanner-not-installed' };
}
return window.__harvestScanner.handle(arguments[0]);
"#;
