//! Directive detection in backend output
//!
//! Backends embed side-effect requests inside free text. The text is
//! scanned, never parsed as a whole, and is shown to the user unchanged.

use std::sync::LazyLock;

use regex::Regex;

/// `{"camera": "<digit>"}`
static CAMERA_DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\{"camera"\s*:\s*"([0-9])"\}"#).expect("valid regex"));

/// `{"Online search": "<query without double quotes>"}`
static SEARCH_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{"Online search"\s*:\s*"([^"]+)"\}"#).expect("valid regex")
});

/// A side-effect request found in backend output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Capture and analyze from the camera with this index
    Camera(u8),
    /// Run a web search for this query
    Search(String),
}

/// Find the directive to act on, if any
///
/// Camera directives win over search directives regardless of position;
/// only the first match of the winning kind is returned.
#[must_use]
pub fn scan(text: &str) -> Option<Directive> {
    if let Some(index) = CAMERA_DIRECTIVE
        .captures(text)
        .and_then(|caps| caps[1].parse::<u8>().ok())
    {
        tracing::debug!(camera = index, "found camera directive");
        return Some(Directive::Camera(index));
    }

    SEARCH_DIRECTIVE.captures(text).map(|caps| {
        let query = caps[1].to_string();
        tracing::debug!(query = %query, "found search directive");
        Directive::Search(query)
    })
}
