//! HTML parser for extracting links and metadata
//!
//! This module handles parsing HTML content to extract:
//! - Anchor links with their visible text and title attribute
//! - Page title and author
//! - A meta-refresh redirect target, when the page declares one

use crate::url::resolve_url;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Placeholder stored when an anchor has no visible text
pub const NO_LINK_TEXT: &str = "[no text]";

/// An `<a href>` found on a page, resolved against the page URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorLink {
    pub url: Url,
    pub text: String,
    pub title: Option<String>,
}

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// Content of `<meta name="author">`
    pub author: Option<String>,

    /// Target of `<meta http-equiv="refresh" content="N;url=...">`
    pub meta_refresh: Option<Url>,

    /// All followable anchors, in document order
    pub links: Vec<AnchorLink>,
}

/// Parses HTML content and extracts links and metadata
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` anywhere in the document
///
/// **Exclude:**
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only and empty hrefs
/// - Anything that does not resolve to an http(s) URL
///
/// Parsing never fails: malformed markup yields whatever the HTML5 tree
/// builder recovers, possibly nothing.
///
/// # Example
///
/// ```no_run
/// use docharvest::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/a.pdf">Paper</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &base_url);
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert_eq!(parsed.links[0].text, "Paper");
/// ```
pub fn parse_html(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        title: extract_title(&document),
        author: extract_author(&document),
        meta_refresh: extract_meta_refresh(&document, base_url),
        links: extract_links(&document, base_url),
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .filter(|s| !s.is_empty())
}

fn extract_author(document: &Html) -> Option<String> {
    let meta_selector = Selector::parse("meta[name][content]").ok()?;

    document
        .select(&meta_selector)
        .find(|element| {
            element
                .value()
                .attr("name")
                .is_some_and(|name| name.trim().eq_ignore_ascii_case("author"))
        })
        .and_then(|element| element.value().attr("content"))
        .map(collapse_whitespace)
        .filter(|s| !s.is_empty())
}

/// Finds the first meta refresh that names a target URL
fn extract_meta_refresh(document: &Html, base_url: &Url) -> Option<Url> {
    let meta_selector = Selector::parse("meta[http-equiv][content]").ok()?;

    document
        .select(&meta_selector)
        .filter(|element| {
            element
                .value()
                .attr("http-equiv")
                .is_some_and(|v| v.trim().eq_ignore_ascii_case("refresh"))
        })
        .filter_map(|element| element.value().attr("content"))
        .filter_map(refresh_target)
        .find_map(|target| resolve_url(base_url, target).ok())
}

/// Pulls the URL out of a refresh directive such as `0; URL='/next'`
///
/// The delay part is optional. The `url=` key is matched case-insensitively
/// in any `;`-separated part; the target keeps its case.
fn refresh_target(content: &str) -> Option<&str> {
    content.split(';').find_map(|part| {
        let part = part.trim_start();
        if !part.get(..3)?.eq_ignore_ascii_case("url") {
            return None;
        }

        let target = part[3..]
            .trim_start()
            .strip_prefix('=')?
            .trim()
            .trim_matches(|c| c == '\'' || c == '"')
            .trim();
        (!target.is_empty()).then_some(target)
    })
}

/// Extracts all valid anchors from the HTML document
fn extract_links(document: &Html, base_url: &Url) -> Vec<AnchorLink> {
    let Ok(a_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&a_selector)
        .filter_map(|element| {
            let href = element.value().attr("href")?;
            let url = resolve_link(href, base_url)?;
            Some(AnchorLink {
                url,
                text: anchor_text(&element),
                title: element
                    .value()
                    .attr("title")
                    .map(collapse_whitespace)
                    .filter(|t| !t.is_empty()),
            })
        })
        .collect()
}

fn anchor_text(element: &ElementRef<'_>) -> String {
    let text = collapse_whitespace(&element.text().collect::<String>());
    if text.is_empty() {
        NO_LINK_TEXT.to_string()
    } else {
        text
    }
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only or empty hrefs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    resolve_url(base_url, href).ok()
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
