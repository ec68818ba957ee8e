use url::Url;

/// Path extensions that identify a downloadable document
const DOCUMENT_EXTENSIONS: &[&str] = &["pdf"];

/// Path extensions served as HTML by dynamic or static page handlers
const PAGE_EXTENSIONS: &[&str] = &[
    "html", "htm", "php", "asp", "aspx", "jsp", "jspx", "cgi", "pl", "xhtml", "shtml", "cfm",
    "rhtml", "erb", "do", "action", "axd",
];

/// What a discovered link points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    /// A probable downloadable document, recorded as a candidate
    Document,
    /// A probable HTML page, eligible for the frontier
    Page,
    /// Anything else (images, archives, stylesheets); dropped silently
    Ignore,
}

/// Classifies a normalized URL as document, page or neither
///
/// Documents are checked first, so a `download?id=` link with no extension
/// is a document rather than a page.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use docharvest::url::{classify, LinkKind};
///
/// let url = Url::parse("http://x.example/doc.pdf").unwrap();
/// assert_eq!(classify(&url), LinkKind::Document);
///
/// let url = Url::parse("http://x.example/img.png").unwrap();
/// assert_eq!(classify(&url), LinkKind::Ignore);
/// ```
pub fn classify(url: &Url) -> LinkKind {
    if is_probable_document(url) {
        return LinkKind::Document;
    }

    let ext = file_extension(url);
    if ext.is_empty() || PAGE_EXTENSIONS.contains(&ext.as_str()) {
        LinkKind::Page
    } else {
        LinkKind::Ignore
    }
}

/// Returns the lowercase extension of the last path segment, or an empty string
///
/// Only the path is inspected; the query string never contributes.
pub fn file_extension(url: &Url) -> String {
    let last = url.path().rsplit('/').next().unwrap_or("");
    match last.rfind('.') {
        Some(pos) if pos > 0 => last[pos + 1..].to_lowercase(),
        _ => String::new(),
    }
}

fn is_probable_document(url: &Url) -> bool {
    if DOCUMENT_EXTENSIONS.contains(&file_extension(url).as_str()) {
        return true;
    }

    let path = url.path().to_lowercase();
    let host = url.host_str().unwrap_or("").to_lowercase();

    if path.contains("download") && has_query_param(url, "id") {
        return true;
    }

    // Seafile share links
    if host == "plmbox.math.cnrs.fr" {
        if path.starts_with("/f/") && has_query_param(url, "dl") {
            return true;
        }
        if path.starts_with("/seafhttp/f/") {
            return true;
        }
    }

    // Google Drive file links: /file/d/{id}[/view]
    if host == "drive.google.com" {
        let mut segments = url.path_segments().into_iter().flatten();
        if segments.next() == Some("file")
            && segments.next() == Some("d")
            && segments.next().is_some_and(|id| !id.is_empty())
        {
            return true;
        }
    }

    false
}

fn has_query_param(url: &Url, name: &str) -> bool {
    url.query_pairs().any(|(key, _)| key == name)
}
