use crate::UrlError;
use url::Url;

/// Normalizes a URL into the canonical key used for de-duplication
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Require an `http` or `https` scheme
/// 3. Require a host
/// 4. Remove the fragment (everything after #)
///
/// The query string is kept verbatim, parameter order included, and the path
/// is not case-folded. Whatever canonicalization the URL parser itself applies
/// (lowercase scheme and host, default port removal, dot segments) is stable,
/// so normalizing twice yields the same result.
///
/// # Arguments
///
/// * `url_str` - The URL string to normalize
///
/// # Returns
///
/// * `Ok(Url)` - Normalized URL
/// * `Err(UrlError)` - Failed to parse or normalize the URL
///
/// # Examples
///
/// ```
/// use docharvest::url::normalize_url;
///
/// let url = normalize_url("http://a.example/b?x=1#frag").unwrap();
/// assert_eq!(url.as_str(), "http://a.example/b?x=1");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
    finish(url)
}

/// Resolves a (possibly relative) reference against the page it was found on,
/// then normalizes the result
///
/// # Arguments
///
/// * `base` - URL of the referring page
/// * `reference` - Raw `href` or redirect target
pub fn resolve_url(base: &Url, reference: &str) -> Result<Url, UrlError> {
    let url = base
        .join(reference.trim())
        .map_err(|e| UrlError::Parse(e.to_string()))?;
    finish(url)
}

fn finish(mut url: Url) -> Result<Url, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    url.set_fragment(None);
    Ok(url)
}
