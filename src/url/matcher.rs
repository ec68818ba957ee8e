use serde::Deserialize;
use std::fmt;

/// How allow/block patterns are compared against a URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchMode {
    /// The host must equal the pattern
    ExactDomain,
    /// The host must equal the pattern or be a subdomain of it
    #[default]
    DomainSuffix,
    /// The pattern must appear anywhere in the full URL string
    Substring,
}

impl MatchMode {
    /// Returns true when patterns are domain names rather than URL fragments
    pub fn is_domain_based(&self) -> bool {
        matches!(self, Self::ExactDomain | Self::DomainSuffix)
    }

    /// Checks a single pattern against a URL
    ///
    /// # Arguments
    ///
    /// * `pattern` - A lowercase rule pattern
    /// * `host` - The lowercase host of the URL (no port)
    /// * `url` - The full URL string
    pub fn matches(&self, pattern: &str, host: &str, url: &str) -> bool {
        match self {
            Self::ExactDomain => host == pattern,
            Self::DomainSuffix => matches_domain_suffix(pattern, host),
            Self::Substring => url.to_lowercase().contains(pattern),
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExactDomain => write!(f, "exact-domain"),
            Self::DomainSuffix => write!(f, "domain-suffix"),
            Self::Substring => write!(f, "substring"),
        }
    }
}

/// Checks if a host is the pattern domain or one of its subdomains
///
/// A leading `*.` on the pattern is accepted and ignored.
///
/// # Examples
///
/// ```
/// use docharvest::url::matches_domain_suffix;
///
/// assert!(matches_domain_suffix("example.com", "example.com"));
/// assert!(matches_domain_suffix("*.example.com", "blog.example.com"));
/// assert!(!matches_domain_suffix("example.com", "myexample.com"));
/// ```
pub fn matches_domain_suffix(pattern: &str, host: &str) -> bool {
    let base = pattern.strip_prefix("*.").unwrap_or(pattern);
    if base.is_empty() {
        return false;
    }
    host == base
        || (host.len() > base.len()
            && host.ends_with(base)
            && host.as_bytes()[host.len() - base.len() - 1] == b'.')
}
