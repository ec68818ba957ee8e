use crate::config::RulesConfig;
use crate::url::domain::extract_host;
use crate::url::matcher::MatchMode;
use crate::{ConfigError, ConfigResult};
use std::path::Path;
use url::Url;

/// Allow and block patterns together with the mode used to compare them
#[derive(Debug, Clone, Default)]
pub struct CrawlRules {
    allow: Vec<String>,
    block: Vec<String>,
    mode: MatchMode,
}

impl CrawlRules {
    /// Builds a rule set from in-memory patterns
    ///
    /// Patterns are trimmed and lowercased; empty entries are dropped. In the
    /// domain modes a leading `*.` is stripped and a pattern containing `/` or
    /// `:` is rejected, since it could never match a bare host.
    pub fn new<I, J>(allow: I, block: J, mode: MatchMode) -> ConfigResult<Self>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        J: IntoIterator,
        J::Item: AsRef<str>,
    {
        Ok(Self {
            allow: clean_patterns(allow, mode)?,
            block: clean_patterns(block, mode)?,
            mode,
        })
    }

    /// Loads the rule files named by the configuration
    pub fn from_config(config: &RulesConfig) -> ConfigResult<Self> {
        Self::load(&config.allow_file, &config.block_file, config.match_mode)
    }

    /// Loads rule files from disk
    ///
    /// A missing file is treated as an empty one, so a fresh checkout crawls
    /// without restriction.
    pub fn load(allow_file: &Path, block_file: &Path, mode: MatchMode) -> ConfigResult<Self> {
        let allow = read_pattern_file(allow_file)?;
        let block = read_pattern_file(block_file)?;
        let rules = Self::new(allow, block, mode)?;

        tracing::info!(
            "Loaded {} allow and {} block patterns ({} matching)",
            rules.allow.len(),
            rules.block.len(),
            mode
        );

        Ok(rules)
    }

    /// Returns true if any block pattern matches the URL
    pub fn is_blocked(&self, url: &Url) -> bool {
        self.any_match(&self.block, url)
    }

    /// Returns true if the allow set is empty or any allow pattern matches
    pub fn is_allowed(&self, url: &Url) -> bool {
        self.allow.is_empty() || self.any_match(&self.allow, url)
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    pub fn allow_patterns(&self) -> &[String] {
        &self.allow
    }

    pub fn block_patterns(&self) -> &[String] {
        &self.block
    }

    fn any_match(&self, patterns: &[String], url: &Url) -> bool {
        let host = extract_host(url).unwrap_or_default();
        patterns
            .iter()
            .any(|pattern| self.mode.matches(pattern, &host, url.as_str()))
    }
}

fn read_pattern_file(path: &Path) -> ConfigResult<Vec<String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("Rule file {} not found, treating as empty", path.display());
            Ok(Vec::new())
        }
        Err(e) => Err(ConfigError::Io(e)),
    }
}

fn clean_patterns<I>(patterns: I, mode: MatchMode) -> ConfigResult<Vec<String>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut cleaned = Vec::new();

    for raw in patterns {
        let mut pattern = raw.as_ref().trim().to_lowercase();
        if pattern.is_empty() {
            continue;
        }

        if mode.is_domain_based() {
            if pattern.contains('/') || pattern.contains(':') {
                return Err(ConfigError::InvalidPattern(format!(
                    "'{}' is not a domain name ({} matching)",
                    pattern, mode
                )));
            }
            if let Some(stripped) = pattern.strip_prefix("*.") {
                pattern = stripped.to_string();
            }
        }

        if !cleaned.contains(&pattern) {
            cleaned.push(pattern);
        }
    }

    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_empty_allow_allows_all() {
        let rules = CrawlRules::new(Vec::<String>::new(), vec!["bad.com"], MatchMode::DomainSuffix)
            .unwrap();
        assert!(rules.is_allowed(&url("https://anything.org/")));
        assert!(!rules.is_blocked(&url("https://anything.org/")));
    }

    #[test]
    fn test_block_suffix() {
        let rules =
            CrawlRules::new(Vec::<String>::new(), vec!["bad.com"], MatchMode::DomainSuffix)
                .unwrap();
        assert!(rules.is_blocked(&url("https://bad.com/page")));
        assert!(rules.is_blocked(&url("https://www.bad.com/page")));
        assert!(!rules.is_blocked(&url("https://notbad.com/page")));
    }

    #[test]
    fn test_allow_suffix_ignores_port() {
        let rules = CrawlRules::new(vec!["127.0.0.1"], Vec::<String>::new(), MatchMode::DomainSuffix)
            .unwrap();
        assert!(rules.is_allowed(&url("http://127.0.0.1:8080/")));
        assert!(!rules.is_allowed(&url("http://10.0.0.1/")));
    }

    #[test]
    fn test_exact_mode_rejects_subdomain() {
        let rules = CrawlRules::new(vec!["example.com"], Vec::<String>::new(), MatchMode::ExactDomain)
            .unwrap();
        assert!(rules.is_allowed(&url("https://example.com/")));
        assert!(!rules.is_allowed(&url("https://blog.example.com/")));
    }

    #[test]
    fn test_substring_mode_matches_path() {
        let rules =
            CrawlRules::new(Vec::<String>::new(), vec!["/Private/"], MatchMode::Substring).unwrap();
        assert!(rules.is_blocked(&url("https://example.com/private/a.html")));
        assert!(!rules.is_blocked(&url("https://example.com/public/a.html")));
    }

    #[test]
    fn test_wildcard_prefix_stripped() {
        let rules =
            CrawlRules::new(vec!["*.Example.com"], Vec::<String>::new(), MatchMode::DomainSuffix)
                .unwrap();
        assert_eq!(rules.allow_patterns(), &["example.com".to_string()]);
        assert!(rules.is_allowed(&url("https://example.com/")));
    }

    #[test]
    fn test_url_pattern_rejected_in_domain_mode() {
        let result = CrawlRules::new(
            vec!["https://example.com/"],
            Vec::<String>::new(),
            MatchMode::DomainSuffix,
        );
        assert!(matches!(result, Err(ConfigError::InvalidPattern(_))));
    }

    #[test]
    fn test_load_files_with_comments() {
        let mut allow = NamedTempFile::new().unwrap();
        writeln!(allow, "# universities\nuniv.fr\n\n  cnrs.fr  ").unwrap();
        let dir = TempDir::new().unwrap();
        let missing_block = dir.path().join("blocked.txt");

        let rules = CrawlRules::load(allow.path(), &missing_block, MatchMode::DomainSuffix).unwrap();
        assert_eq!(
            rules.allow_patterns(),
            &["univ.fr".to_string(), "cnrs.fr".to_string()]
        );
        assert!(rules.block_patterns().is_empty());
        assert!(rules.is_allowed(&url("https://math.univ.fr/cours")));
        assert!(!rules.is_allowed(&url("https://example.com/")));
    }
}
