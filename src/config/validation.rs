use crate::config::types::{
    Config, CrawlerConfig, StateConfig, UserAgentConfig, VerifierConfig,
};
use crate::ConfigError;
use url::Url;

const MAX_SUPPORTED_DEPTH: u32 = 64;
const MIN_DELAY_MS: u64 = 100;
const MAX_PREFIX_BYTES: usize = 4096;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_verifier_config(&config.verifier)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_state_config(&config.state)?;
    Ok(())
}

fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_depth > MAX_SUPPORTED_DEPTH {
        return Err(ConfigError::Validation(format!(
            "max_depth must be <= {}, got {}",
            MAX_SUPPORTED_DEPTH, config.max_depth
        )));
    }

    if config.request_delay_ms < MIN_DELAY_MS {
        return Err(ConfigError::Validation(format!(
            "crawler request_delay_ms must be >= {}ms, got {}ms",
            MIN_DELAY_MS, config.request_delay_ms
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.pdf_batch_size < 1 {
        return Err(ConfigError::Validation(format!(
            "pdf_batch_size must be >= 1, got {}",
            config.pdf_batch_size
        )));
    }

    if config.failure_budget < 1 {
        return Err(ConfigError::Validation(format!(
            "failure_budget must be >= 1, got {}",
            config.failure_budget
        )));
    }

    Ok(())
}

fn validate_verifier_config(config: &VerifierConfig) -> Result<(), ConfigError> {
    if config.request_delay_ms < MIN_DELAY_MS {
        return Err(ConfigError::Validation(format!(
            "verifier request_delay_ms must be >= {}ms, got {}ms",
            MIN_DELAY_MS, config.request_delay_ms
        )));
    }

    if config.prefix_bytes == 0 || config.prefix_bytes > MAX_PREFIX_BYTES {
        return Err(ConfigError::Validation(format!(
            "prefix_bytes must be between 1 and {}, got {}",
            MAX_PREFIX_BYTES, config.prefix_bytes
        )));
    }

    Ok(())
}

fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

fn validate_state_config(config: &StateConfig) -> Result<(), ConfigError> {
    if config.directory.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "state directory cannot be empty".to_string(),
        ));
    }

    if config.database_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
