use crate::config::types::{
    AccessConfig, BatchConfig, CacheConfig, Config, FetchConfig, HandlerConfig, SummaryConfig,
    MAX_CONCURRENCY,
};
use crate::url::parse_target;
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetch_config(&config.fetch)?;
    validate_summary_config(&config.summary)?;
    validate_batch_config(&config.batch)?;
    validate_access_config(&config.access)?;
    validate_handler_config(&config.handlers)?;
    validate_cache_config(&config.cache)?;
    Ok(())
}

/// Validates HTTP retrieval configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    // retries below 1 are floored by the fetcher, so no check needed

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates summary thresholds
fn validate_summary_config(config: &SummaryConfig) -> Result<(), ConfigError> {
    if config.max_size == 0 {
        return Err(ConfigError::Validation(
            "summary max-size must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates the fan-out bound
///
/// Zero is floored to one permit; values beyond the permit pool's capacity
/// are rejected.
fn validate_batch_config(config: &BatchConfig) -> Result<(), ConfigError> {
    if config.concurrency > MAX_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "batch concurrency must be <= {}, got {}",
            MAX_CONCURRENCY, config.concurrency
        )));
    }

    Ok(())
}

/// Validates allow and deny host lists
fn validate_access_config(config: &AccessConfig) -> Result<(), ConfigError> {
    for host in config.allow_hosts.iter().chain(&config.deny_hosts) {
        validate_host_entry(host)?;
    }
    Ok(())
}

/// Validates a single host entry
///
/// Entries are bare hosts compared exactly against URL hosts, so anything that
/// looks like a URL, path or wildcard is rejected.
fn validate_host_entry(host: &str) -> Result<(), ConfigError> {
    if host.is_empty() {
        return Err(ConfigError::Validation(
            "Host entry cannot be empty".to_string(),
        ));
    }

    if !host
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '.' | '-' | ':' | '[' | ']'))
    {
        return Err(ConfigError::Validation(format!(
            "Host '{}' contains invalid characters (expected a bare host such as 'example.com')",
            host
        )));
    }

    if host.starts_with('.') || host.ends_with('.') || host.contains("..") {
        return Err(ConfigError::Validation(format!(
            "Host '{}' has misplaced dots",
            host
        )));
    }

    Ok(())
}

/// Validates site handler configuration
fn validate_handler_config(config: &HandlerConfig) -> Result<(), ConfigError> {
    if config.api_lang.is_empty()
        || !config
            .api_lang
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "api-lang must be a non-empty language code, got '{}'",
            config.api_lang
        )));
    }

    if matches!(&config.github_token, Some(token) if token.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "github-token cannot be blank when set".to_string(),
        ));
    }

    if let Some(base) = &config.wiki_base_url {
        parse_target(base).map_err(|e| {
            ConfigError::Validation(format!("wiki-base-url is not usable: {}", e))
        })?;
    }

    Ok(())
}

/// Validates cache configuration
fn validate_cache_config(config: &CacheConfig) -> Result<(), ConfigError> {
    if !config.enabled {
        return Ok(());
    }

    if config.max_entries < 1 {
        return Err(ConfigError::Validation(format!(
            "cache max-entries must be >= 1, got {}",
            config.max_entries
        )));
    }

    if config.ttl_secs == 0 {
        return Err(ConfigError::Validation(
            "cache ttl-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}
