use super::{types::Config, AuthMethod, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Auth section exists (enforced by serde) and carries a secret when one is required
/// - Server port is not 0
/// - Page sizes are usable
/// - Crawler entry URL is http(s) and the page limit is positive
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.auth.method == AuthMethod::SharedSecret
        && config.auth.secret.as_deref().is_none_or(|s| s.trim().is_empty())
    {
        return Err(ConfigError::ValidationError(
            "auth.secret is required when auth.method = \"shared_secret\"".to_string(),
        ));
    }

    let catalog = &config.catalog;
    if catalog.max_page_size == 0 {
        return Err(ConfigError::ValidationError(
            "catalog.max_page_size must be at least 1".to_string(),
        ));
    }
    if catalog.default_page_size == 0 || catalog.default_page_size > catalog.max_page_size {
        return Err(ConfigError::ValidationError(format!(
            "catalog.default_page_size must be between 1 and {}",
            catalog.max_page_size
        )));
    }

    let crawler = &config.crawler;
    if !matches!(crawler.entry_url.scheme(), "http" | "https") {
        return Err(ConfigError::ValidationError(format!(
            "crawler.entry_url must be an http(s) URL, got {}",
            crawler.entry_url
        )));
    }
    if crawler.max_pages == 0 {
        return Err(ConfigError::ValidationError(
            "crawler.max_pages must be at least 1".to_string(),
        ));
    }
    if crawler.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "crawler.timeout_secs must be at least 1".to_string(),
        ));
    }

    Ok(())
}
