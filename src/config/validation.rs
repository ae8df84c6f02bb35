use crate::config::types::{Config, CrawlerConfig, OutputConfig, RegistryConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_registry_config(&config.registry)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("max_concurrent_pages", config.max_concurrent_pages),
        ("max_concurrent_details", config.max_concurrent_details),
        ("max_concurrent_requests", config.max_concurrent_requests),
    ] {
        if !(1..=100).contains(&value) {
            return Err(ConfigError::Validation(format!(
                "{} must be between 1 and 100, got {}",
                name, value
            )));
        }
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    if config.force_refresh_days < 1 {
        return Err(ConfigError::Validation(format!(
            "force_refresh_days must be >= 1, got {}",
            config.force_refresh_days
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
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

/// Validates the registry entry points
fn validate_registry_config(config: &RegistryConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("account_start_url", &config.account_start_url),
        ("account_page_url", &config.account_page_url),
        ("transaction_probe_url", &config.transaction_probe_url),
        ("transaction_page_url", &config.transaction_page_url),
    ] {
        let url = Url::parse(value)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", name, value, e)))?;

        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(ConfigError::Validation(format!(
                "{} '{}' must use HTTP or HTTPS",
                name, value
            )));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("account_csv_path", &config.account_csv_path),
        ("transaction_csv_path", &config.transaction_csv_path),
        ("state_path", &config.state_path),
    ] {
        if value.is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    if matches!(config.database_path.as_deref(), Some("")) {
        return Err(ConfigError::Validation(
            "database_path cannot be empty when set".to_string(),
        ));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crawler_config() -> CrawlerConfig {
        CrawlerConfig {
            max_concurrent_pages: 4,
            max_concurrent_details: 4,
            max_concurrent_requests: 8,
            max_page_retries: Some(5),
            request_timeout_secs: 30,
            force_refresh_days: 90,
        }
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("admin@sub.example.com").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("user@domain").is_err());
    }

    #[test]
    fn test_crawler_concurrency_bounds() {
        assert!(validate_crawler_config(&crawler_config()).is_ok());

        let mut config = crawler_config();
        config.max_concurrent_details = 0;
        assert!(validate_crawler_config(&config).is_err());

        let mut config = crawler_config();
        config.max_concurrent_requests = 101;
        assert!(validate_crawler_config(&config).is_err());
    }

    #[test]
    fn test_refresh_window_must_be_positive() {
        let mut config = crawler_config();
        config.force_refresh_days = 0;
        assert!(validate_crawler_config(&config).is_err());
    }

    #[test]
    fn test_registry_urls_must_be_http() {
        assert!(validate_registry_config(&RegistryConfig::default()).is_ok());

        let mut config = RegistryConfig::default();
        config.transaction_page_url = "ftp://example.com/list".to_string();
        assert!(validate_registry_config(&config).is_err());

        let mut config = RegistryConfig::default();
        config.account_start_url = "not a url".to_string();
        assert!(matches!(
            validate_registry_config(&config),
            Err(ConfigError::InvalidUrl(_))
        ));
    }
}
