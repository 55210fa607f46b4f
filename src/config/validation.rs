use crate::config::types::{Config, CrawlerConfig, HttpConfig, OutputConfig, StoreConfig};
use crate::ConfigError;
use url::Url;

/// Upper bound on the worker pool size
const MAX_WORKERS: usize = 64;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_http_config(&config.http)?;
    validate_store_config(&config.store)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawl budgets
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&config.relevance_threshold) {
        return Err(ConfigError::Validation(format!(
            "relevance_threshold must be between 0.0 and 1.0, got {}",
            config.relevance_threshold
        )));
    }

    if config.max_resources_per_level < 1 {
        return Err(ConfigError::Validation(
            "max_resources_per_level must be >= 1".to_string(),
        ));
    }

    if config.max_workers < 1 || config.max_workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "max_workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.max_workers
        )));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates HTTP identification and deadlines
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.crawler_name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    if config.probe_timeout_secs == 0 || config.fetch_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "HTTP timeouts must be >= 1 second".to_string(),
        ));
    }

    Ok(())
}

/// Validates the graph store endpoint
fn validate_store_config(config: &StoreConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid store endpoint: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Store endpoint '{}' must use http or https",
            config.endpoint
        )));
    }

    if config.dataset.trim().is_empty() {
        return Err(ConfigError::Validation(
            "store dataset cannot be empty".to_string(),
        ));
    }

    if config.max_retries < 1 {
        return Err(ConfigError::Validation(
            "store max_retries must be >= 1".to_string(),
        ));
    }

    if config.chunk_lines < 1 {
        return Err(ConfigError::Validation(
            "store chunk_lines must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates output locations
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if config.export_dir.is_empty() {
        return Err(ConfigError::Validation(
            "export_dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}
