use crate::config::catalog::CategoryCatalog;
use crate::config::types::{
    CategoryEntry, Config, CrawlConfig, FetchConfig, FilterConfig, OutputConfig,
};
use crate::ConfigError;
use url::Url;

const MIN_YEAR: i32 = 1900;
const MAX_YEAR: i32 = 2100;
const MAX_WORKERS: usize = 32;
const MAX_ATTEMPTS: u32 = 10;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_category_entries(&config.categories)?;
    validate_crawl_config(&config.crawl, &config.catalog())?;
    validate_fetch_config(&config.fetch)?;
    validate_filter_config(&config.filter)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the year range, category keys and base URL
fn validate_crawl_config(config: &CrawlConfig, catalog: &CategoryCatalog) -> Result<(), ConfigError> {
    for year in [config.start_year, config.end_year] {
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(ConfigError::Validation(format!(
                "years must be between {} and {}, got {}",
                MIN_YEAR, MAX_YEAR, year
            )));
        }
    }

    if config.start_year > config.end_year {
        return Err(ConfigError::Validation(format!(
            "start-year must be less than or equal to end-year, got {} > {}",
            config.start_year, config.end_year
        )));
    }

    if config.categories.is_empty() {
        return Err(ConfigError::Validation(
            "at least one category must be selected".to_string(),
        ));
    }

    for key in &config.categories {
        if !catalog.contains(key) {
            return Err(ConfigError::UnknownCategory(key.clone()));
        }
    }

    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' must use http or https",
            config.base_url
        )));
    }

    Ok(())
}

/// Validates worker pool and retry settings
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.workers
        )));
    }

    if config.max_attempts < 1 || config.max_attempts > MAX_ATTEMPTS {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be between 1 and {}, got {}",
            MAX_ATTEMPTS, config.max_attempts
        )));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout-secs must be greater than zero".to_string(),
        ));
    }

    if config.backoff_max_ms < config.backoff_base_ms {
        return Err(ConfigError::Validation(format!(
            "backoff-max-ms ({}) must not be below backoff-base-ms ({})",
            config.backoff_max_ms, config.backoff_base_ms
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_filter_config(config: &FilterConfig) -> Result<(), ConfigError> {
    if config.genre.trim().is_empty() {
        return Err(ConfigError::Validation("genre cannot be empty".to_string()));
    }

    if config.keywords.iter().any(|k| k.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "filter keywords cannot be blank".to_string(),
        ));
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.checkpoint_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "checkpoint-path cannot be empty".to_string(),
        ));
    }

    if config.dataset_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "dataset-path cannot be empty".to_string(),
        ));
    }

    if config.failure_report_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "failure-report-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates configured category templates
fn validate_category_entries(entries: &[CategoryEntry]) -> Result<(), ConfigError> {
    for entry in entries {
        validate_category_key(&entry.key)?;

        if entry.template.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "category '{}' has an empty template",
                entry.key
            )));
        }
    }
    Ok(())
}

/// Category keys end up inside task ids, so ':' and whitespace are not allowed
fn validate_category_key(key: &str) -> Result<(), ConfigError> {
    if key.is_empty() {
        return Err(ConfigError::Validation(
            "category key cannot be empty".to_string(),
        ));
    }

    if !key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "category key '{}' must contain only letters, digits, '-' or '_'",
            key
        )));
    }

    Ok(())
}
