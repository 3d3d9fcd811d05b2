use crate::config::types::{Config, CrawlerConfig, OutputConfig, TagsConfig, UserAgentConfig};
use crate::site::{SiteProfile, SiteRegistry, POST_ID_PLACEHOLDER};
use crate::url::parse_http_url;
use crate::ConfigError;
use scraper::Selector;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    for profile in &config.sites {
        validate_site_profile(profile)?;
    }
    validate_tags_config(&config.tags, &config.registry())?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_parallelism < 1 || config.max_parallelism > 100 {
        return Err(ConfigError::Validation(format!(
            "max_parallelism must be between 1 and 100, got {}",
            config.max_parallelism
        )));
    }

    if config.per_domain_limit < 1 {
        return Err(ConfigError::Validation(format!(
            "per_domain_limit must be >= 1, got {}",
            config.per_domain_limit
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be >= 1, got {}",
            config.request_timeout_secs
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

    if config.crawler_version.trim().is_empty() {
        return Err(ConfigError::Validation(
            "crawler_version cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates what to harvest against the known sites
fn validate_tags_config(config: &TagsConfig, registry: &SiteRegistry) -> Result<(), ConfigError> {
    registry.resolve(config.site_name())?;

    if config.categories.is_empty() {
        return Err(ConfigError::Validation(
            "at least one tag category is required".to_string(),
        ));
    }

    if let Some(blank) = config.categories.iter().find(|c| c.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "tag category cannot be blank, got '{}'",
            blank
        )));
    }

    for seed in &config.seeds {
        parse_http_url(seed)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;
    }

    Ok(())
}

/// Validates a site profile declared in the config
fn validate_site_profile(profile: &SiteProfile) -> Result<(), ConfigError> {
    if profile.id.trim().is_empty() {
        return Err(ConfigError::Validation(
            "site id cannot be empty".to_string(),
        ));
    }

    validate_domain_string(&profile.allowed_domain)?;
    validate_selector(&profile.id, &profile.tags_container_selector)?;

    if profile.tag_category_selectors.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Site '{}' must define at least one tag category",
            profile.id
        )));
    }

    for selector in profile.tag_category_selectors.values() {
        validate_selector(&profile.id, selector)?;
    }

    if let Some(template) = &profile.post_url_template {
        if !template.contains(POST_ID_PLACEHOLDER) {
            return Err(ConfigError::Validation(format!(
                "Site '{}' post-url-template must contain '{}'",
                profile.id,
                POST_ID_PLACEHOLDER
            )));
        }
        parse_http_url(template).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid post-url-template '{}': {}", template, e))
        })?;
    }

    Ok(())
}

/// Checks that a CSS selector parses
fn validate_selector(site: &str, selector: &str) -> Result<(), ConfigError> {
    Selector::parse(selector).map(|_| ()).map_err(|e| {
        ConfigError::Validation(format!(
            "Site '{}' has an invalid selector '{}': {}",
            site, selector, e
        ))
    })
}

/// Validates a domain string
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::Validation(
            "Domain cannot be empty".to_string(),
        ));
    }

    // Check for invalid characters
    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    // Check that it doesn't start or end with a dot or hyphen
    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::Validation(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::Validation(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::safebooru;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_parallelism_bounds() {
        let mut config = Config::default();
        config.crawler.max_parallelism = 101;
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));

        config.crawler.max_parallelism = 100;
        assert!(validate(&config).is_ok());

        config.crawler.per_domain_limit = 0;
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = Config::default();
        config.crawler.request_timeout_secs = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_crawler_name_characters() {
        let mut config = Config::default();
        config.user_agent.crawler_name = "tag sift".to_string();
        assert!(validate(&config).is_err());

        config.user_agent.crawler_name = "tag-sift".to_string();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_unknown_site_rejected() {
        let mut config = Config::default();
        config.tags.site = Some("yandere".to_string());
        assert!(matches!(validate(&config), Err(ConfigError::UnknownSite(s)) if s == "yandere"));

        config.tags.site = Some("DAN".to_string());
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_empty_categories_rejected() {
        let mut config = Config::default();
        config.tags.categories.clear();
        assert!(validate(&config).is_err());

        config.tags.categories = vec!["general".to_string(), "  ".to_string()];
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_seed_must_be_http() {
        let mut config = Config::default();
        config.tags.seeds = vec!["ftp://safebooru.org/1".to_string()];
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_site_profile_selectors_checked() {
        let mut profile = safebooru();
        assert!(validate_site_profile(&profile).is_ok());

        profile
            .tag_category_selectors
            .insert("general".to_string(), "li[[".to_string());
        assert!(validate_site_profile(&profile).is_err());
    }

    #[test]
    fn test_post_url_template_needs_placeholder() {
        let mut profile = safebooru();
        profile.post_url_template = Some("https://safebooru.org/index.php".to_string());
        assert!(validate_site_profile(&profile).is_err());
    }

    #[test]
    fn test_validate_domain_string() {
        assert!(validate_domain_string("safebooru.org").is_ok());
        assert!(validate_domain_string("127.0.0.1").is_ok());
        assert!(validate_domain_string("localhost").is_ok());

        assert!(validate_domain_string("").is_err());
        assert!(validate_domain_string(".safebooru.org").is_err());
        assert!(validate_domain_string("safebooru.org.").is_err());
        assert!(validate_domain_string("safe..booru").is_err());
        assert!(validate_domain_string("safebooru.org/path").is_err());
    }
}
