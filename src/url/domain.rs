use crate::UrlError;
use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host (which shouldn't happen for valid HTTP(S) URLs), it returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use tagsift::url::extract_domain;
///
/// let url = Url::parse("https://safebooru.org/index.php").unwrap();
/// assert_eq!(extract_domain(&url), Some("safebooru.org".to_string()));
///
/// let url = Url::parse("https://DANBOORU.donmai.us/posts/1").unwrap();
/// assert_eq!(extract_domain(&url), Some("danbooru.donmai.us".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Parses a string into an HTTP(S) URL that has a host
///
/// # Returns
///
/// * `Ok(Url)` - The parsed URL
/// * `Err(UrlError)` - The string is not a URL, uses another scheme, or has no host
///
/// # Examples
///
/// ```
/// use tagsift::url::parse_http_url;
///
/// assert!(parse_http_url("https://gelbooru.com/index.php?page=post&s=view&id=1").is_ok());
/// assert!(parse_http_url("ftp://gelbooru.com/").is_err());
/// assert!(parse_http_url("not a url").is_err());
/// ```
pub fn parse_http_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|source| UrlError::Parse {
        url: url_str.to_string(),
        source,
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost(url_str.to_string()));
    }

    Ok(url)
}
