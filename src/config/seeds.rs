//! Seed list construction from URLs and post id ranges

use crate::crawler::FetchTask;
use crate::site::SiteProfile;
use crate::ConfigError;

/// Upper bound on the number of ids a single range may expand to
const MAX_RANGE_LEN: u64 = 1_000_000;

/// Parses a comma-separated list of post ids and inclusive ranges
///
/// # Examples
///
/// ```
/// use tagsift::config::parse_post_ids;
///
/// assert_eq!(parse_post_ids("1-3,42").unwrap(), vec![1, 2, 3, 42]);
/// assert!(parse_post_ids("5-1").is_err());
/// ```
pub fn parse_post_ids(list: &str) -> Result<Vec<u64>, ConfigError> {
    let mut ids = Vec::new();

    for part in list.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once('-') {
            Some((start, end)) => {
                let start = parse_id(start)?;
                let end = parse_id(end)?;
                if start > end {
                    return Err(ConfigError::Validation(format!(
                        "Post id range '{}' runs backwards",
                        part
                    )));
                }
                if end - start >= MAX_RANGE_LEN {
                    return Err(ConfigError::Validation(format!(
                        "Post id range '{}' is larger than {} ids",
                        part, MAX_RANGE_LEN
                    )));
                }
                ids.extend(start..=end);
            }
            None => ids.push(parse_id(part)?),
        }
    }

    Ok(ids)
}

fn parse_id(raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::Validation(format!("Invalid post id '{}'", raw.trim())))
}

/// Builds the seed tasks for one run
///
/// Explicit URLs come first, followed by the post pages for `ids` in order.
/// Post ids need a profile with a post URL template.
pub fn seed_tasks(
    profile: &SiteProfile,
    urls: &[String],
    ids: &[u64],
) -> Result<Vec<FetchTask>, ConfigError> {
    let mut tasks = Vec::with_capacity(urls.len() + ids.len());

    for url in urls {
        let task = FetchTask::seed(url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", url, e)))?;
        tasks.push(task);
    }

    for &id in ids {
        let url = profile.post_url(id).ok_or_else(|| {
            ConfigError::Validation(format!(
                "Site '{}' has no post-url-template, cannot seed post ids",
                profile.id
            ))
        })?;
        let task = FetchTask::seed(&url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid post URL '{}': {}", url, e)))?;
        tasks.push(task);
    }

    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::{danbooru, safebooru};

    #[test]
    fn test_parse_single_ids_and_ranges() {
        assert_eq!(parse_post_ids("7").unwrap(), vec![7]);
        assert_eq!(parse_post_ids("1-4").unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(parse_post_ids(" 10 , 2-3 ,").unwrap(), vec![10, 2, 3]);
        assert_eq!(parse_post_ids("5-5").unwrap(), vec![5]);
        assert!(parse_post_ids("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(parse_post_ids("abc").is_err());
        assert!(parse_post_ids("3-1").is_err());
        assert!(parse_post_ids("1-").is_err());
        assert!(parse_post_ids("-4").is_err());
        assert!(parse_post_ids("0-2000000").is_err());
    }

    #[test]
    fn test_seed_tasks_urls_then_ids() {
        let urls = vec!["https://danbooru.donmai.us/posts/99".to_string()];
        let tasks = seed_tasks(&danbooru(), &urls, &[1, 2]).unwrap();

        let urls: Vec<&str> = tasks.iter().map(|t| t.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://danbooru.donmai.us/posts/99",
                "https://danbooru.donmai.us/posts/1",
                "https://danbooru.donmai.us/posts/2",
            ]
        );
        assert!(tasks.iter().all(|t| t.depth == 0 && t.origin_header.is_none()));
    }

    #[test]
    fn test_seed_ids_without_template() {
        let mut profile = safebooru();
        profile.post_url_template = None;
        assert!(seed_tasks(&profile, &[], &[1]).is_err());
        assert!(seed_tasks(&profile, &[], &[]).unwrap().is_empty());
    }

    #[test]
    fn test_seed_invalid_url() {
        let urls = vec!["not a url".to_string()];
        assert!(matches!(
            seed_tasks(&safebooru(), &urls, &[]),
            Err(ConfigError::InvalidUrl(_))
        ));
    }
}
