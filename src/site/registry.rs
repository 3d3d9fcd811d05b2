use crate::site::{danbooru, gelbooru, safebooru, SiteProfile};
use crate::url::AllowList;
use crate::ConfigError;
use std::sync::Arc;

/// Read-only lookup table from site identifiers to profiles
///
/// Built once at startup; profiles are handed out as `Arc`s so workers can
/// share them without locking.
#[derive(Debug, Clone, Default)]
pub struct SiteRegistry {
    profiles: Vec<Arc<SiteProfile>>,
}

impl SiteRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the Safebooru, Danbooru and Gelbooru profiles
    pub fn builtin() -> Self {
        Self::new().with_profiles([safebooru(), danbooru(), gelbooru()])
    }

    /// Adds profiles, replacing any existing profile with the same id
    pub fn with_profiles<I>(mut self, profiles: I) -> Self
    where
        I: IntoIterator<Item = SiteProfile>,
    {
        for profile in profiles {
            self.insert(profile);
        }
        self
    }

    /// Adds a profile, replacing any existing profile with the same id
    pub fn insert(&mut self, profile: SiteProfile) {
        let profile = Arc::new(profile);
        match self
            .profiles
            .iter_mut()
            .find(|p| p.id.eq_ignore_ascii_case(&profile.id))
        {
            Some(existing) => {
                tracing::debug!("Replacing site profile '{}'", profile.id);
                *existing = profile;
            }
            None => self.profiles.push(profile),
        }
    }

    /// Resolves a site identifier or synonym to its profile
    ///
    /// # Examples
    ///
    /// ```
    /// use tagsift::site::SiteRegistry;
    ///
    /// let registry = SiteRegistry::builtin();
    /// assert_eq!(registry.get("safe").unwrap().id, "safebooru");
    /// assert_eq!(registry.get("Danbooru").unwrap().id, "danbooru");
    /// assert!(registry.get("yandere").is_none());
    /// ```
    pub fn get(&self, name: &str) -> Option<Arc<SiteProfile>> {
        self.profiles.iter().find(|p| p.answers_to(name)).cloned()
    }

    /// Like [`get`](Self::get), but reports an unknown site as a config error
    pub fn resolve(&self, name: &str) -> Result<Arc<SiteProfile>, ConfigError> {
        self.get(name)
            .ok_or_else(|| ConfigError::UnknownSite(name.to_string()))
    }

    /// Allow-list covering the domain of every registered profile
    pub fn allowed_domains(&self) -> AllowList {
        AllowList::new(self.profiles.iter().map(|p| p.allowed_domain.as_str()))
    }

    /// Canonical ids of all registered sites
    pub fn site_ids(&self) -> Vec<&str> {
        self.profiles.iter().map(|p| p.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
