//! Configured gallery pages and their settings.

use crate::utils::clean_path;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-page settings as they appear in the config file.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct PageSettings {
    /// Base URL the page is mounted at, e.g. `/photos`.
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Gallery owner NSID; blank means "use the default owner".
    #[serde(default)]
    pub user: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    pub id: String,
    /// Cleaned base URL, always with leading and trailing slash.
    pub url: String,
    pub title: String,
    pub description: String,
    #[serde(skip)]
    user: Option<String>,
}

impl Page {
    pub fn new(id: impl Into<String>, settings: PageSettings) -> Self {
        Self {
            id: id.into(),
            url: clean_path(&settings.url),
            title: settings.title,
            description: settings.description,
            user: settings
                .user
                .map(|u| u.trim().to_owned())
                .filter(|u| !u.is_empty()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PageRegistry {
    pages: Vec<Page>,
    default_user: Option<String>,
}

impl PageRegistry {
    pub fn new(pages: BTreeMap<String, PageSettings>, default_user: Option<String>) -> Self {
        Self {
            pages: pages
                .into_iter()
                .map(|(id, settings)| Page::new(id, settings))
                .collect(),
            default_user: default_user.filter(|u| !u.trim().is_empty()),
        }
    }

    pub fn get(&self, page_id: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.id == page_id)
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Gallery owner for a page: its own `user` setting if non-blank, else the
    /// process-wide default.
    pub fn owner_for(&self, page_id: &str) -> Option<&str> {
        self.get(page_id)
            .and_then(|p| p.user.as_deref())
            .or(self.default_user.as_deref())
    }

    /// The page mounted at the longest base URL that prefixes `path`.
    pub fn find_by_path(&self, path: &str) -> Option<&Page> {
        let path = clean_path(path);
        self.pages
            .iter()
            .filter(|p| path.starts_with(&p.url))
            .max_by_key(|p| p.url.len())
    }
}
