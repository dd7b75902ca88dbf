//! Request path → gallery page state.
//!
//! A gallery page mounted at `/photos/` answers for:
//!
//! - `/photos/`: the index of the owner's sets
//! - `/photos/<slug>/` or `/photos/<slug>/set/`: one set, matched by slug
//! - `/photos/<tags>/tags/`: photos carrying the given tags
//!
//! Anything else under the base URL resolves to [`PageMode::Unknown`].

use crate::gallery::GalleryCache;
use crate::models::Gallery;
use crate::utils::clean_path;
use regex::Regex;
use serde::Serialize;
use std::sync::{Arc, LazyLock};
use tracing::debug;

static ITEM_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([\w-]+)/?(set|tags)?/?$").expect("valid item path regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageMode {
    Index,
    Set,
    Tags,
    Unknown,
}

/// Outcome of resolving a path against a page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub mode: PageMode,
    /// Path segment after the base URL (slug, tag list or raw remainder).
    pub item: Option<String>,
    /// The matched set on a set page. `None` there means "not found".
    pub gallery: Option<Gallery>,
    /// The owner's sets, loaded for index and set pages.
    #[serde(skip)]
    pub galleries: Arc<Vec<Gallery>>,
}

impl Resolution {
    /// State for a page rendered without path resolution.
    pub fn unresolved() -> Self {
        Self {
            mode: PageMode::Unknown,
            item: None,
            gallery: None,
            galleries: Arc::default(),
        }
    }

    fn new(mode: PageMode, item: Option<String>) -> Self {
        Self {
            mode,
            item,
            ..Self::unresolved()
        }
    }
}

/// Split the part of a path below the page's base URL into
/// `(segment, mode)`. `None` means the remainder isn't an item path.
pub(crate) fn parse_item(remainder: &str) -> Option<(&str, PageMode)> {
    let caps = ITEM_PATH.captures(remainder)?;
    let segment = caps.get(1)?.as_str();
    let mode = match caps.get(2).map(|m| m.as_str()) {
        Some("tags") => PageMode::Tags,
        _ => PageMode::Set,
    };
    Some((segment, mode))
}

pub struct PathResolver<'a> {
    cache: &'a GalleryCache,
}

impl<'a> PathResolver<'a> {
    pub fn new(cache: &'a GalleryCache) -> Self {
        Self { cache }
    }

    /// Resolve `path` against a page mounted at `base_url`.
    ///
    /// Returns `None` when the path isn't under the base URL, leaving it to
    /// whatever routing comes next. `owner` is the NSID whose sets are listed;
    /// without one, set pages resolve with no gallery bound.
    pub async fn resolve(
        &self,
        path: &str,
        base_url: &str,
        owner: Option<&str>,
    ) -> Option<Resolution> {
        let path = clean_path(path);
        let base = clean_path(base_url);
        let remainder = path.strip_prefix(&base)?;

        if remainder.is_empty() {
            let mut resolution = Resolution::new(PageMode::Index, None);
            resolution.galleries = self.galleries(owner).await;
            return Some(resolution);
        }

        let Some((segment, mode)) = parse_item(remainder) else {
            debug!(path = %path, "path below gallery page is not an item path");
            return Some(Resolution::new(
                PageMode::Unknown,
                Some(remainder.trim_end_matches('/').to_owned()),
            ));
        };

        let mut resolution = Resolution::new(mode, Some(segment.to_owned()));
        if mode == PageMode::Set {
            resolution.galleries = self.galleries(owner).await;
            // First match in listing order wins when two titles share a slug.
            resolution.gallery = resolution
                .galleries
                .iter()
                .find(|g| g.slug() == segment)
                .cloned();
            if resolution.gallery.is_none() {
                debug!(slug = segment, "no set matches requested slug");
            }
        }
        Some(resolution)
    }

    async fn galleries(&self, owner: Option<&str>) -> Arc<Vec<Gallery>> {
        match owner {
            Some(owner) => self.cache.cached_list_galleries(owner).await,
            None => {
                debug!("gallery page has no owner configured");
                Arc::default()
            }
        }
    }
}
