//! Cached access to a user's sets and photos.
//!
//! Every [`PhotoService`] call goes through a [`TtlCache`]. Upstream failures
//! stop here: they are logged and turned into "no results", so a page renders
//! with an empty gallery instead of failing.

use crate::cache::{StalePolicy, TtlCache};
use crate::flickr::{FlickrError, PhotoService};
use crate::models::{Gallery, Photo, SearchQuery};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use url::form_urlencoded;

/// Build a cache key from an operation name and its parameters.
///
/// Values are form-encoded, so a separator inside a value can't make two
/// different parameter sets produce the same key. Absent parameters are left
/// out entirely.
pub fn cache_key(operation: &str, params: &[(&str, Option<&str>)]) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    for (name, value) in params {
        if let Some(value) = value {
            query.append_pair(name, value);
        }
    }
    format!("{operation}?{}", query.finish())
}

/// Number of live entries per operation, for the status endpoint.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CacheStats {
    pub gallery_lists: usize,
    pub photo_lists: usize,
    pub photos: usize,
}

/// Shared, clone-cheap cache in front of a [`PhotoService`].
#[derive(Clone)]
pub struct GalleryCache {
    service: Arc<dyn PhotoService>,
    ttl: Duration,
    galleries: TtlCache<Vec<Gallery>, FlickrError>,
    /// Set listings and searches; photos are shared with whoever binds them.
    photo_lists: TtlCache<Vec<Arc<Photo>>, FlickrError>,
    photos: TtlCache<Photo, FlickrError>,
}

impl GalleryCache {
    pub fn new(service: Arc<dyn PhotoService>, ttl: Duration, stale: StalePolicy) -> Self {
        Self {
            service,
            ttl,
            galleries: TtlCache::new(stale),
            photo_lists: TtlCache::new(stale),
            photos: TtlCache::new(stale),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sets owned by `user_id`; empty when Flickr can't be reached.
    pub async fn cached_list_galleries(&self, user_id: &str) -> Arc<Vec<Gallery>> {
        let key = cache_key("photosets.getList", &[("user_id", Some(user_id))]);
        let service = self.service.clone();
        let user_id = user_id.to_owned();
        self.galleries
            .get_or_else(
                &key,
                self.ttl,
                || async move { service.list_galleries(&user_id).await },
                |e| {
                    log_failure("sets", &key, e);
                    Vec::new()
                },
            )
            .await
    }

    /// One page of a set's photos; empty on failure.
    pub async fn cached_list_photos(
        &self,
        gallery_id: &str,
        per_page: u32,
        page: u32,
    ) -> Arc<Vec<Arc<Photo>>> {
        let (per_page_s, page_s) = (per_page.to_string(), page.to_string());
        let key = cache_key(
            "photosets.getPhotos",
            &[
                ("photoset_id", Some(gallery_id)),
                ("per_page", Some(per_page_s.as_str())),
                ("page", Some(page_s.as_str())),
            ],
        );
        let service = self.service.clone();
        let gallery_id = gallery_id.to_owned();
        self.photo_lists
            .get_or_else(
                &key,
                self.ttl,
                || async move {
                    service
                        .list_photos(&gallery_id, per_page, page)
                        .await
                        .map(shared)
                },
                |e| {
                    log_failure("set photos", &key, e);
                    Vec::new()
                },
            )
            .await
    }

    /// Search results; empty on failure. The query was validated when built.
    pub async fn cached_search_photos(&self, query: &SearchQuery) -> Arc<Vec<Arc<Photo>>> {
        let (per_page_s, page_s) = (query.per_page().to_string(), query.page().to_string());
        let key = cache_key(
            "photos.search",
            &[
                ("user_id", query.user_id()),
                ("tags", query.tags()),
                ("per_page", Some(per_page_s.as_str())),
                ("page", Some(page_s.as_str())),
            ],
        );
        let service = self.service.clone();
        let query = query.clone();
        self.photo_lists
            .get_or_else(
                &key,
                self.ttl,
                || async move { service.search_photos(&query).await.map(shared) },
                |e| {
                    log_failure("photos", &key, e);
                    Vec::new()
                },
            )
            .await
    }

    /// A single photo, or `None` if it doesn't exist or can't be fetched.
    pub async fn cached_get_photo(&self, photo_id: &str) -> Option<Arc<Photo>> {
        let key = cache_key("photos.getInfo", &[("photo_id", Some(photo_id))]);
        let service = self.service.clone();
        let photo_id = photo_id.to_owned();
        self.photos
            .get_or_compute(&key, self.ttl, || async move {
                service.get_photo(&photo_id).await
            })
            .await
            .inspect_err(|e| log_failure("photo info", &key, e))
            .ok()
    }

    /// Look a set up by id in its owner's listing.
    pub async fn find_gallery(&self, user_id: &str, gallery_id: &str) -> Option<Gallery> {
        self.cached_list_galleries(user_id)
            .await
            .iter()
            .find(|g| g.id == gallery_id)
            .cloned()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            gallery_lists: self.galleries.len(),
            photo_lists: self.photo_lists.len(),
            photos: self.photos.len(),
        }
    }

    /// Drop expired entries from every cache.
    pub fn purge_expired(&self) -> usize {
        self.galleries.purge_expired()
            + self.photo_lists.purge_expired()
            + self.photos.purge_expired()
    }

    /// Spawn a task that purges expired entries every `interval` (at least
    /// once a second). The task runs until the process exits.
    pub fn spawn_purge(&self, interval: Duration) {
        let cache = self.clone();
        let interval = interval.max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // skip the immediate first tick
            loop {
                ticker.tick().await;
                let purged = cache.purge_expired();
                if purged > 0 {
                    info!(purged, "Purged expired gallery cache entries");
                }
            }
        });
    }
}

fn shared(photos: Vec<Photo>) -> Vec<Arc<Photo>> {
    photos.into_iter().map(Arc::new).collect()
}

fn log_failure(what: &str, key: &str, error: &FlickrError) {
    if error.is_not_found() {
        warn!(key, error = %error, "Flickr has no {what} for this request");
    } else {
        warn!(key, error = ?error, "Unable to fetch Flickr {what}");
    }
}
