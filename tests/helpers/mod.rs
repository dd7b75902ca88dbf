//! Shared fixtures: a scripted `PhotoService` that counts its calls.
#![allow(dead_code)]

use async_trait::async_trait;
use flickr_gallery::cache::StalePolicy;
use flickr_gallery::flickr::{FlickrError, PhotoService};
use flickr_gallery::gallery::GalleryCache;
use flickr_gallery::models::{Gallery, Photo, SearchQuery, Visibility, photo_page_url};
use flickr_gallery::page::{PageRegistry, PageSettings};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const OWNER: &str = "12345678@N07";
pub const TTL: Duration = Duration::from_secs(60);

pub fn gallery(id: &str, title: &str, primary: &str) -> Gallery {
    Gallery {
        id: id.to_owned(),
        title: title.to_owned(),
        description: format!("{title} description"),
        num_photos: 2,
        primary: primary.to_owned(),
    }
}

pub fn photo(id: &str, title: &str) -> Photo {
    Photo {
        id: id.to_owned(),
        owner: OWNER.to_owned(),
        secret: "s3cr3t".to_owned(),
        server: "65535".to_owned(),
        farm: 66,
        original_secret: None,
        original_format: None,
        visibility: Visibility {
            is_public: true,
            ..Default::default()
        },
        title: title.to_owned(),
        description: String::new(),
        page_url: photo_page_url(OWNER, id),
    }
}

#[derive(Default)]
pub struct StubService {
    pub galleries: Vec<Gallery>,
    pub set_photos: Vec<Photo>,
    pub search_results: Vec<Photo>,
    /// Every call fails with a transport-level error while set.
    pub failing: AtomicBool,
    /// Artificial latency per call.
    pub delay: Option<Duration>,
    pub list_galleries_calls: AtomicUsize,
    pub list_photos_calls: AtomicUsize,
    pub search_calls: AtomicUsize,
    pub get_photo_calls: AtomicUsize,
    pub last_search: Mutex<Option<SearchQuery>>,
}

impl StubService {
    pub fn with_fixtures() -> Self {
        Self {
            galleries: vec![
                gallery("721", "Summer Trip", "101"),
                gallery("722", "Winter Walks", "201"),
                gallery("723", "Été à Paris", ""),
            ],
            set_photos: vec![photo("101", "Beach"), photo("102", "Dunes")],
            search_results: vec![photo("301", "Photo 1"), photo("302", "Photo 2")],
            ..Default::default()
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    async fn enter(&self, counter: &AtomicUsize) -> Result<(), FlickrError> {
        counter.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(FlickrError::Status { status: 503 });
        }
        Ok(())
    }
}

#[async_trait]
impl PhotoService for StubService {
    async fn list_galleries(&self, _user_id: &str) -> Result<Vec<Gallery>, FlickrError> {
        self.enter(&self.list_galleries_calls).await?;
        Ok(self.galleries.clone())
    }

    async fn list_photos(
        &self,
        gallery_id: &str,
        _per_page: u32,
        _page: u32,
    ) -> Result<Vec<Photo>, FlickrError> {
        self.enter(&self.list_photos_calls).await?;
        if self.galleries.iter().any(|g| g.id == gallery_id) {
            Ok(self.set_photos.clone())
        } else {
            Err(FlickrError::NotFound(format!("Photoset {gallery_id} not found")))
        }
    }

    async fn search_photos(&self, query: &SearchQuery) -> Result<Vec<Photo>, FlickrError> {
        self.enter(&self.search_calls).await?;
        *self.last_search.lock().unwrap() = Some(query.clone());
        Ok(self.search_results.clone())
    }

    async fn get_photo(&self, photo_id: &str) -> Result<Photo, FlickrError> {
        self.enter(&self.get_photo_calls).await?;
        self.set_photos
            .iter()
            .chain(&self.search_results)
            .find(|p| p.id == photo_id)
            .cloned()
            .ok_or_else(|| FlickrError::NotFound(format!("Photo {photo_id} not found")))
    }
}

pub fn stub() -> Arc<StubService> {
    Arc::new(StubService::with_fixtures())
}

pub fn cache_for(service: &Arc<StubService>) -> GalleryCache {
    GalleryCache::new(service.clone(), TTL, StalePolicy::ServeStale)
}

/// One page at `/photos` owned by [`OWNER`] through the default owner.
pub fn registry() -> PageRegistry {
    let mut pages = BTreeMap::new();
    pages.insert(
        "photos".to_owned(),
        PageSettings {
            url: "/photos".to_owned(),
            title: "Photos".to_owned(),
            description: "Everything".to_owned(),
            user: None,
        },
    );
    PageRegistry::new(pages, Some(OWNER.to_owned()))
}
