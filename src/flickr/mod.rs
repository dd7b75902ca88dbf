//! Flickr REST client.
//!
//! [`PhotoService`] is the seam the rest of the crate depends on; [`FlickrClient`]
//! is the production implementation. Neither caches anything.

pub mod errors;
pub mod json;
mod wire;

pub use errors::FlickrError;

use crate::models::{Gallery, Photo, SearchQuery};
use crate::utils::log_if_slow;
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::de::DeserializeOwned;
use std::num::NonZeroU32;
use std::time::{Duration, Instant};
use tracing::{debug, trace};
use url::Url;
use wire::{
    PhotoInfoResponse, PhotosetListResponse, PhotosetPhotosResponse, SearchResponse, Stat,
};

/// Extra fields requested for photo listings so titles/descriptions and the
/// original rendition are available without a `getInfo` per photo.
const PHOTO_EXTRAS: &str = "description,original_format";

/// Upstream calls slower than this are logged.
const SLOW_CALL: Duration = Duration::from_secs(2);

/// Read-only access to a user's sets and photos.
#[async_trait]
pub trait PhotoService: Send + Sync {
    /// All sets owned by `user_id`, in the service's listing order.
    async fn list_galleries(&self, user_id: &str) -> Result<Vec<Gallery>, FlickrError>;

    /// One page of photos in a set.
    async fn list_photos(
        &self,
        gallery_id: &str,
        per_page: u32,
        page: u32,
    ) -> Result<Vec<Photo>, FlickrError>;

    async fn search_photos(&self, query: &SearchQuery) -> Result<Vec<Photo>, FlickrError>;

    async fn get_photo(&self, photo_id: &str) -> Result<Photo, FlickrError>;
}

/// Client settings, split out of the process config.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub api_key: String,
    pub requests_per_second: NonZeroU32,
    pub timeout: Duration,
}

pub struct FlickrClient {
    http: reqwest::Client,
    endpoint: Url,
    api_key: String,
    limiter: DefaultDirectRateLimiter,
}

impl FlickrClient {
    pub fn new(config: ClientConfig) -> anyhow::Result<Self> {
        let endpoint = Url::parse(&config.api_url)?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("flickr-gallery/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            endpoint,
            api_key: config.api_key,
            limiter: RateLimiter::direct(Quota::per_second(config.requests_per_second)),
        })
    }

    fn method_url(&self, method: &str, params: &[(&str, String)]) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("method", method)
            .append_pair("api_key", &self.api_key)
            .append_pair("format", "json")
            .append_pair("nojsoncallback", "1")
            .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));
        url
    }

    /// Invoke a REST method and decode its payload.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: &[(&str, String)],
    ) -> Result<T, FlickrError> {
        self.limiter.until_ready().await;

        let url = self.method_url(method, params);
        trace!(method, "calling Flickr");
        let start = Instant::now();
        let resp = self.http.get(url).send().await?;
        log_if_slow(start, SLOW_CALL, method);

        let status = resp.status();
        if !status.is_success() {
            return Err(FlickrError::Status {
                status: status.as_u16(),
            });
        }
        let body = resp.text().await?;

        let stat: Stat = json::parse_json_with_context(&body)
            .map_err(|source| FlickrError::ParseFailed { method, source })?;
        if stat.stat != "ok" {
            let code = stat.code.unwrap_or_default();
            let message = stat.message.unwrap_or_else(|| stat.stat.clone());
            debug!(method, code, message = %message, "Flickr returned a failure");
            return Err(FlickrError::from_service(code, message));
        }

        json::parse_json_with_context(&body)
            .map_err(|source| FlickrError::ParseFailed { method, source })
    }
}

#[async_trait]
impl PhotoService for FlickrClient {
    async fn list_galleries(&self, user_id: &str) -> Result<Vec<Gallery>, FlickrError> {
        let resp: PhotosetListResponse = self
            .call("flickr.photosets.getList", &[("user_id", user_id.to_owned())])
            .await?;
        Ok(resp
            .photosets
            .photoset
            .into_iter()
            .map(Gallery::from)
            .collect())
    }

    async fn list_photos(
        &self,
        gallery_id: &str,
        per_page: u32,
        page: u32,
    ) -> Result<Vec<Photo>, FlickrError> {
        let resp: PhotosetPhotosResponse = self
            .call(
                "flickr.photosets.getPhotos",
                &[
                    ("photoset_id", gallery_id.to_owned()),
                    ("per_page", per_page.to_string()),
                    ("page", page.to_string()),
                    ("extras", PHOTO_EXTRAS.to_owned()),
                ],
            )
            .await?;
        let owner = resp.photoset.owner;
        Ok(resp
            .photoset
            .photo
            .into_iter()
            .map(|raw| raw.into_photo(Some(&owner)))
            .collect())
    }

    async fn search_photos(&self, query: &SearchQuery) -> Result<Vec<Photo>, FlickrError> {
        let mut params = vec![
            ("per_page", query.per_page().to_string()),
            ("page", query.page().to_string()),
            ("extras", PHOTO_EXTRAS.to_owned()),
        ];
        if let Some(user) = query.user_id() {
            params.push(("user_id", user.to_owned()));
        }
        if let Some(tags) = query.tags() {
            params.push(("tags", tags.to_owned()));
        }

        let resp: SearchResponse = self.call("flickr.photos.search", &params).await?;
        Ok(resp
            .photos
            .photo
            .into_iter()
            .map(|raw| raw.into_photo(None))
            .collect())
    }

    async fn get_photo(&self, photo_id: &str) -> Result<Photo, FlickrError> {
        let resp: PhotoInfoResponse = self
            .call("flickr.photos.getInfo", &[("photo_id", photo_id.to_owned())])
            .await?;
        Ok(resp.photo.into_photo(None))
    }
}
