//! Set, photo and search handlers.

use axum::extract::{Path, Query, State};
use axum::response::Json;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{Gallery, Photo, SET_PAGE_SIZE, SearchQuery};
use crate::state::AppState;
use crate::web::error::{ApiError, OptionNotFoundExt};

const MAX_PAGING: u32 = 9999;

#[derive(Debug, Default, Deserialize)]
pub struct PagingParams {
    pub per_page: Option<u32>,
    pub page: Option<u32>,
}

impl PagingParams {
    fn checked(value: Option<u32>, name: &str) -> Result<Option<u32>, ApiError> {
        match value {
            Some(n) if !(1..=MAX_PAGING).contains(&n) => Err(ApiError::invalid_paging(name)),
            other => Ok(other),
        }
    }

    fn validate(&self) -> Result<(Option<u32>, Option<u32>), ApiError> {
        Ok((
            Self::checked(self.per_page, "per_page")?,
            Self::checked(self.page, "page")?,
        ))
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub user: Option<String>,
    pub tags: Option<String>,
    pub per_page: Option<u32>,
    pub page: Option<u32>,
}

#[derive(Serialize)]
pub struct PhotoResponse {
    #[serde(flatten)]
    photo: Photo,
    urls: BTreeMap<&'static str, String>,
}

impl From<&Photo> for PhotoResponse {
    fn from(photo: &Photo) -> Self {
        Self {
            urls: photo.image_urls(),
            photo: photo.clone(),
        }
    }
}

/// `GET /api/users/{user}/galleries`
pub(super) async fn list_galleries(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> Json<Vec<Gallery>> {
    Json(state.gallery_cache.cached_list_galleries(&user).await.to_vec())
}

/// `GET /api/galleries/{id}/photos`
pub(super) async fn list_photos(
    State(state): State<AppState>,
    Path(gallery_id): Path<String>,
    Query(params): Query<PagingParams>,
) -> Result<Json<Vec<PhotoResponse>>, ApiError> {
    let (per_page, page) = params.validate()?;
    let photos = state
        .gallery_cache
        .cached_list_photos(
            &gallery_id,
            per_page.unwrap_or(SET_PAGE_SIZE),
            page.unwrap_or(1),
        )
        .await;
    Ok(Json(photos.iter().map(|p| PhotoResponse::from(p.as_ref())).collect()))
}

/// `GET /api/photos/search`
pub(super) async fn search_photos(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<PhotoResponse>>, ApiError> {
    let (per_page, page) = PagingParams {
        per_page: params.per_page,
        page: params.page,
    }
    .validate()?;
    let query = SearchQuery::new(
        params.user.as_deref(),
        params.tags.as_deref(),
        per_page,
        page,
    )?;
    let photos = state.gallery_cache.cached_search_photos(&query).await;
    Ok(Json(photos.iter().map(|p| PhotoResponse::from(p.as_ref())).collect()))
}

/// `GET /api/photos/{id}`
pub(super) async fn get_photo(
    State(state): State<AppState>,
    Path(photo_id): Path<String>,
) -> Result<Json<PhotoResponse>, ApiError> {
    let photo = state
        .gallery_cache
        .cached_get_photo(&photo_id)
        .await
        .or_not_found(format!("photo {photo_id}"))?;
    Ok(Json(PhotoResponse::from(photo.as_ref())))
}
