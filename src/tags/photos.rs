use super::{Attributes, Expand, Renderer, TagError, expand_with};
use crate::models::{Photo, PhotoSize, SET_PAGE_SIZE, SearchQuery};
use crate::page::{Binding, PageMode, RenderContext};
use regex::Regex;
use std::sync::{Arc, LazyLock};
use tracing::debug;

static PAGING_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,4}$").expect("valid paging regex"));

fn paging(attrs: &Attributes, name: &'static str) -> Result<Option<u32>, TagError> {
    let Some(raw) = attrs.get(name) else {
        return Ok(None);
    };
    if !PAGING_VALUE.is_match(raw) {
        return Err(TagError::Paging(name));
    }
    match raw.parse::<u32>() {
        Ok(0) | Err(_) => Err(TagError::Paging(name)),
        Ok(n) => Ok(Some(n)),
    }
}

fn current_photo(ctx: &RenderContext) -> Result<&Photo, TagError> {
    ctx.current_photo().ok_or(TagError::NoPhoto)
}

/// Image URL of the bound photo at `size` (default medium).
pub fn photo_src(ctx: &RenderContext, attrs: &Attributes) -> Result<String, TagError> {
    let photo = current_photo(ctx)?;
    let size = match attrs.get("size") {
        Some(raw) => raw.parse::<PhotoSize>().map_err(TagError::Size)?,
        None => PhotoSize::default(),
    };
    Ok(photo.image_url(size))
}

pub fn photo_url(ctx: &RenderContext) -> Result<String, TagError> {
    Ok(current_photo(ctx)?.page_url.clone())
}

pub fn photo_title(ctx: &RenderContext) -> Result<String, TagError> {
    Ok(current_photo(ctx)?.title.clone())
}

pub fn photo_description(ctx: &RenderContext) -> Result<String, TagError> {
    Ok(current_photo(ctx)?.description.clone())
}

impl Renderer {
    /// Expand `body` once per photo, with the photo bound.
    ///
    /// Photos come from, in order of preference: the page's own set on a set
    /// page, the owner's photos with the page's tags on a tags page, the
    /// `set` attribute, or a search by `user` and `tags`. The page-derived
    /// sources only apply when none of those attributes is given.
    pub async fn photos(
        &self,
        ctx: &mut RenderContext,
        attrs: &Attributes,
        body: &mut dyn Expand,
    ) -> Result<String, TagError> {
        let per_page = paging(attrs, "per_page")?;
        let page = paging(attrs, "page")?;
        let explicit = ["set", "user", "tags"].iter().any(|a| attrs.present(a));

        let photos: Arc<Vec<Arc<Photo>>> = match (ctx.mode(), attrs.get("set")) {
            (PageMode::Set, None) if !explicit => {
                let set = ctx.page_gallery().ok_or(TagError::SetNotFound)?;
                self.cache
                    .cached_list_photos(
                        &set.id,
                        per_page.unwrap_or(SET_PAGE_SIZE),
                        page.unwrap_or(1),
                    )
                    .await
            }
            (PageMode::Tags, None) if !explicit => {
                let query = SearchQuery::new(ctx.owner(), ctx.item(), per_page, page)?;
                self.cache.cached_search_photos(&query).await
            }
            (_, Some(set_id)) => {
                self.cache
                    .cached_list_photos(
                        set_id,
                        per_page.unwrap_or(SET_PAGE_SIZE),
                        page.unwrap_or(1),
                    )
                    .await
            }
            _ if explicit => {
                let query = SearchQuery::new(attrs.get("user"), attrs.get("tags"), per_page, page)?;
                self.cache.cached_search_photos(&query).await
            }
            _ => return Err(TagError::PhotosSource),
        };

        debug!(count = photos.len(), "expanding photos");
        let mut out = String::new();
        for photo in photos.iter() {
            out.push_str(&expand_with(ctx, Binding::Photo(photo.clone()), body).await?);
        }
        Ok(out)
    }
}
