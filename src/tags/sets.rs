use super::photos::photo_src;
use super::{Attributes, Expand, Renderer, TagError, expand_with};
use crate::models::Gallery;
use crate::page::{Binding, PageMode, RenderContext};
use crate::utils::join_path;
use std::str::FromStr;
use tracing::debug;

/// Set attributes a template can print directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetField {
    Title,
    Description,
    NumPhotos,
    Id,
}

impl FromStr for SetField {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(Self::Title),
            "description" => Ok(Self::Description),
            "num_photos" => Ok(Self::NumPhotos),
            "id" => Ok(Self::Id),
            other => Err(TagError::SetField(other.to_owned())),
        }
    }
}

fn current_set(ctx: &RenderContext) -> Result<&Gallery, TagError> {
    ctx.current_set().ok_or(TagError::NoSet)
}

pub fn set_field(ctx: &RenderContext, field: SetField) -> Result<String, TagError> {
    let set = current_set(ctx)?;
    Ok(match field {
        SetField::Title => set.title.clone(),
        SetField::Description => set.description.clone(),
        SetField::NumPhotos => set.num_photos.to_string(),
        SetField::Id => set.id.clone(),
    })
}

pub fn set_title(ctx: &RenderContext) -> Result<String, TagError> {
    set_field(ctx, SetField::Title)
}

pub fn set_description(ctx: &RenderContext) -> Result<String, TagError> {
    set_field(ctx, SetField::Description)
}

/// Local URL of the bound set: `path` (default the page URL) joined with the
/// set's slug.
pub fn set_url(ctx: &RenderContext, attrs: &Attributes) -> Result<String, TagError> {
    let set = current_set(ctx)?;
    let base = attrs.get("path").unwrap_or(&ctx.page().url);
    Ok(join_path(base, &set.slug()))
}

/// Image URL of the photo bound by [`Renderer::primary`].
pub fn primary_src(ctx: &RenderContext, attrs: &Attributes) -> Result<String, TagError> {
    photo_src(ctx, attrs)
}

impl Renderer {
    /// Expand `body` once per set owned by `user`, or by the page's gallery
    /// owner when the attribute is left out.
    pub async fn sets(
        &self,
        ctx: &mut RenderContext,
        attrs: &Attributes,
        body: &mut dyn Expand,
    ) -> Result<String, TagError> {
        let user = attrs
            .get("user")
            .or(ctx.owner())
            .ok_or(TagError::SetsUser)?
            .to_owned();
        let sets = self.cache.cached_list_galleries(&user).await;

        let mut out = String::new();
        for set in sets.iter() {
            out.push_str(&expand_with(ctx, Binding::Set(set.clone()), body).await?);
        }
        Ok(out)
    }

    /// Expand `body` with one set bound: the page's own set on a set page,
    /// otherwise the one named by the `set` attribute. Renders nothing when
    /// the named set isn't in the owner's listing.
    pub async fn set(
        &self,
        ctx: &mut RenderContext,
        attrs: &Attributes,
        body: &mut dyn Expand,
    ) -> Result<String, TagError> {
        let set = match (attrs.get("set"), ctx.mode()) {
            (None, PageMode::Set) => ctx.page_gallery().cloned().ok_or(TagError::SetNotFound)?,
            (None, _) => return Err(TagError::SetRequired),
            (Some(set_id), _) => {
                let Some(owner) = attrs.get("user").or(ctx.owner()) else {
                    debug!(set_id, "no owner to look the set up under");
                    return Ok(String::new());
                };
                match self.cache.find_gallery(owner, set_id).await {
                    Some(set) => set,
                    None => {
                        debug!(set_id, owner, "set not found in owner's listing");
                        return Ok(String::new());
                    }
                }
            }
        };
        expand_with(ctx, Binding::Set(set), body).await
    }

    /// Expand `body` with the current set's cover photo bound. Renders
    /// nothing when the photo can't be fetched.
    pub async fn primary(
        &self,
        ctx: &mut RenderContext,
        body: &mut dyn Expand,
    ) -> Result<String, TagError> {
        let primary = current_set(ctx)?.primary.clone();
        if primary.is_empty() {
            return Ok(String::new());
        }
        match self.cache.cached_get_photo(&primary).await {
            Some(photo) => expand_with(ctx, Binding::Photo(photo), body).await,
            None => Ok(String::new()),
        }
    }
}
