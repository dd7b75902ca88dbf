//! Render operations exposed to the page templating engine.
//!
//! Value operations read from the [`RenderContext`] and return a string.
//! Container operations bind an item, expand a body supplied by the engine
//! through [`Expand`], and unbind it again, concatenating one expansion per
//! item when they iterate.

mod page;
mod photos;
mod sets;
mod slideshow;

pub use page::{gallery_url, if_gallery, if_index, link, unless_gallery, unless_index};
pub use photos::{photo_description, photo_src, photo_title, photo_url};
pub use sets::{SetField, primary_src, set_description, set_field, set_title, set_url};
pub use slideshow::slideshow;

use crate::gallery::GalleryCache;
use crate::models::QueryError;
use crate::page::{Binding, RenderContext};
use async_trait::async_trait;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TagError {
    #[error("slideshow tag requires a Flickr NSID in the `user' attribute")]
    SlideshowUser,
    #[error("slideshow tag must have either a `set' or `tags' attribute, not both")]
    SlideshowBothSources,
    #[error("slideshow tag must have a `set' or `tags' attribute")]
    SlideshowNoSource,
    #[error("`{0}' attribute of `photos' tag must be a positive number between 1 and 4 digits")]
    Paging(&'static str),
    #[error("The `photos' tag requires at least one `user' `tags' or `set' attribute.")]
    PhotosSource,
    #[error("The `sets' tag requires at least the `user' attribute.")]
    SetsUser,
    #[error("you are on a set page, but we could not find the set of the page")]
    SetNotFound,
    #[error("if you are not in a set context you must provide a set attribute")]
    SetRequired,
    #[error("no photo is in scope here")]
    NoPhoto,
    #[error("no set is in scope here")]
    NoSet,
    #[error("unknown photo size `{0}'")]
    Size(String),
    #[error("unknown set field `{0}'")]
    SetField(String),
    #[error(transparent)]
    Query(#[from] QueryError),
    /// Raised by the host engine while expanding a body.
    #[error("{0}")]
    Engine(String),
}

/// A container tag's body, expanded once per bound item.
#[async_trait]
pub trait Expand: Send {
    async fn expand(&mut self, ctx: &mut RenderContext) -> Result<String, TagError>;
}

#[async_trait]
impl<F> Expand for F
where
    F: FnMut(&RenderContext) -> Result<String, TagError> + Send,
{
    async fn expand(&mut self, ctx: &mut RenderContext) -> Result<String, TagError> {
        self(ctx)
    }
}

/// Tag attributes as written in the template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(BTreeMap<String, String>);

impl Attributes {
    /// Trimmed attribute value. Blank values count as absent.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn present(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Bind `binding` for the duration of one body expansion. The binding is
/// removed again whether or not the body succeeds.
async fn expand_with(
    ctx: &mut RenderContext,
    binding: Binding,
    body: &mut dyn Expand,
) -> Result<String, TagError> {
    ctx.push(binding);
    let out = body.expand(ctx).await;
    ctx.pop();
    out
}

/// Render operations that need Flickr data. Cheap to clone; every clone
/// shares the same cache.
#[derive(Clone)]
pub struct Renderer {
    cache: GalleryCache,
}

impl Renderer {
    pub fn new(cache: GalleryCache) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &GalleryCache {
        &self.cache
    }
}
