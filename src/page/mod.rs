//! Gallery pages: configuration, request path resolution and render state.

pub mod context;
pub mod registry;
pub mod resolve;
pub mod slug;

pub use context::{Binding, RenderContext};
pub use registry::{Page, PageRegistry, PageSettings};
pub use resolve::{PageMode, PathResolver, Resolution};

use crate::gallery::GalleryCache;

/// Resolve `path` against the configured pages and build the render state
/// for the page it belongs to. `None` when no page is mounted above `path`.
pub async fn render_context_for(
    registry: &PageRegistry,
    cache: &GalleryCache,
    path: &str,
) -> Option<RenderContext> {
    let page = registry.find_by_path(path)?;
    let owner = registry.owner_for(&page.id);
    let resolution = PathResolver::new(cache).resolve(path, &page.url, owner).await?;
    Some(RenderContext::new(
        page.clone(),
        owner.map(str::to_owned),
        resolution,
    ))
}
