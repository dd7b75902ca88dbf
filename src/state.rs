//! Application state shared across request handlers.

use crate::gallery::GalleryCache;
use crate::page::{PageRegistry, RenderContext, render_context_for};
use crate::tags::Renderer;
use std::sync::Arc;
use std::time::Instant;

#[derive(Clone)]
pub struct AppState {
    pub gallery_cache: GalleryCache,
    pub pages: Arc<PageRegistry>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(gallery_cache: GalleryCache, pages: PageRegistry) -> Self {
        Self {
            gallery_cache,
            pages: Arc::new(pages),
            started_at: Instant::now(),
        }
    }

    /// Render state for the page mounted above `path`, if any.
    pub async fn render_context(&self, path: &str) -> Option<RenderContext> {
        render_context_for(&self.pages, &self.gallery_cache, path).await
    }

    pub fn renderer(&self) -> Renderer {
        Renderer::new(self.gallery_cache.clone())
    }
}
