//! Per-request rendering state.

use super::registry::Page;
use super::resolve::{PageMode, Resolution};
use crate::models::{Gallery, Photo};
use std::sync::Arc;

/// An item bound while a container tag expands its body.
#[derive(Debug, Clone)]
pub enum Binding {
    Set(Gallery),
    Photo(Arc<Photo>),
}

/// State for one page render: the resolved page plus the stack of items bound
/// by enclosing iteration tags. Lives for a single request and is never shared.
#[derive(Debug, Clone)]
pub struct RenderContext {
    page: Page,
    owner: Option<String>,
    resolution: Resolution,
    bindings: Vec<Binding>,
}

impl RenderContext {
    pub fn new(page: Page, owner: Option<String>, resolution: Resolution) -> Self {
        Self {
            page,
            owner,
            resolution,
            bindings: Vec::new(),
        }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Gallery owner NSID configured for the page.
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    pub fn mode(&self) -> PageMode {
        self.resolution.mode
    }

    pub fn item(&self) -> Option<&str> {
        self.resolution.item.as_deref()
    }

    /// The set addressed by the URL, on a set page where it was found.
    pub fn page_gallery(&self) -> Option<&Gallery> {
        match self.resolution.mode {
            PageMode::Set => self.resolution.gallery.as_ref(),
            _ => None,
        }
    }

    /// True unless the URL addressed something below the page.
    pub fn is_index(&self) -> bool {
        self.item().is_none_or(str::is_empty)
    }

    /// True when the URL addressed a set or a tag list.
    pub fn has_gallery(&self) -> bool {
        !self.is_index() && matches!(self.mode(), PageMode::Set | PageMode::Tags)
    }

    /// Page title, replaced by the set's title on a set page.
    pub fn title(&self) -> &str {
        self.page_gallery()
            .map(|g| g.title.as_str())
            .unwrap_or(&self.page.title)
    }

    /// Page description, replaced by the set's description on a set page.
    pub fn description(&self) -> &str {
        self.page_gallery()
            .map(|g| g.description.as_str())
            .unwrap_or(&self.page.description)
    }

    pub fn push(&mut self, binding: Binding) {
        self.bindings.push(binding);
    }

    pub fn pop(&mut self) -> Option<Binding> {
        self.bindings.pop()
    }

    pub fn depth(&self) -> usize {
        self.bindings.len()
    }

    /// Innermost bound photo.
    pub fn current_photo(&self) -> Option<&Photo> {
        self.bindings.iter().rev().find_map(|b| match b {
            Binding::Photo(photo) => Some(photo.as_ref()),
            Binding::Set(_) => None,
        })
    }

    /// Innermost bound set, falling back to the page's own set.
    pub fn current_set(&self) -> Option<&Gallery> {
        self.bindings
            .iter()
            .rev()
            .find_map(|b| match b {
                Binding::Set(set) => Some(set),
                Binding::Photo(_) => None,
            })
            .or_else(|| self.page_gallery())
    }
}
