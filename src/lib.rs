//! Flickr sets and photos for gallery pages.
//!
//! [`gallery::GalleryCache`] fronts the Flickr API with a TTL cache,
//! [`page`] maps request paths onto configured gallery pages, and [`tags`]
//! provides the render operations templates call.

pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod flickr;
pub mod gallery;
pub mod logging;
pub mod models;
pub mod page;
pub mod state;
pub mod tags;
pub mod utils;
pub mod web;
