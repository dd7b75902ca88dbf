//! Web API module for the flickr-gallery application.

pub mod error;
pub mod galleries;
pub mod middleware;
pub mod pages;
pub mod routes;
pub mod status;

pub use routes::*;
