//! Page resolution and embed handlers.

use axum::extract::{Query, State};
use axum::response::{Html, Json};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use async_trait::async_trait;

use crate::models::Gallery;
use crate::page::{PageMode, RenderContext};
use crate::state::AppState;
use crate::tags::{self, Attributes, Expand, TagError};
use crate::web::error::{ApiError, OptionNotFoundExt};

#[derive(Debug, Deserialize)]
pub struct ResolveParams {
    pub path: String,
}

#[derive(Serialize)]
pub struct ResolveResponse {
    page: String,
    mode: PageMode,
    item: Option<String>,
    gallery: Option<Gallery>,
    title: String,
    description: String,
    is_index: bool,
    has_gallery: bool,
    galleries: Vec<Gallery>,
}

/// `GET /api/resolve?path=`
pub(super) async fn resolve(
    State(state): State<AppState>,
    Query(params): Query<ResolveParams>,
) -> Result<Json<ResolveResponse>, ApiError> {
    let ctx = state
        .render_context(&params.path)
        .await
        .or_not_found(format!("gallery page for {}", params.path))?;

    Ok(Json(ResolveResponse {
        page: ctx.page().id.clone(),
        mode: ctx.mode(),
        item: ctx.item().map(str::to_owned),
        gallery: ctx.page_gallery().cloned(),
        title: ctx.title().to_owned(),
        description: ctx.description().to_owned(),
        is_index: ctx.is_index(),
        has_gallery: ctx.has_gallery(),
        galleries: ctx.resolution().galleries.to_vec(),
    }))
}

/// `GET /api/slideshow?user&set&tags`
pub(super) async fn slideshow(
    Query(params): Query<HashMap<String, String>>,
) -> Result<Html<String>, ApiError> {
    let attrs: Attributes = params.into_iter().collect();
    Ok(Html(tags::slideshow(&attrs)?))
}

/// One `<li>` link per set.
struct SetLinks;

#[async_trait]
impl Expand for SetLinks {
    async fn expand(&mut self, ctx: &mut RenderContext) -> Result<String, TagError> {
        let link = tags::link(ctx, &Attributes::default(), None).await?;
        Ok(format!("<li>{link}</li>"))
    }
}

fn thumbnail(ctx: &RenderContext) -> Result<String, TagError> {
    let size: Attributes = [("size", "thumbnail")].into_iter().collect();
    Ok(format!(
        r#"<a href="{}"><img src="{}" alt="{}"></a>"#,
        html_escape::encode_double_quoted_attribute(&tags::photo_url(ctx)?),
        html_escape::encode_double_quoted_attribute(&tags::photo_src(ctx, &size)?),
        html_escape::encode_double_quoted_attribute(&tags::photo_title(ctx)?),
    ))
}

/// `GET /api/render?path=`
///
/// Minimal HTML for a gallery path: the set list on an index page, the photo
/// grid on a set or tags page.
pub(super) async fn render(
    State(state): State<AppState>,
    Query(params): Query<ResolveParams>,
) -> Result<Html<String>, ApiError> {
    let mut ctx = state
        .render_context(&params.path)
        .await
        .or_not_found(format!("gallery page for {}", params.path))?;
    if ctx.mode() == PageMode::Set && ctx.page_gallery().is_none() {
        return Err(ApiError::not_found(format!("set for {}", params.path)));
    }
    let renderer = state.renderer();

    let body = if ctx.is_index() {
        if ctx.owner().is_none() {
            return Err(ApiError::not_found(format!(
                "gallery owner for page {}",
                ctx.page().id
            )));
        }
        let sets = renderer
            .sets(&mut ctx, &Attributes::default(), &mut SetLinks)
            .await?;
        format!("<ul>{sets}</ul>")
    } else if ctx.has_gallery() {
        let photos = renderer
            .photos(&mut ctx, &Attributes::default(), &mut thumbnail)
            .await?;
        format!(r#"<div class="photos">{photos}</div>"#)
    } else {
        return Err(ApiError::not_found(format!("gallery item {}", params.path)));
    };

    Ok(Html(format!(
        "<h1>{}</h1>\n{body}\n",
        html_escape::encode_text(ctx.title())
    )))
}
