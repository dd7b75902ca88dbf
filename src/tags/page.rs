use super::{Attributes, Expand, TagError};
use crate::page::RenderContext;
use crate::utils::join_path;
use std::fmt::Write as _;

async fn expand_if(
    cond: bool,
    ctx: &mut RenderContext,
    body: &mut dyn Expand,
) -> Result<String, TagError> {
    if cond {
        body.expand(ctx).await
    } else {
        Ok(String::new())
    }
}

pub async fn if_index(ctx: &mut RenderContext, body: &mut dyn Expand) -> Result<String, TagError> {
    expand_if(ctx.is_index(), ctx, body).await
}

pub async fn unless_index(
    ctx: &mut RenderContext,
    body: &mut dyn Expand,
) -> Result<String, TagError> {
    expand_if(!ctx.is_index(), ctx, body).await
}

pub async fn if_gallery(ctx: &mut RenderContext, body: &mut dyn Expand) -> Result<String, TagError> {
    expand_if(ctx.has_gallery(), ctx, body).await
}

pub async fn unless_gallery(
    ctx: &mut RenderContext,
    body: &mut dyn Expand,
) -> Result<String, TagError> {
    expand_if(!ctx.has_gallery(), ctx, body).await
}

/// URL of the current set under the page's base URL.
pub fn gallery_url(ctx: &RenderContext) -> Result<String, TagError> {
    let set = ctx.current_set().ok_or(TagError::NoSet)?;
    Ok(join_path(&ctx.page().url, &set.slug()))
}

/// Anchor to the current set. `anchor` becomes the URL fragment; every other
/// attribute is rendered on the element. The link text is the expanded body,
/// or the set title when the tag has none.
pub async fn link(
    ctx: &mut RenderContext,
    attrs: &Attributes,
    body: Option<&mut dyn Expand>,
) -> Result<String, TagError> {
    let mut href = gallery_url(ctx)?;
    if let Some(anchor) = attrs.get("anchor") {
        href.push('#');
        href.push_str(anchor);
    }

    let mut rendered = String::new();
    for (name, value) in attrs.iter().filter(|(name, _)| *name != "anchor") {
        let _ = write!(
            rendered,
            r#" {}="{}""#,
            name.to_lowercase(),
            html_escape::encode_double_quoted_attribute(value)
        );
    }

    let text = match body {
        Some(body) => body.expand(ctx).await?,
        None => html_escape::encode_text(&ctx.current_set().ok_or(TagError::NoSet)?.title)
            .into_owned(),
    };

    Ok(format!(
        r#"<a href="{}"{rendered}>{text}</a>"#,
        html_escape::encode_double_quoted_attribute(&href)
    ))
}
