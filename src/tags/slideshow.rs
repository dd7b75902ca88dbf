use super::{Attributes, TagError};

/// Flickr slideshow embed for a user's set or tag selection.
///
/// Needs `user` and exactly one of `set` or `tags`; values are trimmed and
/// passed through as written.
pub fn slideshow(attrs: &Attributes) -> Result<String, TagError> {
    let user = attrs.get("user").ok_or(TagError::SlideshowUser)?;
    let (param, value) = match (attrs.get("set"), attrs.get("tags")) {
        (Some(_), Some(_)) => return Err(TagError::SlideshowBothSources),
        (Some(set), None) => ("set_id", set),
        (None, Some(tags)) => ("tags", tags),
        (None, None) => return Err(TagError::SlideshowNoSource),
    };
    Ok(format!(
        concat!(
            r#"<iframe align="center" src="http://www.flickr.com/slideShow/index.gne?user_id={user}&{param}={value}" "#,
            r#"frameBorder="0" width="500" scrolling="no" height="500"></iframe>"#,
            "\n"
        ),
        user = user,
        param = param,
        value = value,
    ))
}
