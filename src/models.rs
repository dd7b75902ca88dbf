//! Gallery and photo snapshots served to the rendering layer.
//!
//! These are owned by this crate and built from Flickr responses in
//! `flickr::wire`; nothing here knows about the wire format.

use crate::page::slug::slugify;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Photos per page when listing a set and nothing else was asked for.
pub const SET_PAGE_SIZE: u32 = 500;

/// Flickr's own default page size for `photos.search`.
pub const SEARCH_PAGE_SIZE: u32 = 100;

/// A photoset: a titled collection of photos with a cover photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Gallery {
    pub id: String,
    pub title: String,
    pub description: String,
    pub num_photos: u32,
    /// Photo id of the cover image.
    pub primary: String,
}

impl Gallery {
    /// URL segment used to address this set under a gallery page.
    pub fn slug(&self) -> String {
        slugify(&self.title)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Visibility {
    pub is_public: bool,
    pub is_friend: bool,
    pub is_family: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Photo {
    pub id: String,
    pub owner: String,
    pub secret: String,
    pub server: String,
    pub farm: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_format: Option<String>,
    pub visibility: Visibility,
    pub title: String,
    pub description: String,
    pub page_url: String,
}

impl Photo {
    /// Static image URL for one of the standard sizes.
    ///
    /// `Original` needs the separate original secret; photos fetched without it
    /// fall back to the large rendition.
    pub fn image_url(&self, size: PhotoSize) -> String {
        let base = format!(
            "https://farm{}.staticflickr.com/{}/{}",
            self.farm, self.server, self.id
        );
        match (size, &self.original_secret) {
            (PhotoSize::Original, Some(secret)) => {
                let format = self.original_format.as_deref().unwrap_or("jpg");
                format!("{base}_{secret}_o.{format}")
            }
            (PhotoSize::Original, None) => self.image_url(PhotoSize::Large),
            (size, _) => format!("{base}_{}{}.jpg", self.secret, size.suffix()),
        }
    }

    /// Every standard size keyed by its lowercase name.
    pub fn image_urls(&self) -> BTreeMap<&'static str, String> {
        PhotoSize::ALL
            .iter()
            .map(|size| (size.as_str(), self.image_url(*size)))
            .collect()
    }
}

/// Default photo page when the service didn't hand us one.
pub fn photo_page_url(owner: &str, photo_id: &str) -> String {
    format!("https://www.flickr.com/photos/{owner}/{photo_id}/")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhotoSize {
    /// 75x75 crop
    Square,
    /// 100 on the longest side
    Thumbnail,
    /// 240 on the longest side
    Small,
    /// 500 on the longest side
    #[default]
    Medium,
    /// 1024 on the longest side
    Large,
    Original,
}

impl PhotoSize {
    pub const ALL: [PhotoSize; 6] = [
        PhotoSize::Square,
        PhotoSize::Thumbnail,
        PhotoSize::Small,
        PhotoSize::Medium,
        PhotoSize::Large,
        PhotoSize::Original,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PhotoSize::Square => "square",
            PhotoSize::Thumbnail => "thumbnail",
            PhotoSize::Small => "small",
            PhotoSize::Medium => "medium",
            PhotoSize::Large => "large",
            PhotoSize::Original => "original",
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            PhotoSize::Square => "_s",
            PhotoSize::Thumbnail => "_t",
            PhotoSize::Small => "_m",
            PhotoSize::Medium => "",
            PhotoSize::Large | PhotoSize::Original => "_b",
        }
    }
}

impl fmt::Display for PhotoSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PhotoSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        PhotoSize::ALL
            .into_iter()
            .find(|size| size.as_str() == wanted)
            .ok_or_else(|| s.to_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("a photo search needs at least a `user' or `tags' value")]
    MissingUserOrTags,
}

/// A validated `photos.search` request.
///
/// Tags are stored in canonical form and paging defaults are filled in, so
/// two searches that ask for the same thing compare equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    user_id: Option<String>,
    tags: Option<String>,
    per_page: u32,
    page: u32,
}

impl SearchQuery {
    pub fn new(
        user_id: Option<&str>,
        tags: Option<&str>,
        per_page: Option<u32>,
        page: Option<u32>,
    ) -> Result<Self, QueryError> {
        let user_id = user_id
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_owned);
        let tags = tags.and_then(normalize_tags);
        if user_id.is_none() && tags.is_none() {
            return Err(QueryError::MissingUserOrTags);
        }
        Ok(Self {
            user_id,
            tags,
            per_page: per_page.unwrap_or(SEARCH_PAGE_SIZE),
            page: page.unwrap_or(1),
        })
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Comma-joined canonical tag list.
    pub fn tags(&self) -> Option<&str> {
        self.tags.as_deref()
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    pub fn page(&self) -> u32 {
        self.page
    }
}

/// Canonical form of a comma-separated tag list: trimmed, lowercased,
/// deduplicated and sorted. `None` when no tag survives.
pub fn normalize_tags(raw: &str) -> Option<String> {
    let mut tags: Vec<String> = raw
        .split(',')
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    tags.sort();
    tags.dedup();
    (!tags.is_empty()).then(|| tags.join(","))
}
