//! Response shapes of the four REST methods we call, and their conversion
//! into [`Gallery`] / [`Photo`].

use super::json::{Text, flag, string_from_any, u32_from_any};
use crate::models::{Gallery, Photo, Visibility, photo_page_url};
use serde::Deserialize;

/// Envelope fields present on every response.
#[derive(Debug, Deserialize)]
pub(crate) struct Stat {
    pub stat: String,
    #[serde(default)]
    pub code: Option<u32>,
    #[serde(default)]
    pub message: Option<String>,
}

// -- flickr.photosets.getList --

#[derive(Debug, Deserialize)]
pub(crate) struct PhotosetListResponse {
    pub photosets: PhotosetList,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PhotosetList {
    #[serde(default)]
    pub photoset: Vec<RawPhotoset>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawPhotoset {
    #[serde(deserialize_with = "string_from_any")]
    id: String,
    #[serde(default, deserialize_with = "string_from_any")]
    primary: String,
    #[serde(default, deserialize_with = "u32_from_any")]
    photos: u32,
    #[serde(default)]
    title: Text,
    #[serde(default)]
    description: Text,
}

impl From<RawPhotoset> for Gallery {
    fn from(raw: RawPhotoset) -> Self {
        Gallery {
            id: raw.id,
            title: raw.title.into(),
            description: raw.description.into(),
            num_photos: raw.photos,
            primary: raw.primary,
        }
    }
}

// -- flickr.photosets.getPhotos --

#[derive(Debug, Deserialize)]
pub(crate) struct PhotosetPhotosResponse {
    pub photoset: PhotosetPhotos,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PhotosetPhotos {
    /// Set photos don't repeat the owner per photo.
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub photo: Vec<RawPhoto>,
}

// -- flickr.photos.search --

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    pub photos: SearchPage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchPage {
    #[serde(default)]
    pub photo: Vec<RawPhoto>,
}

// -- flickr.photos.getInfo --

#[derive(Debug, Deserialize)]
pub(crate) struct PhotoInfoResponse {
    pub photo: RawPhoto,
}

/// Owner is a bare NSID in listings and an object in `getInfo`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawOwner {
    Id(String),
    Detailed { nsid: String },
}

#[derive(Debug, Deserialize)]
struct RawVisibility {
    #[serde(default, deserialize_with = "flag")]
    ispublic: bool,
    #[serde(default, deserialize_with = "flag")]
    isfriend: bool,
    #[serde(default, deserialize_with = "flag")]
    isfamily: bool,
}

#[derive(Debug, Deserialize)]
struct RawUrls {
    #[serde(default)]
    url: Vec<RawUrl>,
}

#[derive(Debug, Deserialize)]
struct RawUrl {
    #[serde(rename = "type")]
    kind: String,
    #[serde(rename = "_content")]
    content: String,
}

/// One photo as it appears in any of the photo-returning methods.
#[derive(Debug, Deserialize)]
pub(crate) struct RawPhoto {
    #[serde(deserialize_with = "string_from_any")]
    id: String,
    #[serde(default)]
    owner: Option<RawOwner>,
    #[serde(default)]
    secret: String,
    #[serde(default, deserialize_with = "string_from_any")]
    server: String,
    #[serde(default, deserialize_with = "u32_from_any")]
    farm: u32,
    #[serde(default)]
    originalsecret: Option<String>,
    #[serde(default)]
    originalformat: Option<String>,
    #[serde(default)]
    title: Text,
    #[serde(default)]
    description: Text,
    #[serde(default, deserialize_with = "flag")]
    ispublic: bool,
    #[serde(default, deserialize_with = "flag")]
    isfriend: bool,
    #[serde(default, deserialize_with = "flag")]
    isfamily: bool,
    /// `getInfo` nests the flags here instead.
    #[serde(default)]
    visibility: Option<RawVisibility>,
    #[serde(default)]
    urls: Option<RawUrls>,
}

impl RawPhoto {
    /// Build the owned snapshot. `set_owner` fills in the owner for photos
    /// listed from a set, where Flickr omits it per photo.
    pub(crate) fn into_photo(self, set_owner: Option<&str>) -> Photo {
        let owner = match self.owner {
            Some(RawOwner::Id(id)) | Some(RawOwner::Detailed { nsid: id }) => id,
            None => set_owner.unwrap_or_default().to_owned(),
        };
        let visibility = match self.visibility {
            Some(v) => Visibility {
                is_public: v.ispublic,
                is_friend: v.isfriend,
                is_family: v.isfamily,
            },
            None => Visibility {
                is_public: self.ispublic,
                is_friend: self.isfriend,
                is_family: self.isfamily,
            },
        };
        let page_url = self
            .urls
            .and_then(|urls| urls.url.into_iter().find(|u| u.kind == "photopage"))
            .map(|u| u.content)
            .unwrap_or_else(|| photo_page_url(&owner, &self.id));

        Photo {
            id: self.id,
            owner,
            secret: self.secret,
            server: self.server,
            farm: self.farm,
            original_secret: self.originalsecret,
            original_format: self.originalformat,
            visibility,
            title: self.title.into(),
            description: self.description.into(),
            page_url,
        }
    }
}
