//! Media values shared between the media field and its collaborators.
//!
//! ## Learning: Value Types
//!
//! `MediaDescriptor` is a plain value: it derives `Clone` and `PartialEq`
//! and is replaced wholesale whenever a new item is selected. Nothing
//! mutates a descriptor after a field has accepted it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::CoreError;

/// The kind of media a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    Image,
    Video,
    Audio,
}

impl MediaKind {
    /// Returns the lowercase tag used by hosts and upload services.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
        }
    }

    /// MIME filter for file choosers, e.g. `video/*`.
    pub fn accept(&self) -> String {
        format!("{}/*", self.as_str())
    }

    /// Placeholder icon name, e.g. `media-audio`.
    pub fn icon(&self) -> String {
        format!("media-{}", self.as_str())
    }

    /// Block class suffix, e.g. `wp-block-image`.
    pub fn block_class(&self) -> String {
        format!("wp-block-{}", self.as_str())
    }

    /// Returns true if this kind has an inline player.
    pub fn is_playable(&self) -> bool {
        matches!(self, MediaKind::Video | MediaKind::Audio)
    }

    /// Returns true if `mime` falls under this kind's MIME prefix.
    pub fn accepts(&self, mime: &str) -> bool {
        mime.split('/').next() == Some(self.as_str())
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "image" => Ok(MediaKind::Image),
            "video" => Ok(MediaKind::Video),
            "audio" => Ok(MediaKind::Audio),
            other => Err(CoreError::UnknownMediaKind(other.to_string())),
        }
    }
}

/// Top-level mode of a media field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaMode {
    /// Capturing input: URL form, upload, library, drop zone
    #[default]
    Editing,
    /// Showing the accepted media
    Display,
}

/// One media item: a URL plus optional caption and opaque host fields.
///
/// Unknown fields coming from an upload service or the media library
/// (ids, dimensions, mime type) are kept in `extra` and written back
/// to the attribute store untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MediaDescriptor {
    #[serde(default)]
    pub url: String,

    #[serde(
        rename = "mediaCaption",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub media_caption: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MediaDescriptor {
    /// Creates a descriptor holding only a URL.
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Sets the caption.
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.media_caption = Some(caption.into());
        self
    }

    /// Adds an opaque field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Returns true if the descriptor carries a non-empty URL.
    pub fn has_url(&self) -> bool {
        !self.url.is_empty()
    }

    /// Reads a descriptor back from an attribute value.
    ///
    /// Returns `None` for anything that is not a JSON object.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let mut extra = object.clone();
        let url = match extra.remove("url") {
            Some(Value::String(url)) => url,
            _ => String::new(),
        };
        let media_caption = match extra.remove("mediaCaption") {
            Some(Value::String(caption)) => Some(caption),
            _ => None,
        };
        Some(Self {
            url,
            media_caption,
            extra,
        })
    }

    /// Converts the descriptor into the JSON object stored as an attribute.
    pub fn to_value(&self) -> Value {
        let mut object = self.extra.clone();
        object.insert("url".to_string(), Value::String(self.url.clone()));
        if let Some(caption) = &self.media_caption {
            object.insert("mediaCaption".to_string(), Value::String(caption.clone()));
        }
        Value::Object(object)
    }
}

/// A file handed to the upload service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBlob {
    /// File name as chosen by the user
    pub name: String,
    /// MIME type, e.g. `video/mp4`
    pub mime: String,
    /// File contents
    pub bytes: Vec<u8>,
}

impl FileBlob {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    /// Media kind implied by the MIME prefix, if any.
    pub fn media_kind(&self) -> Option<MediaKind> {
        self.mime.split('/').next()?.parse().ok()
    }
}
