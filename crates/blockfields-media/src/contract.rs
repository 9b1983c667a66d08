//! The contract between a media field and its parent block.
//!
//! The parent hands the field read-only props plus three callbacks.
//! The field calls the callbacks; it never touches the parent's
//! attribute storage itself.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use blockfields_core::{MediaDescriptor, MediaKind, SharedAttributes};

/// Read-only props passed down by the parent block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaFieldProps {
    /// Kind of media this field accepts
    #[serde(rename = "type")]
    pub kind: MediaKind,

    /// Whether captioning is enabled
    pub caption: bool,

    /// Current media attribute of the parent; seeds the field on mount
    pub media_data: Option<MediaDescriptor>,

    /// Whether the parent block is selected
    pub is_selected: bool,

    /// Instructions shown on the placeholder
    pub placeholder_text: String,

    /// Label of the upload button
    pub button_text: String,

    /// Class applied to the placeholder and the figure
    pub class_name: String,
}

impl MediaFieldProps {
    pub fn new(kind: MediaKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn with_media(mut self, media: MediaDescriptor) -> Self {
        self.media_data = Some(media);
        self
    }

    pub fn with_caption(mut self, enabled: bool) -> Self {
        self.caption = enabled;
        self
    }

    pub fn selected(mut self, is_selected: bool) -> Self {
        self.is_selected = is_selected;
        self
    }

    /// Caption of the parent's current media, or an empty string.
    pub fn media_caption(&self) -> &str {
        self.media_data
            .as_ref()
            .and_then(|media| media.media_caption.as_deref())
            .unwrap_or("")
    }

    /// `"<class_name> wp-block-<kind>"`
    pub fn block_class(&self) -> String {
        format!("{} {}", self.class_name, self.kind.block_class())
    }
}

/// Callbacks into the parent block's attribute storage.
///
/// Implementations are synchronous and run on the dispatch thread.
pub trait MediaAttributes {
    /// Stores an accepted descriptor.
    fn set_media_attributes(&mut self, media: &MediaDescriptor);

    /// Clears the stored media.
    fn remove_media_attributes(&mut self);

    /// Stores a new caption.
    fn set_caption(&mut self, caption: &str);
}

/// Binds a media field to one key of a shared attribute store.
///
/// The descriptor is stored as a JSON object; the caption lives in its
/// `mediaCaption` field.
#[derive(Debug, Clone)]
pub struct AttributeBinding {
    attributes: SharedAttributes,
    key: String,
}

impl AttributeBinding {
    pub fn new(attributes: SharedAttributes, key: impl Into<String>) -> Self {
        Self {
            attributes,
            key: key.into(),
        }
    }

    /// The attribute key this binding writes to.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The currently stored descriptor, if any.
    pub fn current(&self) -> Option<MediaDescriptor> {
        self.attributes
            .borrow()
            .get(&self.key)
            .and_then(MediaDescriptor::from_value)
    }
}

impl MediaAttributes for AttributeBinding {
    fn set_media_attributes(&mut self, media: &MediaDescriptor) {
        self.attributes
            .borrow_mut()
            .set(self.key.clone(), media.to_value());
    }

    fn remove_media_attributes(&mut self) {
        self.attributes.borrow_mut().remove(&self.key);
    }

    fn set_caption(&mut self, caption: &str) {
        let result = self.attributes.borrow_mut().set_nested(
            &self.key,
            "mediaCaption",
            Value::String(caption.to_string()),
        );
        if let Err(err) = result {
            tracing::warn!(key = %self.key, "Caption not stored: {}", err);
        }
    }
}

type SetMedia = Box<dyn FnMut(&MediaDescriptor)>;
type RemoveMedia = Box<dyn FnMut()>;
type SetCaption = Box<dyn FnMut(&str)>;

/// Contract built from three closures, for hosts that manage their own storage.
pub struct MediaCallbacks {
    set_media: SetMedia,
    remove_media: RemoveMedia,
    set_caption: SetCaption,
}

impl MediaCallbacks {
    pub fn new(
        set_media: impl FnMut(&MediaDescriptor) + 'static,
        remove_media: impl FnMut() + 'static,
        set_caption: impl FnMut(&str) + 'static,
    ) -> Self {
        Self {
            set_media: Box::new(set_media),
            remove_media: Box::new(remove_media),
            set_caption: Box::new(set_caption),
        }
    }
}

impl fmt::Debug for MediaCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaCallbacks").finish_non_exhaustive()
    }
}

impl MediaAttributes for MediaCallbacks {
    fn set_media_attributes(&mut self, media: &MediaDescriptor) {
        (self.set_media)(media)
    }

    fn remove_media_attributes(&mut self) {
        (self.remove_media)()
    }

    fn set_caption(&mut self, caption: &str) {
        (self.set_caption)(caption)
    }
}
