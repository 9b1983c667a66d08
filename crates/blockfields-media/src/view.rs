//! Read-only projection of a media field for the host renderer.
//!
//! The view is plain data. A host maps it onto its own widgets; the
//! session CLI prints it as JSON.

use serde::Serialize;

use blockfields_core::{Config, MediaKind, MediaMode};

use crate::contract::MediaFieldProps;

/// What the field shows right now.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "surface", rename_all = "lowercase")]
pub enum MediaFieldView {
    Placeholder(PlaceholderView),
    Display(DisplayView),
}

impl MediaFieldView {
    pub fn placeholder(&self) -> Option<&PlaceholderView> {
        match self {
            MediaFieldView::Placeholder(view) => Some(view),
            MediaFieldView::Display(_) => None,
        }
    }

    pub fn display(&self) -> Option<&DisplayView> {
        match self {
            MediaFieldView::Display(view) => Some(view),
            MediaFieldView::Placeholder(_) => None,
        }
    }
}

/// Edit surface: drop zone, URL form, upload button, library trigger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaceholderView {
    pub icon: String,
    pub label: String,
    pub class_name: String,
    pub instructions: String,
    pub drop_zone: bool,
    pub url_form: UrlForm,
    pub upload_button: UploadButton,
    pub library_button: LibraryButton,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UrlForm {
    pub value: String,
    pub placeholder: String,
    pub submit_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadButton {
    /// MIME filter, `<kind>/*`
    pub accept: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LibraryButton {
    pub kind: MediaKind,
    pub label: String,
}

/// Display surface: player, optional caption editor, optional edit toggle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayView {
    pub wrapper_class: String,
    pub toolbar: Option<EditToggle>,
    pub figure: Figure,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditToggle {
    pub label: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub class_name: String,
    pub player: Option<MediaPlayer>,
    pub caption: Option<CaptionEditor>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaPlayer {
    pub kind: MediaKind,
    pub src: String,
    pub controls: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptionEditor {
    pub placeholder: String,
    pub value: String,
}

pub(crate) fn render(
    mode: MediaMode,
    working_url: &str,
    props: &MediaFieldProps,
    config: &Config,
) -> MediaFieldView {
    let kind = props.kind.as_str();
    let labels = &config.labels;

    match mode {
        MediaMode::Editing => MediaFieldView::Placeholder(PlaceholderView {
            icon: props.kind.icon(),
            label: kind.to_string(),
            class_name: props.block_class(),
            instructions: props.placeholder_text.clone(),
            drop_zone: true,
            url_form: UrlForm {
                value: working_url.to_string(),
                placeholder: labels.url_placeholder(kind),
                submit_label: labels.use_url.clone(),
            },
            upload_button: UploadButton {
                accept: props.kind.accept(),
                label: props.button_text.clone(),
            },
            library_button: LibraryButton {
                kind: props.kind,
                label: labels.media_library.clone(),
            },
        }),
        MediaMode::Display => {
            let toolbar = props.is_selected.then(|| EditToggle {
                label: labels.edit_label(kind),
                icon: config.media.edit_icon.clone(),
            });
            let player = props.kind.is_playable().then(|| MediaPlayer {
                kind: props.kind,
                src: working_url.to_string(),
                controls: true,
            });
            let caption = (props.is_selected && props.caption).then(|| CaptionEditor {
                placeholder: labels.caption_placeholder.clone(),
                value: props.media_caption().to_string(),
            });
            MediaFieldView::Display(DisplayView {
                wrapper_class: config.media.wrapper_class.clone(),
                toolbar,
                figure: Figure {
                    class_name: props.block_class(),
                    player,
                    caption,
                },
            })
        }
    }
}
