//! Commands a host can send to a media field.
//!
//! ## Learning: The Command Pattern
//!
//! Each user interaction becomes a value. A host can queue, log or
//! replay commands, and `MediaField::dispatch` routes each one to the
//! matching transition method.

use blockfields_core::{FileBlob, MediaDescriptor};

use crate::upload::UploadTicket;

/// User interactions with a media field.
#[derive(Debug, Clone)]
pub enum MediaCommand {
    /// Files picked with the upload button
    UploadFiles(Vec<FileBlob>),
    /// Files dropped on the drop zone
    DropFiles(Vec<FileBlob>),
    /// The media library closed; `None` means the pick was cancelled
    SelectMedia(Option<MediaDescriptor>),
    /// The URL input changed
    ChangeUrl(String),
    /// The URL form was submitted
    SubmitUrl,
    /// The edit toggle was activated
    SwitchToEditing,
    /// The caption editor changed
    ChangeCaption(String),
}

impl MediaCommand {
    /// Returns the command's display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            MediaCommand::UploadFiles(_) => "Upload Files",
            MediaCommand::DropFiles(_) => "Drop Files",
            MediaCommand::SelectMedia(_) => "Select Media",
            MediaCommand::ChangeUrl(_) => "Change URL",
            MediaCommand::SubmitUrl => "Submit URL",
            MediaCommand::SwitchToEditing => "Switch to Editing",
            MediaCommand::ChangeCaption(_) => "Change Caption",
        }
    }
}

/// What a command did to the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// A descriptor was accepted; the field now displays it
    Accepted,
    /// An upload was spawned; acceptance happens on completion
    UploadStarted(UploadTicket),
    /// The working URL changed
    UrlEdited,
    /// The field returned to editing and the media attributes were removed
    Removed,
    /// The caption was forwarded to the parent
    CaptionSet,
    /// Nothing changed
    Ignored,
}

impl Transition {
    /// Returns true unless the command was ignored.
    pub fn changed(&self) -> bool {
        !matches!(self, Transition::Ignored)
    }
}
