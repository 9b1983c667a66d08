//! # Blockfields Media
//!
//! A media placeholder field for image, video and audio attributes.
//!
//! The field is a two-state machine:
//!
//! ```text
//!                 upload / library pick / URL submit
//!   ┌─────────┐ ─────────────────────────────────────▶ ┌─────────┐
//!   │ Editing │                                        │ Display │
//!   └─────────┘ ◀───────────────────────────────────── └─────────┘
//!                         edit toggle
//! ```
//!
//! Every pathway into `Display` goes through one acceptance step, which
//! is the only place that writes media attributes back to the parent.
//!
//! ## Learning: Traits at the Seams
//!
//! The field never talks to a host directly. Uploads go through
//! [`UploadService`], attribute writes through [`MediaAttributes`].
//! Tests swap both for in-memory fakes.

pub mod command;
pub mod contract;
pub mod field;
pub mod upload;
pub mod view;

pub use command::{MediaCommand, Transition};
pub use contract::{AttributeBinding, MediaAttributes, MediaCallbacks, MediaFieldProps};
pub use field::MediaField;
pub use upload::{UploadCompletion, UploadError, UploadRequest, UploadService, UploadTicket};
pub use view::MediaFieldView;

/// Result type for media field operations
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors returned by media field operations.
///
/// Rejected selections are not errors; they leave the field unchanged.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("No upload service configured for this field")]
    UploadUnavailable,

    #[error("Uploads need a running tokio runtime")]
    NoRuntime,
}
