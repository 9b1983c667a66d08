//! # Blockfields Core
//!
//! Shared building blocks for block field widgets.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      Parent block                         │
//! │  ┌──────────────────┐  ┌────────────┐  ┌──────────────┐  │
//! │  │  AttributeStore  │  │  EventBus  │  │    Config    │  │
//! │  └────────┬─────────┘  └─────┬──────┘  └──────┬───────┘  │
//! │           │                  │                │          │
//! │  ┌────────┴──────────────────┴────────────────┴───────┐  │
//! │  │          Fields (media field, rich text)            │  │
//! │  └────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Fields never own the attribute store. They receive a shared handle
//! (`SharedAttributes`) or a set of callbacks and write through it.
//!
//! ## Learning: Module Organization
//!
//! - `pub mod` exposes the module path (`blockfields_core::media::MediaKind`)
//! - `pub use` re-exports the common types at the crate root

pub mod attributes;
pub mod config;
pub mod event;
pub mod media;

pub use attributes::{AttributeStore, BlockProps, SharedAttributes};
pub use config::{Config, LabelConfig, MediaConfig, TextConfig};
pub use event::{EventBus, EventHandler, FieldEvent, FieldId, MediaSource};
pub use media::{FileBlob, MediaDescriptor, MediaKind, MediaMode};

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core operations
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Unknown media kind: {0}")]
    UnknownMediaKind(String),

    #[error("Attribute is not an object: {0}")]
    NotAnObject(String),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
}
