//! # Blockfields Text
//!
//! Adapter between a block's attribute bag and a leaf rich-text widget.
//!
//! ```text
//!   BlockProps ──┐
//!   overrides  ──┼──▶ rich_text() ──▶ RichTextField ──mount──▶ dyn TextField
//!   key        ──┘                         ▲                        │
//!                                          └──── handle_change ◀────┘
//! ```
//!
//! The adapter is stateless: build a fresh [`RichTextField`] on every
//! render of the parent block.

pub mod adapter;
pub mod options;

pub use adapter::{RichTextField, TextField, rich_text, rich_text_with_defaults};
pub use options::{OnChange, TextFieldConfig, TextFieldOverrides};
