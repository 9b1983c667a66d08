//! Builds rich-text fields bound to one attribute of a block.

use serde_json::Value;
use std::fmt;

use blockfields_core::{BlockProps, TextConfig};

use crate::options::{OnChange, TextFieldConfig, TextFieldOverrides};

/// A leaf text-editing widget.
///
/// The widget renders from the config and reports edits by calling
/// [`RichTextField::handle_change`].
pub trait TextField {
    fn render(&mut self, config: &TextFieldConfig, is_selected: bool);
}

enum ChangeHandler {
    /// Caller-supplied handler from the override set
    Delegate(OnChange),
    /// Write the value straight into the bound attribute
    WriteBack,
}

/// A rich-text field ready to be mounted on a leaf widget.
pub struct RichTextField {
    attribute_key: String,
    config: TextFieldConfig,
    is_selected: bool,
    handler: ChangeHandler,
    props: BlockProps,
}

/// Builds a rich-text field for `attribute_key` with the stock defaults.
pub fn rich_text(
    props: &BlockProps,
    overrides: TextFieldOverrides,
    attribute_key: &str,
) -> RichTextField {
    rich_text_with_defaults(props, overrides, attribute_key, &TextConfig::default())
}

/// Builds a rich-text field for `attribute_key`.
///
/// The stored attribute (or `""` when unset or null) and the configured
/// toolbar default are merged under `overrides`.
pub fn rich_text_with_defaults(
    props: &BlockProps,
    overrides: TextFieldOverrides,
    attribute_key: &str,
    defaults: &TextConfig,
) -> RichTextField {
    let base = TextFieldConfig {
        value: props
            .attribute(attribute_key)
            .unwrap_or_else(|| Value::String(String::new())),
        inline_toolbar: defaults.inline_toolbar,
        ..TextFieldConfig::default()
    };
    let config = base.merged(&overrides);

    if let Some(kind) = &overrides.kind {
        tracing::trace!(key = attribute_key, kind = %kind, "Routing hint not passed to leaf");
    }

    let handler = match overrides.on_change {
        Some(on_change) => ChangeHandler::Delegate(on_change),
        None => ChangeHandler::WriteBack,
    };

    // Only the focused attribute may claim the editor's text focus.
    let is_selected = props.is_selected && props.editable.as_deref() == Some(attribute_key);

    RichTextField {
        attribute_key: attribute_key.to_string(),
        config,
        is_selected,
        handler,
        props: props.clone(),
    }
}

impl RichTextField {
    pub fn attribute_key(&self) -> &str {
        &self.attribute_key
    }

    pub fn config(&self) -> &TextFieldConfig {
        &self.config
    }

    /// True when the parent is selected and this field's key holds focus.
    pub fn is_selected(&self) -> bool {
        self.is_selected
    }

    /// Renders the leaf widget.
    pub fn mount(&self, leaf: &mut dyn TextField) {
        leaf.render(&self.config, self.is_selected);
    }

    /// Handles an edit reported by the leaf widget.
    pub fn handle_change(&self, value: &str) {
        match &self.handler {
            ChangeHandler::Delegate(on_change) => on_change(value, &self.props),
            ChangeHandler::WriteBack => {
                tracing::debug!(key = %self.attribute_key, "Rich text written back");
                self.props.set_attributes([(
                    self.attribute_key.clone(),
                    Value::String(value.to_string()),
                )]);
            }
        }
    }
}

impl fmt::Debug for RichTextField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handler = match self.handler {
            ChangeHandler::Delegate(_) => "delegate",
            ChangeHandler::WriteBack => "write-back",
        };
        f.debug_struct("RichTextField")
            .field("attribute_key", &self.attribute_key)
            .field("config", &self.config)
            .field("is_selected", &self.is_selected)
            .field("handler", &handler)
            .finish()
    }
}
