//! Rich-text field options and their merge rules.
//!
//! Only the options listed here reach the leaf widget. The `type`
//! routing hint is accepted in an override set but has no counterpart
//! in [`TextFieldConfig`], so it never gets passed on.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::rc::Rc;

use blockfields_core::BlockProps;

/// Custom change handler: receives the new value and the parent's props.
pub type OnChange = Rc<dyn Fn(&str, &BlockProps)>;

/// Configuration handed to the leaf text widget.
///
/// `value` is the stored attribute as is; rich text may be a string or
/// a structured tree, and the leaf decides how to read it.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TextFieldConfig {
    pub value: Value,
    pub inline_toolbar: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format_controls: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
}

impl TextFieldConfig {
    /// Applies `overrides` on top of `self`; every set override wins.
    pub fn merged(self, overrides: &TextFieldOverrides) -> Self {
        Self {
            value: overrides.value.clone().unwrap_or(self.value),
            inline_toolbar: overrides.inline_toolbar.unwrap_or(self.inline_toolbar),
            placeholder: overrides.placeholder.clone().or(self.placeholder),
            tag_name: overrides.tag_name.clone().or(self.tag_name),
            multiline: overrides.multiline.clone().or(self.multiline),
            format_controls: overrides.format_controls.clone().or(self.format_controls),
            class_name: overrides.class_name.clone().or(self.class_name),
        }
    }
}

/// Caller-supplied options for one rich-text field.
///
/// Field declarations can be read from TOML or JSON; `on_change` can
/// only be set in code.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct TextFieldOverrides {
    pub value: Option<Value>,
    pub inline_toolbar: Option<bool>,
    pub placeholder: Option<String>,
    pub tag_name: Option<String>,
    pub multiline: Option<String>,
    pub format_controls: Option<Vec<String>>,
    pub class_name: Option<String>,

    /// Routing hint for the host; never passed to the leaf
    #[serde(rename = "type")]
    pub kind: Option<String>,

    #[serde(skip)]
    pub on_change: Option<OnChange>,
}

impl TextFieldOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn inline_toolbar(mut self, enabled: bool) -> Self {
        self.inline_toolbar = Some(enabled);
        self
    }

    pub fn on_change(mut self, handler: impl Fn(&str, &BlockProps) + 'static) -> Self {
        self.on_change = Some(Rc::new(handler));
        self
    }
}

impl fmt::Debug for TextFieldOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextFieldOverrides")
            .field("value", &self.value)
            .field("inline_toolbar", &self.inline_toolbar)
            .field("placeholder", &self.placeholder)
            .field("tag_name", &self.tag_name)
            .field("multiline", &self.multiline)
            .field("format_controls", &self.format_controls)
            .field("class_name", &self.class_name)
            .field("kind", &self.kind)
            .field("on_change", &self.on_change.is_some())
            .finish()
    }
}
