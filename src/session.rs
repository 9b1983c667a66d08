//! Scripted editing sessions.
//!
//! A session file describes one block: its initial attributes, a media
//! field, any number of rich-text fields and a list of user steps. The
//! runner replays the steps against real fields and reports the final
//! attribute bag.
//!
//! ```toml
//! [attributes]
//! title = "Draft"
//!
//! [block]
//! selected = true
//! editable = "title"
//!
//! [media]
//! key = "video"
//!
//! [media.props]
//! type = "video"
//! caption = true
//!
//! [[text]]
//! key = "title"
//!
//! [[step]]
//! action = "change_url"
//! value = "http://example.com/clip.mp4"
//!
//! [[step]]
//! action = "submit_url"
//! ```

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

use blockfields_core::{
    AttributeStore, BlockProps, Config, EventBus, EventHandler, FieldEvent, MediaDescriptor,
    SharedAttributes,
};
use blockfields_media::{
    AttributeBinding, MediaCommand, MediaField, MediaFieldProps, MediaFieldView, Transition,
    UploadService,
};
use blockfields_text::{TextFieldConfig, TextFieldOverrides, rich_text_with_defaults};

use crate::uploads::load_files;

/// A parsed session file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Session {
    /// Initial attribute bag of the block
    pub attributes: Map<String, Value>,

    /// Selection state of the block
    pub block: BlockState,

    /// The media field, if the block has one
    pub media: Option<MediaSection>,

    /// Rich-text fields
    #[serde(rename = "text")]
    pub texts: Vec<TextSection>,

    /// Steps to replay
    #[serde(rename = "step")]
    pub steps: Vec<Step>,
}

impl Session {
    /// Parses a session from TOML.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        toml::from_str(content).context("invalid session file")
    }

    /// Loads a session file; relative upload paths resolve against its directory.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read session {}", path.display()))?;
        let mut session = Self::from_toml(&content)?;
        if let Some(base) = path.parent() {
            session.resolve_paths(base);
        }
        Ok(session)
    }

    fn resolve_paths(&mut self, base: &Path) {
        for step in &mut self.steps {
            if let Step::Upload { files } | Step::Drop { files } = step {
                for file in files.iter_mut() {
                    if file.is_relative() {
                        *file = base.join(&*file);
                    }
                }
            }
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BlockState {
    pub selected: bool,
    pub editable: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaSection {
    /// Attribute key holding the media descriptor
    pub key: String,
    #[serde(default)]
    pub props: MediaFieldProps,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextSection {
    pub key: String,
    #[serde(default)]
    pub overrides: TextFieldOverrides,
}

/// One user interaction.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Upload { files: Vec<PathBuf> },
    Drop { files: Vec<PathBuf> },
    SelectMedia { media: Option<MediaDescriptor> },
    ChangeUrl { value: String },
    SubmitUrl,
    SwitchToEditing,
    ChangeCaption { value: String },
    TextChanged { key: String, value: String },
    Select {
        selected: bool,
        #[serde(default)]
        editable: Option<String>,
    },
}

/// State of one rich-text field after replay.
#[derive(Debug, Clone, Serialize)]
pub struct TextFieldReport {
    pub key: String,
    pub selected: bool,
    pub config: TextFieldConfig,
}

/// Outcome of a replayed session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub attributes: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<MediaFieldView>,
    pub text: Vec<TextFieldReport>,
    pub attribute_writes: usize,
}

struct MountedMedia {
    key: String,
    field: MediaField,
}

/// Replays a session against live fields.
pub struct SessionRunner {
    config: Arc<Config>,
    uploads: Arc<dyn UploadService>,
}

impl SessionRunner {
    pub fn new(config: Arc<Config>, uploads: Arc<dyn UploadService>) -> Self {
        Self { config, uploads }
    }

    pub async fn run(&self, session: Session) -> anyhow::Result<SessionReport> {
        let bus = EventBus::new();
        let mut events = EventHandler::new(bus.subscribe());

        let attributes = AttributeStore::from_value(Value::Object(session.attributes))
            .with_events(bus.clone())
            .shared();
        let mut block = BlockProps::new(Rc::clone(&attributes)).selected(session.block.selected);
        block.editable = session.block.editable;

        let mut media = session.media.map(|section| {
            let binding = AttributeBinding::new(Rc::clone(&attributes), section.key.clone());
            let mut props = section.props;
            if props.media_data.is_none() {
                props.media_data = binding.current();
            }
            props.is_selected = block.is_selected;

            let field = MediaField::new(props, binding)
                .with_upload_service(Arc::clone(&self.uploads))
                .with_config(Arc::clone(&self.config))
                .with_events(bus.clone());
            MountedMedia {
                key: section.key,
                field,
            }
        });

        for (index, step) in session.steps.into_iter().enumerate() {
            let number = index + 1;
            tracing::debug!("Step {}: {:?}", number, step);

            match step {
                Step::TextChanged { key, value } => {
                    let section = session
                        .texts
                        .iter()
                        .find(|section| section.key == key)
                        .with_context(|| format!("step {number}: no text field `{key}`"))?;
                    let field = rich_text_with_defaults(
                        &block,
                        section.overrides.clone(),
                        &section.key,
                        &self.config.text,
                    );
                    field.handle_change(&value);
                }
                Step::Select { selected, editable } => {
                    block.is_selected = selected;
                    block.editable = editable;
                }
                step => {
                    let Some(mounted) = media.as_mut() else {
                        bail!("step {number}: session has no media field");
                    };
                    let command = media_command(step).await?;
                    let transition = mounted
                        .field
                        .dispatch(command)
                        .with_context(|| format!("step {number}"))?;
                    if let Transition::UploadStarted(_) = transition {
                        mounted.field.settle_uploads().await;
                    }
                }
            }

            // Parent re-render: fields see the latest attributes and selection.
            if let Some(mounted) = media.as_mut() {
                refresh_media_props(mounted, &attributes, &block);
            }
        }

        let attribute_writes = events
            .drain()
            .iter()
            .filter(|event| {
                matches!(
                    event,
                    FieldEvent::AttributeChanged { .. } | FieldEvent::AttributeRemoved { .. }
                )
            })
            .count();

        let text = session
            .texts
            .iter()
            .map(|section| {
                let field = rich_text_with_defaults(
                    &block,
                    section.overrides.clone(),
                    &section.key,
                    &self.config.text,
                );
                TextFieldReport {
                    key: section.key.clone(),
                    selected: field.is_selected(),
                    config: field.config().clone(),
                }
            })
            .collect();

        let snapshot = attributes.borrow().to_value();
        Ok(SessionReport {
            attributes: snapshot,
            media: media.map(|mounted| mounted.field.view()),
            text,
            attribute_writes,
        })
    }
}

async fn media_command(step: Step) -> anyhow::Result<MediaCommand> {
    let command = match step {
        Step::Upload { files } => MediaCommand::UploadFiles(
            load_files(&files)
                .await
                .context("cannot read upload files")?,
        ),
        Step::Drop { files } => MediaCommand::DropFiles(
            load_files(&files)
                .await
                .context("cannot read dropped files")?,
        ),
        Step::SelectMedia { media } => MediaCommand::SelectMedia(media),
        Step::ChangeUrl { value } => MediaCommand::ChangeUrl(value),
        Step::SubmitUrl => MediaCommand::SubmitUrl,
        Step::SwitchToEditing => MediaCommand::SwitchToEditing,
        Step::ChangeCaption { value } => MediaCommand::ChangeCaption(value),
        Step::TextChanged { .. } | Step::Select { .. } => {
            bail!("not a media field step")
        }
    };
    Ok(command)
}

fn refresh_media_props(mounted: &mut MountedMedia, attributes: &SharedAttributes, block: &BlockProps) {
    let mut props = mounted.field.props().clone();
    props.is_selected = block.is_selected;
    props.media_data = attributes
        .borrow()
        .get(&mounted.key)
        .and_then(MediaDescriptor::from_value);
    mounted.field.receive_props(props);
}
