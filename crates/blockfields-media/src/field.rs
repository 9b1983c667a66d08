//! The media field state machine.
//!
//! ## Learning: Owned State, Borrowed Collaborators
//!
//! `MediaField` owns its mode and working descriptor outright; nothing
//! else can change them. Collaborators are held behind trait objects
//! (`Box<dyn MediaAttributes>`, `Arc<dyn UploadService>`) so any host
//! can plug in its own storage and transport.

use std::sync::Arc;

use blockfields_core::{
    Config, EventBus, FieldEvent, FieldId, FileBlob, MediaDescriptor, MediaMode, MediaSource,
};

use crate::command::{MediaCommand, Transition};
use crate::contract::{MediaAttributes, MediaFieldProps};
use crate::upload::{
    UploadCompletion, UploadQueue, UploadRequest, UploadService, UploadTicket, first_with_url,
};
use crate::view::{self, MediaFieldView};
use crate::{MediaError, MediaResult};

#[derive(Debug, Clone, Default, PartialEq)]
struct MediaFieldState {
    mode: MediaMode,
    working: Option<MediaDescriptor>,
    /// Bumped on every acceptance and every edit toggle
    epoch: u64,
}

/// A media placeholder bound to one media attribute of a parent block.
///
/// ## Thread Safety
///
/// A field lives on the UI dispatch thread. Uploads run on the tokio
/// runtime and are drained back with [`MediaField::poll_uploads`],
/// [`MediaField::next_upload`] or [`MediaField::settle_uploads`].
pub struct MediaField {
    id: FieldId,
    props: MediaFieldProps,
    state: MediaFieldState,
    attributes: Box<dyn MediaAttributes>,
    uploads: Option<UploadQueue>,
    config: Arc<Config>,
    events: Option<EventBus>,
}

impl MediaField {
    /// Mounts a field, seeded from `props.media_data`.
    pub fn new(props: MediaFieldProps, attributes: impl MediaAttributes + 'static) -> Self {
        let working = props.media_data.clone();
        let mode = if working.as_ref().is_some_and(MediaDescriptor::has_url) {
            MediaMode::Display
        } else {
            MediaMode::Editing
        };

        Self {
            id: FieldId::new(),
            props,
            state: MediaFieldState {
                mode,
                working,
                epoch: 0,
            },
            attributes: Box::new(attributes),
            uploads: None,
            config: Arc::new(Config::default()),
            events: None,
        }
    }

    /// Enables file uploads through `service`.
    pub fn with_upload_service(mut self, service: Arc<dyn UploadService>) -> Self {
        self.uploads = Some(UploadQueue::new(service));
        self
    }

    /// Uses `config` for labels and classes.
    pub fn with_config(mut self, config: Arc<Config>) -> Self {
        self.config = config;
        self
    }

    /// Announces transitions on `events`.
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    // ==================== Accessors ====================

    pub fn id(&self) -> FieldId {
        self.id
    }

    pub fn mode(&self) -> MediaMode {
        self.state.mode
    }

    pub fn is_editing(&self) -> bool {
        self.state.mode == MediaMode::Editing
    }

    pub fn props(&self) -> &MediaFieldProps {
        &self.props
    }

    /// The descriptor being typed or last accepted.
    pub fn working_media(&self) -> Option<&MediaDescriptor> {
        self.state.working.as_ref()
    }

    /// URL of the working descriptor, or an empty string.
    pub fn working_url(&self) -> &str {
        self.state
            .working
            .as_ref()
            .map(|media| media.url.as_str())
            .unwrap_or("")
    }

    /// Number of uploads not yet drained.
    pub fn uploads_in_flight(&self) -> usize {
        self.uploads.as_ref().map_or(0, UploadQueue::len)
    }

    // ==================== Transitions ====================

    /// Uploads files picked with the upload button.
    ///
    /// Returns `Ok(None)` when `files` is empty. The field changes mode
    /// only once the upload completes and is drained.
    pub fn upload_files(&mut self, files: Vec<FileBlob>) -> MediaResult<Option<UploadTicket>> {
        if files.is_empty() {
            tracing::debug!(field = %self.id, "Upload requested without files");
            return Ok(None);
        }

        let request = UploadRequest {
            files,
            kind: self.props.kind,
        };
        let epoch = self.state.epoch;
        let queue = self.uploads.as_mut().ok_or(MediaError::UploadUnavailable)?;
        let ticket = queue.start(request, epoch)?;

        tracing::debug!(field = %self.id, ticket = ticket.id, "Upload started");
        self.emit(FieldEvent::UploadStarted {
            field: self.id,
            ticket: ticket.id,
        });
        Ok(Some(ticket))
    }

    /// Uploads files dropped on the drop zone.
    pub fn drop_files(&mut self, files: Vec<FileBlob>) -> MediaResult<Option<UploadTicket>> {
        tracing::debug!(field = %self.id, count = files.len(), "Files dropped");
        self.upload_files(files)
    }

    /// Handles the media library's result; `None` means the pick was cancelled.
    pub fn select_media(&mut self, media: Option<MediaDescriptor>) -> bool {
        match media {
            Some(media) => self.accept_media(media, MediaSource::Library),
            None => {
                tracing::debug!(field = %self.id, "Library selection cancelled");
                false
            }
        }
    }

    /// Replaces the working descriptor with the typed URL.
    ///
    /// Ignored while displaying media, where no URL input is shown.
    pub fn change_url(&mut self, url: impl Into<String>) -> bool {
        if self.state.mode == MediaMode::Display {
            tracing::debug!(field = %self.id, "URL input ignored while displaying media");
            return false;
        }
        self.state.working = Some(MediaDescriptor::from_url(url));
        true
    }

    /// Accepts the typed URL, if there is one.
    pub fn submit_url(&mut self) -> bool {
        match self.state.working.as_ref().filter(|media| media.has_url()) {
            Some(media) => {
                let media = media.clone();
                self.accept_media(media, MediaSource::Url)
            }
            None => {
                tracing::debug!(field = %self.id, "Empty URL submitted");
                false
            }
        }
    }

    /// Goes back to editing and removes the media attributes.
    pub fn switch_to_editing(&mut self) -> bool {
        if self.state.mode != MediaMode::Display {
            return false;
        }

        self.state.working = None;
        self.state.epoch += 1;
        self.set_mode(MediaMode::Editing);
        self.attributes.remove_media_attributes();

        tracing::info!(field = %self.id, "Media removed");
        self.emit(FieldEvent::MediaRemoved { field: self.id });
        true
    }

    /// Forwards a caption edit to the parent.
    ///
    /// Only takes effect while the caption editor is visible.
    pub fn change_caption(&mut self, caption: &str) -> bool {
        if !self.caption_visible() {
            tracing::debug!(field = %self.id, "Caption edit ignored");
            return false;
        }
        self.attributes.set_caption(caption);
        self.emit(FieldEvent::CaptionChanged { field: self.id });
        true
    }

    /// The parent re-rendered with new props. State is kept as is.
    pub fn receive_props(&mut self, props: MediaFieldProps) {
        tracing::trace!(field = %self.id, "Props received");
        self.props = props;
    }

    /// Routes a command to its transition.
    pub fn dispatch(&mut self, command: MediaCommand) -> MediaResult<Transition> {
        tracing::trace!(field = %self.id, command = command.display_name(), "Dispatch");

        let transition = match command {
            MediaCommand::UploadFiles(files) => started(self.upload_files(files)?),
            MediaCommand::DropFiles(files) => started(self.drop_files(files)?),
            MediaCommand::SelectMedia(media) => accepted(self.select_media(media)),
            MediaCommand::ChangeUrl(url) => {
                if self.change_url(url) {
                    Transition::UrlEdited
                } else {
                    Transition::Ignored
                }
            }
            MediaCommand::SubmitUrl => accepted(self.submit_url()),
            MediaCommand::SwitchToEditing => {
                if self.switch_to_editing() {
                    Transition::Removed
                } else {
                    Transition::Ignored
                }
            }
            MediaCommand::ChangeCaption(caption) => {
                if self.change_caption(&caption) {
                    Transition::CaptionSet
                } else {
                    Transition::Ignored
                }
            }
        };
        Ok(transition)
    }

    // ==================== Uploads ====================

    /// Applies every upload that already finished, without waiting.
    ///
    /// Returns the number of completions handled.
    pub fn poll_uploads(&mut self) -> usize {
        let mut handled = 0;
        while let Some(completion) = self.uploads.as_mut().and_then(UploadQueue::try_next) {
            self.complete_upload(completion);
            handled += 1;
        }
        handled
    }

    /// Waits for the next upload and applies it.
    ///
    /// Returns whether it was accepted, or `None` if nothing is in flight.
    pub async fn next_upload(&mut self) -> Option<bool> {
        let completion = self.uploads.as_mut()?.next().await?;
        Some(self.complete_upload(completion))
    }

    /// Waits for every in-flight upload and applies them in completion order.
    pub async fn settle_uploads(&mut self) -> usize {
        let mut handled = 0;
        while self.next_upload().await.is_some() {
            handled += 1;
        }
        handled
    }

    fn complete_upload(&mut self, completion: UploadCompletion) -> bool {
        let UploadCompletion { ticket, result } = completion;

        let accepted = if ticket.epoch != self.state.epoch {
            tracing::debug!(
                field = %self.id,
                ticket = ticket.id,
                "Upload finished after another selection; discarding"
            );
            false
        } else {
            match result {
                Ok(descriptors) => {
                    let (picked, dropped) = first_with_url(descriptors);
                    if dropped > 0 {
                        tracing::debug!(
                            field = %self.id,
                            ticket = ticket.id,
                            dropped,
                            "Extra upload results discarded"
                        );
                    }
                    match picked {
                        Some(media) => self.accept_media(media, MediaSource::Upload),
                        None => {
                            tracing::warn!(
                                field = %self.id,
                                ticket = ticket.id,
                                "Upload produced no usable media"
                            );
                            false
                        }
                    }
                }
                Err(err) => {
                    tracing::warn!(field = %self.id, ticket = ticket.id, "Upload failed: {}", err);
                    false
                }
            }
        };

        if !accepted {
            self.emit(FieldEvent::UploadDiscarded {
                field: self.id,
                ticket: ticket.id,
            });
        }
        accepted
    }

    // ==================== Rendering ====================

    /// Read-only projection for the host renderer.
    pub fn view(&self) -> MediaFieldView {
        view::render(self.state.mode, self.working_url(), &self.props, &self.config)
    }

    fn caption_visible(&self) -> bool {
        self.state.mode == MediaMode::Display && self.props.caption && self.props.is_selected
    }

    // ==================== Internals ====================

    /// The single write-back point for every selection pathway.
    fn accept_media(&mut self, media: MediaDescriptor, source: MediaSource) -> bool {
        if !media.has_url() {
            tracing::debug!(field = %self.id, ?source, "Media without URL ignored");
            return false;
        }
        if self.state.mode == MediaMode::Display && self.state.working.as_ref() == Some(&media) {
            tracing::debug!(field = %self.id, ?source, "Media already displayed");
            return false;
        }

        let url = media.url.clone();
        self.state.working = Some(media);
        self.state.epoch += 1;
        self.set_mode(MediaMode::Display);
        if let Some(media) = &self.state.working {
            self.attributes.set_media_attributes(media);
        }

        tracing::info!(field = %self.id, url = %url, ?source, "Media accepted");
        self.emit(FieldEvent::MediaAccepted {
            field: self.id,
            url,
            source,
        });
        true
    }

    fn set_mode(&mut self, mode: MediaMode) {
        if self.state.mode != mode {
            self.state.mode = mode;
            self.emit(FieldEvent::ModeChanged {
                field: self.id,
                mode,
            });
        }
    }

    fn emit(&self, event: FieldEvent) {
        if let Some(events) = &self.events {
            events.emit(event);
        }
    }
}

impl std::fmt::Debug for MediaField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaField")
            .field("id", &self.id)
            .field("props", &self.props)
            .field("state", &self.state)
            .field("uploads", &self.uploads)
            .finish_non_exhaustive()
    }
}

fn accepted(flag: bool) -> Transition {
    if flag {
        Transition::Accepted
    } else {
        Transition::Ignored
    }
}

fn started(ticket: Option<UploadTicket>) -> Transition {
    ticket.map_or(Transition::Ignored, Transition::UploadStarted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{AttributeBinding, MediaCallbacks};
    use crate::upload::UploadError;
    use async_trait::async_trait;
    use blockfields_core::{AttributeStore, EventHandler, MediaKind};
    use proptest::prelude::*;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Set(MediaDescriptor),
        Remove,
        Caption(String),
    }

    type Calls = Rc<RefCell<Vec<Call>>>;

    fn recorder() -> (MediaCallbacks, Calls) {
        let calls: Calls = Rc::new(RefCell::new(Vec::new()));
        let (a, b, c) = (Rc::clone(&calls), Rc::clone(&calls), Rc::clone(&calls));
        let callbacks = MediaCallbacks::new(
            move |media| a.borrow_mut().push(Call::Set(media.clone())),
            move || b.borrow_mut().push(Call::Remove),
            move |caption| c.borrow_mut().push(Call::Caption(caption.to_string())),
        );
        (callbacks, calls)
    }

    fn field(props: MediaFieldProps) -> (MediaField, Calls) {
        let (callbacks, calls) = recorder();
        (MediaField::new(props, callbacks), calls)
    }

    fn set_calls(calls: &Calls) -> Vec<MediaDescriptor> {
        calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                Call::Set(media) => Some(media.clone()),
                _ => None,
            })
            .collect()
    }

    fn video() -> MediaFieldProps {
        MediaFieldProps::new(MediaKind::Video)
    }

    fn file(name: &str) -> FileBlob {
        FileBlob::new(name, "video/mp4", vec![0; 4])
    }

    /// Returns the same descriptors for every upload.
    struct StaticUploads(Vec<MediaDescriptor>);

    #[async_trait]
    impl UploadService for StaticUploads {
        async fn upload(&self, _request: UploadRequest) -> Result<Vec<MediaDescriptor>, UploadError> {
            Ok(self.0.clone())
        }
    }

    /// One descriptor per file, named after the file.
    struct NamedUploads;

    #[async_trait]
    impl UploadService for NamedUploads {
        async fn upload(&self, request: UploadRequest) -> Result<Vec<MediaDescriptor>, UploadError> {
            Ok(request
                .files
                .iter()
                .map(|file| {
                    MediaDescriptor::from_url(format!("http://media/{}", file.name))
                        .with_field("kind", request.kind.as_str())
                })
                .collect())
        }
    }

    struct FailingUploads;

    #[async_trait]
    impl UploadService for FailingUploads {
        async fn upload(&self, _request: UploadRequest) -> Result<Vec<MediaDescriptor>, UploadError> {
            Err(UploadError::Transport("connection reset".to_string()))
        }
    }

    struct SlowUploads;

    #[async_trait]
    impl UploadService for SlowUploads {
        async fn upload(&self, _request: UploadRequest) -> Result<Vec<MediaDescriptor>, UploadError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(vec![MediaDescriptor::from_url("http://late")])
        }
    }

    #[test]
    fn test_seed_selects_initial_mode() {
        let (editing, _) = field(video());
        assert_eq!(editing.mode(), MediaMode::Editing);
        assert_eq!(editing.working_url(), "");

        let (empty_url, _) = field(video().with_media(MediaDescriptor::from_url("")));
        assert_eq!(empty_url.mode(), MediaMode::Editing);

        let (display, calls) = field(video().with_media(MediaDescriptor::from_url("http://x/a.mp4")));
        assert_eq!(display.mode(), MediaMode::Display);
        assert_eq!(display.working_url(), "http://x/a.mp4");
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_url_entry_then_submit() {
        let (mut field, calls) = field(video());

        assert!(field.change_url("http://x/a.mp4"));
        assert_eq!(field.working_url(), "http://x/a.mp4");
        assert_eq!(field.mode(), MediaMode::Editing);
        assert!(calls.borrow().is_empty());

        assert!(field.submit_url());
        assert_eq!(field.mode(), MediaMode::Display);
        assert_eq!(
            *calls.borrow(),
            vec![Call::Set(MediaDescriptor::from_url("http://x/a.mp4"))]
        );
    }

    #[test]
    fn test_edit_toggle_removes_media() {
        let (mut field, calls) = field(
            video()
                .with_media(MediaDescriptor::from_url("http://x/a.mp4"))
                .selected(true),
        );

        assert!(field.switch_to_editing());
        assert_eq!(field.mode(), MediaMode::Editing);
        assert!(field.working_media().is_none());
        assert_eq!(*calls.borrow(), vec![Call::Remove]);

        assert!(!field.switch_to_editing());
        assert_eq!(*calls.borrow(), vec![Call::Remove]);
    }

    #[test]
    fn test_rejections_leave_field_untouched() {
        let (mut field, calls) = field(video());

        assert!(!field.submit_url());
        assert!(field.change_url(""));
        assert!(!field.submit_url());
        assert!(!field.select_media(Some(MediaDescriptor::from_url(""))));
        assert!(!field.select_media(None));

        assert_eq!(field.mode(), MediaMode::Editing);
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_malformed_url_is_accepted_as_is() {
        let (mut field, calls) = field(video());
        field.change_url("not a url");
        assert!(field.submit_url());
        assert_eq!(set_calls(&calls)[0].url, "not a url");
    }

    #[test]
    fn test_url_input_ignored_while_displaying() {
        let (mut field, _) = field(video().with_media(MediaDescriptor::from_url("http://x/a.mp4")));
        assert!(!field.change_url(""));
        assert_eq!(field.mode(), MediaMode::Display);
        assert_eq!(field.working_url(), "http://x/a.mp4");
    }

    #[test]
    fn test_library_pick_replaces_displayed_media() {
        let (mut field, calls) = field(video().with_media(MediaDescriptor::from_url("http://x/a.mp4")));
        let picked = MediaDescriptor::from_url("http://x/b.mp4").with_field("id", 9);

        assert!(field.select_media(Some(picked.clone())));
        assert_eq!(field.working_media(), Some(&picked));

        assert!(!field.select_media(Some(picked.clone())));
        assert_eq!(set_calls(&calls), vec![picked]);
    }

    #[test]
    fn test_caption_only_when_visible() {
        let media = MediaDescriptor::from_url("http://x/a.mp4").with_caption("Old");
        let (mut field, calls) = field(video().with_media(media.clone()).with_caption(true));

        assert!(!field.change_caption("New"));

        field.receive_props(video().with_media(media).with_caption(true).selected(true));
        assert_eq!(field.mode(), MediaMode::Display);
        assert!(field.change_caption("New"));
        assert_eq!(*calls.borrow(), vec![Call::Caption("New".to_string())]);

        field.switch_to_editing();
        assert!(!field.change_caption("Newer"));
    }

    #[test]
    fn test_receive_props_does_not_reseed() {
        let (mut field, _) = field(video());
        field.receive_props(video().with_media(MediaDescriptor::from_url("http://x/a.mp4")));
        assert_eq!(field.mode(), MediaMode::Editing);
        assert_eq!(field.working_url(), "");
    }

    #[test]
    fn test_dispatch_routes_commands() {
        let (mut field, calls) = field(video().selected(true));

        let steps = [
            (MediaCommand::SubmitUrl, Transition::Ignored),
            (MediaCommand::ChangeUrl("http://x/a.mp4".into()), Transition::UrlEdited),
            (MediaCommand::SubmitUrl, Transition::Accepted),
            (MediaCommand::ChangeCaption("c".into()), Transition::Ignored),
            (MediaCommand::SwitchToEditing, Transition::Removed),
            (MediaCommand::SelectMedia(None), Transition::Ignored),
            (MediaCommand::UploadFiles(Vec::new()), Transition::Ignored),
        ];
        for (command, expected) in steps {
            assert_eq!(field.dispatch(command).unwrap(), expected);
        }
        assert_eq!(calls.borrow().len(), 2);
    }

    #[test]
    fn test_upload_without_service_or_runtime() {
        let (mut field, _) = field(video());
        assert!(matches!(
            field.upload_files(vec![file("a.mp4")]),
            Err(MediaError::UploadUnavailable)
        ));

        let (callbacks, _) = recorder();
        let mut field = MediaField::new(video(), callbacks).with_upload_service(Arc::new(NamedUploads));
        assert!(matches!(
            field.upload_files(vec![file("a.mp4")]),
            Err(MediaError::NoRuntime)
        ));
        assert_eq!(field.uploads_in_flight(), 0);
    }

    #[tokio::test]
    async fn test_upload_accepts_first_descriptor_with_url() {
        let (callbacks, calls) = recorder();
        let mut field = MediaField::new(video(), callbacks).with_upload_service(Arc::new(
            StaticUploads(vec![
                MediaDescriptor::from_url(""),
                MediaDescriptor::from_url("http://y/b.jpg"),
            ]),
        ));

        let ticket = field.upload_files(vec![file("a"), file("b")]).unwrap();
        assert!(ticket.is_some());
        assert_eq!(field.mode(), MediaMode::Editing);

        assert_eq!(field.next_upload().await, Some(true));
        assert_eq!(field.mode(), MediaMode::Display);
        assert_eq!(field.working_url(), "http://y/b.jpg");
        assert_eq!(set_calls(&calls), vec![MediaDescriptor::from_url("http://y/b.jpg")]);
        assert_eq!(field.next_upload().await, None);
    }

    #[tokio::test]
    async fn test_pathways_converge() {
        let target = MediaDescriptor::from_url("http://x/a.mp4");

        let (mut by_url, url_calls) = field(video());
        by_url.change_url("http://x/a.mp4");
        by_url.submit_url();

        let (mut by_library, library_calls) = field(video());
        by_library.select_media(Some(target.clone()));

        let (callbacks, upload_calls) = recorder();
        let mut by_upload = MediaField::new(video(), callbacks)
            .with_upload_service(Arc::new(StaticUploads(vec![target.clone()])));
        by_upload.drop_files(vec![file("a.mp4")]).unwrap();
        by_upload.settle_uploads().await;

        for (field, calls) in [
            (&by_url, &url_calls),
            (&by_library, &library_calls),
            (&by_upload, &upload_calls),
        ] {
            assert_eq!(field.mode(), MediaMode::Display);
            assert_eq!(field.working_media(), Some(&target));
            assert_eq!(set_calls(calls), vec![target.clone()]);
        }
    }

    #[tokio::test]
    async fn test_upload_request_carries_kind() {
        let attributes = AttributeStore::new().shared();
        let binding = AttributeBinding::new(Rc::clone(&attributes), "clip");
        let mut field = MediaField::new(video(), binding).with_upload_service(Arc::new(NamedUploads));

        field.upload_files(vec![file("a.mp4")]).unwrap();
        field.settle_uploads().await;

        assert_eq!(
            attributes.borrow().get("clip"),
            Some(&json!({"url": "http://media/a.mp4", "kind": "video"}))
        );
    }

    #[tokio::test]
    async fn test_concurrent_uploads_first_wins() {
        let (callbacks, calls) = recorder();
        let mut field = MediaField::new(video(), callbacks).with_upload_service(Arc::new(NamedUploads));

        field.upload_files(vec![file("a.mp4")]).unwrap();
        field.upload_files(vec![file("b.mp4")]).unwrap();
        assert_eq!(field.uploads_in_flight(), 2);

        assert_eq!(field.settle_uploads().await, 2);
        assert_eq!(field.mode(), MediaMode::Display);
        assert_eq!(set_calls(&calls).len(), 1);
    }

    #[tokio::test]
    async fn test_upload_loses_to_url_submit() {
        let (callbacks, calls) = recorder();
        let mut field = MediaField::new(video(), callbacks).with_upload_service(Arc::new(NamedUploads));

        field.upload_files(vec![file("a.mp4")]).unwrap();
        field.change_url("http://x/typed.mp4");
        field.submit_url();

        assert_eq!(field.next_upload().await, Some(false));
        assert_eq!(field.working_url(), "http://x/typed.mp4");
        assert_eq!(set_calls(&calls).len(), 1);
    }

    #[tokio::test]
    async fn test_failed_or_empty_upload_keeps_mode() {
        let bus = EventBus::new();
        let mut handler = EventHandler::new(bus.subscribe());

        let (callbacks, calls) = recorder();
        let mut field = MediaField::new(video(), callbacks)
            .with_upload_service(Arc::new(FailingUploads))
            .with_events(bus.clone());
        field.upload_files(vec![file("a.mp4")]).unwrap();
        assert_eq!(field.next_upload().await, Some(false));
        assert_eq!(field.mode(), MediaMode::Editing);

        let (callbacks, _) = recorder();
        let mut empty = MediaField::new(video(), callbacks)
            .with_upload_service(Arc::new(StaticUploads(Vec::new())));
        empty.upload_files(vec![file("a.mp4")]).unwrap();
        assert_eq!(empty.next_upload().await, Some(false));
        assert_eq!(empty.mode(), MediaMode::Editing);

        assert!(calls.borrow().is_empty());
        let events = handler.drain();
        assert!(matches!(events[0], FieldEvent::UploadStarted { .. }));
        assert!(matches!(events[1], FieldEvent::UploadDiscarded { .. }));
    }

    #[tokio::test]
    async fn test_poll_uploads_applies_finished_work() {
        let (callbacks, calls) = recorder();
        let mut field = MediaField::new(video(), callbacks).with_upload_service(Arc::new(NamedUploads));

        field.upload_files(vec![file("a.mp4")]).unwrap();
        while field.poll_uploads() == 0 {
            tokio::task::yield_now().await;
        }

        assert_eq!(field.mode(), MediaMode::Display);
        assert_eq!(set_calls(&calls).len(), 1);
        assert_eq!(field.uploads_in_flight(), 0);
    }

    #[tokio::test]
    async fn test_unmount_aborts_uploads() {
        let service: Arc<dyn UploadService> = Arc::new(SlowUploads);
        let (callbacks, calls) = recorder();
        let mut field = MediaField::new(video(), callbacks).with_upload_service(Arc::clone(&service));

        field.upload_files(vec![file("a.mp4")]).unwrap();
        tokio::task::yield_now().await;
        assert_eq!(Arc::strong_count(&service), 3);

        drop(field);
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(Arc::strong_count(&service), 1);
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_events_follow_transitions() {
        let bus = EventBus::new();
        let mut handler = EventHandler::new(bus.subscribe());
        let (callbacks, _) = recorder();
        let mut field = MediaField::new(video().selected(true), callbacks).with_events(bus);

        field.change_url("http://x/a.mp4");
        field.submit_url();
        field.switch_to_editing();

        let events = handler.drain();
        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], FieldEvent::ModeChanged { mode: MediaMode::Display, .. }));
        assert!(matches!(
            &events[1],
            FieldEvent::MediaAccepted { source: MediaSource::Url, url, .. } if url == "http://x/a.mp4"
        ));
        assert!(matches!(events[2], FieldEvent::ModeChanged { mode: MediaMode::Editing, .. }));
        assert!(matches!(events[3], FieldEvent::MediaRemoved { .. }));
    }

    #[test]
    fn test_view_follows_mode() {
        let mut props = video().with_caption(true);
        props.button_text = "Upload video".to_string();
        let (mut field, _) = field(props);

        field.change_url("http://x/a.mp4");
        let placeholder = field.view();
        let placeholder = placeholder.placeholder().unwrap();
        assert_eq!(placeholder.url_form.value, "http://x/a.mp4");
        assert_eq!(placeholder.upload_button.accept, "video/*");

        field.submit_url();
        let view = field.view();
        let display = view.display().unwrap();
        assert!(display.toolbar.is_none());
        assert!(display.figure.caption.is_none());
        assert_eq!(display.figure.player.as_ref().unwrap().src, "http://x/a.mp4");

        let mut props = field.props().clone();
        props.is_selected = true;
        props.media_data = Some(MediaDescriptor::from_url("http://x/a.mp4").with_caption("Hi"));
        field.receive_props(props);

        let view = field.view();
        let display = view.display().unwrap();
        assert_eq!(display.toolbar.as_ref().unwrap().label, "Edit video");
        assert_eq!(display.figure.caption.as_ref().unwrap().value, "Hi");
    }

    #[test]
    fn test_audio_and_image_players() {
        let (audio, _) = field(
            MediaFieldProps::new(MediaKind::Audio).with_media(MediaDescriptor::from_url("a.mp3")),
        );
        let view = audio.view();
        let player = view.display().unwrap().figure.player.as_ref().unwrap();
        assert_eq!(player.kind, MediaKind::Audio);

        let (image, _) = field(
            MediaFieldProps::new(MediaKind::Image).with_media(MediaDescriptor::from_url("b.jpg")),
        );
        assert!(image.view().display().unwrap().figure.player.is_none());
    }

    proptest! {
        #[test]
        fn prop_seed_mode_matches_url(url in "[a-z:/.]{0,12}") {
            let (field, _) = field(video().with_media(MediaDescriptor::from_url(url.clone())));
            prop_assert_eq!(field.mode() == MediaMode::Display, !url.is_empty());
        }

        #[test]
        fn prop_urlless_media_never_accepted(
            seed in proptest::option::of("[a-z]{1,8}"),
            caption in proptest::option::of("[a-z ]{0,8}"),
        ) {
            let props = match &seed {
                Some(url) => video().with_media(MediaDescriptor::from_url(url.clone())),
                None => video(),
            };
            let (mut field, calls) = field(props);
            let before = field.mode();

            let mut media = MediaDescriptor::from_url("");
            media.media_caption = caption;
            prop_assert!(!field.select_media(Some(media)));
            prop_assert!(set_calls(&calls).is_empty());

            if seed.is_some() {
                // Submitting re-offers the displayed seed, which is a no-op.
                prop_assert!(!field.submit_url());
                prop_assert!(set_calls(&calls).is_empty());
            } else {
                prop_assert!(field.change_url(""));
                prop_assert!(!field.submit_url());
                prop_assert!(set_calls(&calls).is_empty());
            }

            prop_assert_eq!(field.mode(), before);
        }

        #[test]
        fn prop_toggle_always_returns_to_editing(url in "[a-z]{1,8}", typed in "[a-z]{0,8}") {
            let (mut field, calls) = field(video());
            field.select_media(Some(MediaDescriptor::from_url(url)));
            calls.borrow_mut().clear();

            prop_assert!(field.switch_to_editing());
            prop_assert_eq!(field.mode(), MediaMode::Editing);
            prop_assert!(field.working_media().is_none());
            prop_assert_eq!(calls.borrow().clone(), vec![Call::Remove]);

            field.change_url(typed);
            prop_assert_eq!(field.mode(), MediaMode::Editing);
        }
    }
}
