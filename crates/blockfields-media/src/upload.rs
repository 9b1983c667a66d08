//! Upload capability and the per-field upload queue.
//!
//! ## Learning: Background Work Without Shared State
//!
//! The field lives on the dispatch thread and is not `Send`. Uploads
//! run as tokio tasks that own only their request and an `Arc` of the
//! service. Results come back as values through a `JoinSet`, which the
//! field drains on its own thread.
//!
//! Dropping a `JoinSet` aborts every task in it, so an unmounted field
//! can never receive a late completion.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinSet;

use blockfields_core::{FileBlob, MediaDescriptor, MediaKind};

use crate::{MediaError, MediaResult};

/// Upload failures reported by a service.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Upload rejected: {0}")]
    Rejected(String),

    #[error("Upload transport failed: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Files to upload plus the kind of media the field expects.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub files: Vec<FileBlob>,
    pub kind: MediaKind,
}

/// Uploads files and describes the stored media.
///
/// A service may return fewer descriptors than files, or none at all.
#[async_trait]
pub trait UploadService: Send + Sync {
    async fn upload(&self, request: UploadRequest) -> Result<Vec<MediaDescriptor>, UploadError>;
}

/// Identifies one upload started by a field.
///
/// `epoch` is the field's acceptance epoch when the upload started; a
/// completion from an older epoch lost the race and is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UploadTicket {
    pub id: u64,
    pub epoch: u64,
}

/// Result of one finished upload.
#[derive(Debug)]
pub struct UploadCompletion {
    pub ticket: UploadTicket,
    pub result: Result<Vec<MediaDescriptor>, UploadError>,
}

/// Picks the first descriptor with a URL.
///
/// Returns the pick and how many other descriptors were dropped.
pub fn first_with_url(descriptors: Vec<MediaDescriptor>) -> (Option<MediaDescriptor>, usize) {
    let total = descriptors.len();
    let picked = descriptors.into_iter().find(MediaDescriptor::has_url);
    let dropped = total - usize::from(picked.is_some());
    (picked, dropped)
}

/// In-flight uploads of one field.
pub(crate) struct UploadQueue {
    service: Arc<dyn UploadService>,
    tasks: JoinSet<UploadCompletion>,
    next_id: u64,
}

impl UploadQueue {
    pub(crate) fn new(service: Arc<dyn UploadService>) -> Self {
        Self {
            service,
            tasks: JoinSet::new(),
            next_id: 0,
        }
    }

    /// Spawns an upload on the current runtime.
    pub(crate) fn start(&mut self, request: UploadRequest, epoch: u64) -> MediaResult<UploadTicket> {
        let handle = Handle::try_current().map_err(|_| MediaError::NoRuntime)?;
        let ticket = UploadTicket {
            id: self.next_id,
            epoch,
        };
        self.next_id += 1;

        let service = Arc::clone(&self.service);
        self.tasks.spawn_on(
            async move {
                let result = service.upload(request).await;
                UploadCompletion { ticket, result }
            },
            &handle,
        );
        Ok(ticket)
    }

    /// Number of uploads still running or waiting to be drained.
    pub(crate) fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns a finished upload without waiting.
    pub(crate) fn try_next(&mut self) -> Option<UploadCompletion> {
        loop {
            match self.tasks.try_join_next()? {
                Ok(completion) => return Some(completion),
                Err(err) => tracing::warn!("Upload task failed: {}", err),
            }
        }
    }

    /// Waits for the next finished upload.
    ///
    /// Returns `None` once nothing is in flight.
    pub(crate) async fn next(&mut self) -> Option<UploadCompletion> {
        loop {
            match self.tasks.join_next().await? {
                Ok(completion) => return Some(completion),
                Err(err) => tracing::warn!("Upload task failed: {}", err),
            }
        }
    }
}

impl std::fmt::Debug for UploadQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadQueue")
            .field("in_flight", &self.tasks.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}
