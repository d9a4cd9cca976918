//! Local image staging for the wizards.
//!
//! Files picked in the UI are screened and held locally; nothing touches the
//! network until submission commits the whole set. An [`ImageSet`] also
//! tracks the already-uploaded URLs of a record being edited, so removing a
//! staged file and removing an existing image stay distinct operations.

use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::notify::{Notification, NotificationSink};

/// Largest accepted image, 2 MiB.
pub const MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;

/// A file handed over by the picker, before screening.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// An accepted file waiting for upload at submission time.
#[derive(Debug, Clone)]
pub struct StagedImage {
    /// Opaque handle the UI can use for a local preview.
    pub preview_ref: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Why a picked file was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("not an image")]
    NotAnImage,
    #[error("larger than 2 MB")]
    TooLarge,
}

/// A file the screening turned away, with enough context to tell the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedFile {
    pub file_name: String,
    pub reason: RejectReason,
}

impl std::fmt::Display for RejectedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.file_name, self.reason)
    }
}

/// Existing image URLs plus locally staged files, in display order.
#[derive(Debug, Clone, Default)]
pub struct ImageSet {
    existing: Vec<String>,
    staged: Vec<StagedImage>,
}

impl ImageSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the set with the URLs already on a persisted record.
    pub fn from_existing(urls: Vec<String>) -> Self {
        Self {
            existing: urls,
            staged: Vec::new(),
        }
    }

    /// Screens a picked batch. Accepted files join the staged list; the
    /// rejects come back so they can be reported. One bad file never blocks
    /// the rest of its batch.
    pub fn select_files(&mut self, files: Vec<SelectedFile>) -> Vec<RejectedFile> {
        let mut rejected = Vec::new();
        for file in files {
            if !file.content_type.starts_with("image/") {
                rejected.push(RejectedFile {
                    file_name: file.file_name,
                    reason: RejectReason::NotAnImage,
                });
                continue;
            }
            if file.bytes.len() > MAX_IMAGE_BYTES {
                rejected.push(RejectedFile {
                    file_name: file.file_name,
                    reason: RejectReason::TooLarge,
                });
                continue;
            }
            self.staged.push(StagedImage {
                preview_ref: format!("staged://{}", Uuid::new_v4()),
                file_name: file.file_name,
                content_type: file.content_type,
                bytes: file.bytes,
            });
        }
        rejected
    }

    /// Drops a staged file by position. Out-of-range indices are ignored.
    pub fn remove_staged(&mut self, index: usize) -> Option<StagedImage> {
        if index < self.staged.len() {
            Some(self.staged.remove(index))
        } else {
            None
        }
    }

    /// Drops an already-uploaded URL by position. Out-of-range indices are
    /// ignored.
    pub fn remove_existing(&mut self, index: usize) -> Option<String> {
        if index < self.existing.len() {
            Some(self.existing.remove(index))
        } else {
            None
        }
    }

    pub fn existing(&self) -> &[String] {
        &self.existing
    }

    pub fn staged(&self) -> &[StagedImage] {
        &self.staged
    }

    pub fn has_staged(&self) -> bool {
        !self.staged.is_empty()
    }

    /// Existing plus staged, the number of images the user currently sees.
    pub fn total_count(&self) -> usize {
        self.existing.len() + self.staged.len()
    }

    /// Final URL list for a payload: retained existing URLs first, then the
    /// freshly uploaded ones in staging order.
    pub fn merged_urls(&self, uploaded: Vec<String>) -> Vec<String> {
        let mut urls = self.existing.clone();
        urls.extend(uploaded);
        urls
    }
}

/// Stages a picked batch and surfaces one error notification per reject.
pub fn stage_selection(
    images: &mut ImageSet,
    files: Vec<SelectedFile>,
    sink: &dyn NotificationSink,
) {
    for rejection in images.select_files(files) {
        warn!(file = %rejection.file_name, reason = %rejection.reason, "image rejected");
        sink.notify(Notification::error(rejection.to_string()));
    }
}
