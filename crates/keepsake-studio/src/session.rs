use jiff::Timestamp;
use keepsake_compress::CompressedImage;
use keepsake_imagegen::GenerationResult;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{GENERATION_FAILED_MESSAGE, Result, StudioError};

/// One uploaded reference image, already compressed
#[derive(Debug, Clone)]
pub struct ImageEntry {
    pub data_url: String,
    pub size: usize,
    pub width: u32,
    pub height: u32,
}

impl From<CompressedImage> for ImageEntry {
    fn from(image: CompressedImage) -> Self {
        Self {
            data_url: image.to_data_url(),
            size: image.len(),
            width: image.width,
            height: image.height,
        }
    }
}

/// Ordered images with a fixed capacity
#[derive(Debug, Clone)]
pub struct ImageSet {
    entries: Vec<ImageEntry>,
    capacity: usize,
}

impl ImageSet {
    pub const fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// How many more images fit
    pub fn remaining(&self) -> usize {
        self.capacity.saturating_sub(self.entries.len())
    }

    /// Append as many entries as fit, returning how many were accepted
    pub fn extend(&mut self, batch: impl IntoIterator<Item = ImageEntry>) -> usize {
        let before = self.entries.len();
        let remaining = self.remaining();
        self.entries.extend(batch.into_iter().take(remaining));
        self.entries.len() - before
    }

    /// Remove the entry at `index`, shifting later entries down
    pub fn remove(&mut self, index: usize) -> Option<ImageEntry> {
        (index < self.entries.len()).then(|| self.entries.remove(index))
    }

    pub fn data_urls(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.data_url.clone()).collect()
    }
}

/// A generated card
#[derive(Debug, Clone)]
pub struct GeneratedCard {
    pub image_url: String,
    pub request_id: String,
    pub completed_at: Timestamp,
}

impl From<GenerationResult> for GeneratedCard {
    fn from(result: GenerationResult) -> Self {
        Self {
            image_url: result.image_url,
            request_id: result.request_id,
            completed_at: Timestamp::now(),
        }
    }
}

/// Where a session is in the upload then generate flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Uploading,
    Generating,
    Complete,
    Failed,
}

/// State for one browser visitor
#[derive(Debug)]
pub struct Session {
    images: ImageSet,
    uploading: bool,
    generating: bool,
    card: Option<GeneratedCard>,
    error: Option<String>,
}

impl Session {
    pub const fn new(max_images: usize) -> Self {
        Self {
            images: ImageSet::new(max_images),
            uploading: false,
            generating: false,
            card: None,
            error: None,
        }
    }

    pub const fn images(&self) -> &ImageSet {
        &self.images
    }

    pub const fn card(&self) -> Option<&GeneratedCard> {
        self.card.as_ref()
    }

    /// Current phase
    ///
    /// A previous card stays visible after a failed regeneration, so
    /// `Complete` wins over `Failed`.
    pub const fn phase(&self) -> Phase {
        if self.generating {
            Phase::Generating
        } else if self.uploading {
            Phase::Uploading
        } else if self.card.is_some() {
            Phase::Complete
        } else if self.error.is_some() {
            Phase::Failed
        } else {
            Phase::Idle
        }
    }

    /// Mark an upload as running and return the remaining capacity
    pub fn begin_upload(&mut self) -> Result<usize> {
        if self.uploading {
            return Err(StudioError::UploadInProgress);
        }
        self.uploading = true;
        Ok(self.images.remaining())
    }

    /// End the running upload, appending `batch` when it fully succeeded
    pub fn finish_upload(&mut self, batch: Option<Vec<ImageEntry>>) -> usize {
        self.uploading = false;
        batch.map_or(0, |entries| self.images.extend(entries))
    }

    pub fn remove_image(&mut self, index: usize) -> Result<ImageEntry> {
        self.images.remove(index).ok_or(StudioError::ImageNotFound(index))
    }

    /// Mark a generation as pending and return the images to send
    pub fn begin_generation(&mut self) -> Result<Vec<String>> {
        if self.images.is_empty() {
            return Err(StudioError::NoImages);
        }
        if self.generating {
            return Err(StudioError::GenerationInProgress);
        }
        self.generating = true;
        self.error = None;
        Ok(self.images.data_urls())
    }

    /// Record the outcome of the pending generation
    pub fn finish_generation(&mut self, card: Option<GeneratedCard>) {
        self.generating = false;
        match card {
            Some(card) => {
                self.card = Some(card);
                self.error = None;
            }
            None => self.error = Some(GENERATION_FAILED_MESSAGE.to_string()),
        }
    }

    pub fn view(&self, id: Uuid) -> SessionView {
        SessionView {
            id,
            images: self.images.data_urls(),
            count: self.images.len(),
            max_images: self.images.capacity(),
            phase: self.phase(),
            image_url: self.card.as_ref().map(|card| card.image_url.clone()),
            completed_at: self.card.as_ref().map(|card| card.completed_at),
            error: self.error.clone(),
        }
    }
}

/// Session state as returned to the browser
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: Uuid,
    pub images: Vec<String>,
    pub count: usize,
    pub max_images: usize,
    pub phase: Phase,
    pub image_url: Option<String>,
    pub completed_at: Option<Timestamp>,
    pub error: Option<String>,
}
