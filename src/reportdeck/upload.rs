//! # Upload Coordinator
//!
//! Sits between a file source (picker or drop zone) and
//! [`ReportStore::upload_report`]. It validates the file, drives the store's
//! upload, and keeps a widget-local [`StatusMessage`] describing what happened.
//!
//! Status lifecycle for one attempt:
//!
//! ```text
//!   invalid file ─────────────▶ Error(validation message)      (persists)
//!   valid file ──▶ Info("Uploading <name>...")
//!                     ├─ ok ──▶ Success("<name> uploaded successfully!") ──5s──▶ None
//!                     └─ err ─▶ Error(repository message)     (persists)
//! ```
//!
//! A new attempt cancels a pending success reset. Uploads cannot be cancelled
//! once started.
//!
//! The drop zone and the picker are inert while any request is in flight:
//! [`UploadCoordinator::handle_drop`] and [`UploadCoordinator::handle_selection`]
//! ignore files until the store stops loading.

use crate::config::UploadLimits;
use crate::error::{ReportError, Result};
use crate::model::{Report, UploadFile};
use crate::repository::ReportRepository;
use crate::store::{ReportStore, UPLOAD_FAILED};
use crate::timer::Timer;
use crate::validation::validate_file;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusKind {
    #[default]
    None,
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusMessage {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Info,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            text: text.into(),
        }
    }

    pub fn is_none(&self) -> bool {
        self.kind == StatusKind::None
    }
}

#[derive(Debug, Default)]
struct PickerState {
    /// Name of the file currently held by the picker input.
    selected_file: Option<String>,
    is_dragging: bool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct UploadCoordinator<R: ReportRepository> {
    store: ReportStore<R>,
    limits: UploadLimits,
    status_reset_after: Duration,
    status: Arc<Mutex<StatusMessage>>,
    status_reset: Mutex<Timer>,
    picker: Mutex<PickerState>,
}

impl<R: ReportRepository> UploadCoordinator<R> {
    pub fn new(store: ReportStore<R>, limits: UploadLimits, status_reset_after: Duration) -> Self {
        Self {
            store,
            limits,
            status_reset_after,
            status: Arc::new(Mutex::new(StatusMessage::none())),
            status_reset: Mutex::new(Timer::new("upload-status-reset")),
            picker: Mutex::new(PickerState::default()),
        }
    }

    pub fn status(&self) -> StatusMessage {
        lock(&self.status).clone()
    }

    pub fn upload_progress(&self) -> u8 {
        self.store.snapshot().upload_progress
    }

    pub fn is_loading(&self) -> bool {
        self.store.snapshot().is_loading
    }

    /// The file input is disabled while any request is in flight.
    pub fn can_open_picker(&self) -> bool {
        !self.is_loading()
    }

    pub fn selected_file(&self) -> Option<String> {
        lock(&self.picker).selected_file.clone()
    }

    pub fn is_dragging(&self) -> bool {
        lock(&self.picker).is_dragging
    }

    pub fn on_drag_enter(&self) {
        lock(&self.picker).is_dragging = true;
    }

    pub fn on_drag_leave(&self) {
        lock(&self.picker).is_dragging = false;
    }

    /// Handles files dropped on the zone. Only the first file is used.
    /// Ignored while loading.
    pub async fn handle_drop(&self, files: Vec<UploadFile>) -> Result<Option<Report>> {
        lock(&self.picker).is_dragging = false;
        if self.is_loading() {
            tracing::debug!("drop ignored while loading");
            return Ok(None);
        }
        match files.into_iter().next() {
            Some(file) => self.handle_file(file).await.map(Some),
            None => Ok(None),
        }
    }

    /// Handles a picker selection. Only the first file is used.
    /// Ignored while loading.
    pub async fn handle_selection(&self, files: Vec<UploadFile>) -> Result<Option<Report>> {
        if !self.can_open_picker() {
            tracing::debug!("selection ignored while loading");
            return Ok(None);
        }
        match files.into_iter().next() {
            Some(file) => {
                lock(&self.picker).selected_file = Some(file.name.clone());
                self.handle_file(file).await.map(Some)
            }
            None => Ok(None),
        }
    }

    /// Validates and uploads `file`, updating the status message as it goes.
    ///
    /// Unlike the drop and picker entry points this does not check
    /// `is_loading`; callers feeding it directly must await one upload
    /// before starting the next.
    pub async fn handle_file(&self, file: UploadFile) -> Result<Report> {
        lock(&self.status_reset).cancel();

        if let Err(err) = validate_file(&file, &self.limits) {
            tracing::debug!(file = %file.name, reason = %err, "rejected file");
            self.set_status(StatusMessage::error(err.to_string()));
            return Err(ReportError::Validation(err));
        }

        self.set_status(StatusMessage::info(format!("Uploading {}...", file.name)));

        match self.store.upload_report(&file).await {
            Ok(report) => {
                self.set_status(StatusMessage::success(format!(
                    "{} uploaded successfully!",
                    file.name
                )));
                lock(&self.picker).selected_file = None;
                self.schedule_status_reset();
                Ok(report)
            }
            Err(err) => {
                let text = match err.to_string() {
                    message if message.trim().is_empty() => UPLOAD_FAILED.to_string(),
                    message => message,
                };
                self.set_status(StatusMessage::error(text));
                Err(err)
            }
        }
    }

    fn set_status(&self, status: StatusMessage) {
        *lock(&self.status) = status;
    }

    fn schedule_status_reset(&self) {
        let status = Arc::clone(&self.status);
        lock(&self.status_reset).schedule(self.status_reset_after, move || {
            *lock(&status) = StatusMessage::none();
        });
    }
}
