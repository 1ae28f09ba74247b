//! # Report Repository
//!
//! The repository is the "remote" source of truth for reports. The store never
//! assumes it answers synchronously or that it always succeeds: every call is
//! asynchronous and fallible.
//!
//! ## Implementations
//!
//! - [`mock::MockRepository`]: in-memory repository with simulated latency and
//!   an injectable upload failure probability. It is the only backend the deck
//!   ships with.
//! - `test_utils::ScriptedRepository`: returns queued outcomes, for tests that
//!   need exact control over what a call resolves to.

use crate::error::Result;
use crate::model::{Report, UploadFile};
use std::future::Future;

pub mod mock;

/// Asynchronous contract of the report backend.
pub trait ReportRepository: Send + Sync + 'static {
    /// Every report currently known, in display order.
    fn list(&self) -> impl Future<Output = Result<Vec<Report>>> + Send;

    /// Stores `file` and resolves with the report created for it.
    ///
    /// Rejections are an expected outcome, not an edge case; callers must
    /// surface them to the user.
    fn upload(&self, file: &UploadFile) -> impl Future<Output = Result<Report>> + Send;
}
