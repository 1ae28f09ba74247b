//! # Reportdeck Architecture
//!
//! Reportdeck is a **UI-agnostic report browser core**. Users upload diagnostic
//! reports (vibration and thermal analyses), search the list by name, and
//! download entries. The terminal client in `main.rs` is one front end; the same
//! core could sit behind a web view or a desktop shell.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Client (cli/, wired by main.rs)                            │
//! │  - Parses arguments, prints, owns the terminal              │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Coordinators (search.rs, upload.rs) + view.rs              │
//! │  - Per-widget state: debounced input, upload status         │
//! │  - Pure derivation of the visible list                      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Store (store.rs)                                           │
//! │  - Single writer of report state, immutable snapshots       │
//! │  - Subscriptions, progress simulation                       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Repository (repository/)                                   │
//! │  - Async ReportRepository trait                             │
//! │  - MockRepository: latency + injectable failure rate        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Data Flow
//!
//! - keystroke → [`search::SearchCoordinator`] (debounce) →
//!   [`store::ReportStore::set_search_query`] → [`view::FilterMemo`] recomputes.
//! - file drop/select → [`upload::UploadCoordinator`] validates →
//!   [`store::ReportStore::upload_report`] (progress ticks) → snapshot published.
//!
//! ## Concurrency
//!
//! Everything runs on Tokio. "Concurrent" work is interleaved tasks: the
//! repository's simulated latency and the timers in [`timer`]. The store is
//! the only shared mutable resource and holds its locks only for the
//! synchronous commit of a transition.
//!
//! ## Module Overview
//!
//! - [`app`]: `ReportDeck` context wiring config, repository and store
//! - [`store`]: report state, actions, subscriptions
//! - [`search`]: debounced search input
//! - [`upload`]: upload status and picker/drop handling
//! - [`validation`]: size/extension/MIME checks
//! - [`view`]: filtering and list-shape flags
//! - [`download`]: download requests
//! - [`repository`]: backend contract and the mock implementation
//! - [`timer`]: cancellable one-shot and repeating tasks
//! - [`model`]: `Report`, `ReportKind`, `UploadFile`
//! - [`config`]: configuration
//! - [`error`]: error types

pub mod app;
pub mod config;
pub mod download;
pub mod error;
pub mod model;
pub mod repository;
pub mod search;
pub mod store;
pub mod timer;
pub mod upload;
pub mod validation;
pub mod view;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
