//! # Application Context
//!
//! [`ReportDeck`] is the explicitly constructed context that a front end holds
//! on to: it owns the configuration and the shared [`ReportStore`], and hands
//! out the per-widget coordinators wired to that store.

use crate::config::ReportDeckConfig;
use crate::error::Result;
use crate::repository::mock::MockRepository;
use crate::repository::ReportRepository;
use crate::search::SearchCoordinator;
use crate::store::ReportStore;
use crate::upload::UploadCoordinator;
use crate::view::{FilterMemo, ReportView};

pub struct ReportDeck<R: ReportRepository> {
    config: ReportDeckConfig,
    store: ReportStore<R>,
}

impl ReportDeck<MockRepository> {
    /// Deck backed by the simulated repository described by `config`.
    pub fn with_mock(config: ReportDeckConfig) -> Self {
        let repository = MockRepository::new(config.repository_settings());
        Self::new(config, repository)
    }
}

impl<R: ReportRepository> ReportDeck<R> {
    pub fn new(config: ReportDeckConfig, repository: R) -> Self {
        let store = ReportStore::new(repository, config.store_timing());
        Self { config, store }
    }

    pub fn config(&self) -> &ReportDeckConfig {
        &self.config
    }

    pub fn store(&self) -> &ReportStore<R> {
        &self.store
    }

    /// Loads the initial report list. A failure is also recorded in the
    /// store's `error` for display.
    pub async fn start(&self) -> Result<()> {
        self.store.fetch_reports().await
    }

    pub fn search(&self) -> SearchCoordinator {
        SearchCoordinator::for_store(&self.store, self.config.debounce())
    }

    pub fn uploader(&self) -> UploadCoordinator<R> {
        UploadCoordinator::new(
            self.store.clone(),
            self.config.upload_limits(),
            self.config.status_reset(),
        )
    }

    pub fn view(&self, memo: &mut FilterMemo) -> ReportView {
        memo.view(&self.store.snapshot())
    }

    pub fn error(&self) -> Option<String> {
        self.store.snapshot().error.clone()
    }

    pub fn dismiss_error(&self) {
        self.store.clear_error();
    }
}
