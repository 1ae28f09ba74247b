use crate::error::{ReportError, Result};
use crate::model::{Report, UploadFile};
use crate::repository::ReportRepository;
use crate::store::{ReportState, ReportStore, Subscription};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time;

pub async fn wait_ms(ms: u64) {
    time::sleep(Duration::from_millis(ms)).await;
}

/// Repository that answers from queues of prepared outcomes.
///
/// An empty list queue answers with no reports; an empty upload queue
/// rejects, so an unexpected upload shows up as a failure.
#[derive(Default)]
pub struct ScriptedRepository {
    list_latency: Duration,
    upload_latency: Duration,
    lists: Mutex<VecDeque<Result<Vec<Report>>>>,
    uploads: Mutex<VecDeque<Result<Report>>>,
    uploaded: Mutex<Vec<String>>,
}

impl ScriptedRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_list_latency(mut self, latency: Duration) -> Self {
        self.list_latency = latency;
        self
    }

    pub fn with_upload_latency(mut self, latency: Duration) -> Self {
        self.upload_latency = latency;
        self
    }

    pub fn list_ok(self, reports: Vec<Report>) -> Self {
        self.lists.lock().unwrap().push_back(Ok(reports));
        self
    }

    pub fn list_err(self, message: &str) -> Self {
        self.lists
            .lock()
            .unwrap()
            .push_back(Err(ReportError::Repository(message.to_string())));
        self
    }

    pub fn upload_ok(self, report: Report) -> Self {
        self.uploads.lock().unwrap().push_back(Ok(report));
        self
    }

    pub fn upload_err(self, message: &str) -> Self {
        self.uploads
            .lock()
            .unwrap()
            .push_back(Err(ReportError::Repository(message.to_string())));
        self
    }

    /// Names of every file passed to `upload`, in call order.
    pub fn uploaded(&self) -> Vec<String> {
        self.uploaded.lock().unwrap().clone()
    }
}

impl ReportRepository for ScriptedRepository {
    async fn list(&self) -> Result<Vec<Report>> {
        time::sleep(self.list_latency).await;
        self.lists
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn upload(&self, file: &UploadFile) -> Result<Report> {
        self.uploaded.lock().unwrap().push(file.name.clone());
        time::sleep(self.upload_latency).await;
        self.uploads.lock().unwrap().pop_front().unwrap_or_else(|| {
            Err(ReportError::Repository(
                "no scripted upload outcome".to_string(),
            ))
        })
    }
}

/// Records every snapshot a store publishes after attaching.
pub struct StateLog {
    states: Arc<Mutex<Vec<ReportState>>>,
    subscription: Mutex<Option<Subscription>>,
}

impl StateLog {
    pub fn attach<R: ReportRepository>(store: &ReportStore<R>) -> Self {
        let states = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&states);
        let subscription = store.subscribe(move |state| {
            sink.lock().unwrap().push(state.clone());
        });
        Self {
            states,
            subscription: Mutex::new(Some(subscription)),
        }
    }

    pub fn detach(&self) {
        if let Some(subscription) = self.subscription.lock().unwrap().take() {
            subscription.unsubscribe();
        }
    }

    pub fn states(&self) -> Vec<ReportState> {
        self.states.lock().unwrap().clone()
    }

    pub fn progress(&self) -> Vec<u8> {
        self.states().iter().map(|s| s.upload_progress).collect()
    }
}
