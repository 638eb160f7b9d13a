//! Simulated verification pipeline
//!
//! A run walks `uploading → ocr → ai-analysis → ledger-check → complete`,
//! spending a fixed dwell time in each state. Nothing is actually read or
//! checked; the result is chosen up front by the request's
//! [`OutcomeSelection`].
//!
//! At most one run is active at a time. A second `start` while a run is
//! in flight fails with [`DashboardError::FlowBusy`] instead of queueing.

use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::{
    filter_valid, ActivityEntry, ActivityKind, DemoSample, DocumentRef, ExtractedFields, FlowState,
    IntegrityChecks, VerificationOutcome, VerificationResult, ANOMALY_POOL, BATCH_INSTITUTIONS,
    DEFAULT_MAX_UPLOAD_BYTES,
};

use super::{ActivityFeed, CancelToken, DashboardError, FlowObserver, RandomSource, Result};

/// Timing and upload limits for verification runs
#[derive(Debug, Clone)]
pub struct FlowConfig {
    /// Time spent in each pipeline state
    pub dwell: Duration,
    /// Extra pause after the ledger check before results appear
    pub settle: Duration,
    /// Upload size limit in bytes
    pub max_upload_bytes: u64,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            dwell: Duration::from_secs(2),
            settle: Duration::from_secs(1),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// How a run picks its result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "outcome")]
pub enum OutcomeSelection {
    /// Always the fixed record for this outcome (demo buttons)
    Fixed(VerificationOutcome),
    /// One of the three fixed records, uniformly
    Random,
    /// A randomized record per document (batch analysis)
    Synthesized,
}

/// What to verify and how to pick the verdict
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowRequest {
    pub documents: Vec<DocumentRef>,
    pub selection: OutcomeSelection,
}

impl FlowRequest {
    /// Demo button: a named sample with its fixed outcome
    pub fn demo(sample: DemoSample) -> Self {
        Self {
            documents: vec![DocumentRef::demo(sample.as_str())],
            selection: OutcomeSelection::Fixed(sample.outcome()),
        }
    }

    /// Single uploaded file, verdict drawn at random
    pub fn upload(document: DocumentRef) -> Self {
        Self {
            documents: vec![document],
            selection: OutcomeSelection::Random,
        }
    }

    /// Batch of uploaded files, one synthesized verdict each
    pub fn batch(documents: Vec<DocumentRef>) -> Self {
        Self {
            documents,
            selection: OutcomeSelection::Synthesized,
        }
    }
}

/// Verdict for one document of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentVerdict {
    pub document: DocumentRef,
    pub result: VerificationResult,
}

/// Completed run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    /// States entered, in order
    pub visited: Vec<FlowState>,
    pub verdicts: Vec<DocumentVerdict>,
}

impl FlowReport {
    /// Result of a single-document run
    pub fn primary(&self) -> Option<&VerificationResult> {
        self.verdicts.first().map(|v| &v.result)
    }
}

struct ActiveRun {
    run_id: Uuid,
    token: CancelToken,
}

/// Holds the single run slot; frees it when dropped.
///
/// A run that did not complete leaves the flow `Idle`, whether it was
/// cancelled, failed or had its future dropped.
struct RunSlot {
    active: Arc<Mutex<Option<ActiveRun>>>,
    state: Arc<RwLock<FlowState>>,
    run_id: Uuid,
    completed: bool,
}

impl Drop for RunSlot {
    fn drop(&mut self) {
        if !self.completed {
            *self.state.write().unwrap_or_else(PoisonError::into_inner) = FlowState::Idle;
        }
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if active.as_ref().map(|run| run.run_id) == Some(self.run_id) {
            *active = None;
        }
    }
}

/// Handle to a spawned run
pub struct FlowHandle {
    run_id: Uuid,
    token: CancelToken,
    task: JoinHandle<Result<FlowReport>>,
}

impl FlowHandle {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Stop the run before its next transition
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Wait for the run to finish
    pub async fn wait(self) -> Result<FlowReport> {
        let run_id = self.run_id;
        self.task.await.map_err(|e| DashboardError::FlowAborted {
            run_id,
            message: e.to_string(),
        })?
    }
}

/// Drives simulated verification runs
pub struct VerificationFlow {
    config: FlowConfig,
    rng: Mutex<Box<dyn RandomSource>>,
    active: Arc<Mutex<Option<ActiveRun>>>,
    state: Arc<RwLock<FlowState>>,
    feed: Option<Arc<ActivityFeed>>,
    observers: RwLock<Vec<Arc<dyn FlowObserver>>>,
}

impl VerificationFlow {
    pub fn new(config: FlowConfig, rng: Box<dyn RandomSource>) -> Self {
        Self {
            config,
            rng: Mutex::new(rng),
            active: Arc::new(Mutex::new(None)),
            state: Arc::new(RwLock::new(FlowState::Idle)),
            feed: None,
            observers: RwLock::new(Vec::new()),
        }
    }

    /// Append an entry to `feed` whenever a run completes
    pub fn with_feed(mut self, feed: Arc<ActivityFeed>) -> Self {
        self.feed = Some(feed);
        self
    }

    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    pub fn subscribe(&self, observer: Arc<dyn FlowObserver>) {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    /// State of the current (or last) run
    pub fn current_state(&self) -> FlowState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_running(&self) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Cancel the active run, if any. Returns its id.
    pub fn cancel_active(&self) -> Option<Uuid> {
        let active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        active.as_ref().map(|run| {
            info!(run_id = %run.run_id, "Cancelling verification run");
            run.token.cancel();
            run.run_id
        })
    }

    /// Validate and spawn a run on the tokio runtime
    pub fn start(self: &Arc<Self>, request: FlowRequest) -> Result<FlowHandle> {
        let request = self.validate(request)?;
        let token = CancelToken::new();
        let slot = self.claim(token.clone())?;
        let run_id = slot.run_id;

        let flow = Arc::clone(self);
        let run_token = token.clone();
        let task = tokio::spawn(async move { flow.drive(slot, request, run_token).await });

        Ok(FlowHandle {
            run_id,
            token,
            task,
        })
    }

    /// Validate and run to completion on the current task
    pub async fn run(&self, request: FlowRequest, token: CancelToken) -> Result<FlowReport> {
        let request = self.validate(request)?;
        let slot = self.claim(token.clone())?;
        self.drive(slot, request, token).await
    }

    fn validate(&self, mut request: FlowRequest) -> Result<FlowRequest> {
        match request.selection {
            OutcomeSelection::Fixed(_) => {}
            OutcomeSelection::Random => {
                if request.documents.is_empty() {
                    return Err(crate::infra::ValidationError::NoValidDocuments.into());
                }
                for document in &request.documents {
                    document.validate(self.config.max_upload_bytes)?;
                }
            }
            OutcomeSelection::Synthesized => {
                request.documents =
                    filter_valid(request.documents, self.config.max_upload_bytes)?;
            }
        }
        Ok(request)
    }

    fn claim(&self, token: CancelToken) -> Result<RunSlot> {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(run) = active.as_ref() {
            warn!(active = %run.run_id, "Rejected verification start while a run is active");
            return Err(DashboardError::FlowBusy {
                active: run.run_id,
            });
        }

        let run_id = Uuid::new_v4();
        *active = Some(ActiveRun { run_id, token });
        Ok(RunSlot {
            active: Arc::clone(&self.active),
            state: Arc::clone(&self.state),
            run_id,
            completed: false,
        })
    }

    async fn drive(
        &self,
        mut slot: RunSlot,
        request: FlowRequest,
        token: CancelToken,
    ) -> Result<FlowReport> {
        let run_id = slot.run_id;
        let started_at = Utc::now();
        let mut state = FlowState::Idle;
        let mut visited = Vec::with_capacity(FlowState::PIPELINE.len());

        info!(
            %run_id,
            documents = request.documents.len(),
            selection = ?request.selection,
            "Verification run started"
        );

        for next in FlowState::PIPELINE {
            if state != FlowState::Idle {
                let dwell = if next.is_terminal() {
                    self.config.dwell + self.config.settle
                } else {
                    self.config.dwell
                };
                if !token.sleep(dwell).await {
                    return Err(self.cancelled(run_id, state));
                }
            }
            if token.is_cancelled() {
                return Err(self.cancelled(run_id, state));
            }

            state = next;
            visited.push(state);
            self.enter(run_id, state);
        }

        let verdicts = self.select_verdicts(&request);
        let report = FlowReport {
            run_id,
            started_at,
            completed_at: Utc::now(),
            visited,
            verdicts,
        };

        if let Some(feed) = &self.feed {
            for verdict in &report.verdicts {
                feed.append(completion_entry(verdict));
            }
        }

        let observers = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for observer in observers {
            observer.completed(&report);
        }

        info!(
            %run_id,
            verdicts = report.verdicts.len(),
            outcome = ?report.primary().map(|r| r.outcome),
            "Verification run complete"
        );

        slot.completed = true;
        drop(slot);
        Ok(report)
    }

    fn enter(&self, run_id: Uuid, state: FlowState) {
        debug!(%run_id, %state, progress = state.progress_percent(), "{}", state.status_text());
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = state;

        let observers = self
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for observer in observers {
            observer.transition(run_id, state);
        }
    }

    fn cancelled(&self, run_id: Uuid, state: FlowState) -> DashboardError {
        info!(%run_id, %state, "Verification run cancelled");
        DashboardError::FlowCancelled { run_id, state }
    }

    fn select_verdicts(&self, request: &FlowRequest) -> Vec<DocumentVerdict> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        request
            .documents
            .iter()
            .map(|document| {
                let result = match request.selection {
                    OutcomeSelection::Fixed(outcome) => VerificationResult::fixed(outcome),
                    OutcomeSelection::Random => {
                        let pick = rng.pick_index(VerificationOutcome::ALL.len());
                        VerificationResult::fixed(VerificationOutcome::ALL[pick])
                    }
                    OutcomeSelection::Synthesized => synthesize_result(&mut **rng),
                };
                DocumentVerdict {
                    document: document.clone(),
                    result,
                }
            })
            .collect()
    }
}

/// Randomized result for a batch-analyzed document
pub fn synthesize_result(rng: &mut dyn RandomSource) -> VerificationResult {
    let outcome = VerificationOutcome::ALL[rng.pick_index(VerificationOutcome::ALL.len())];
    let confidence = rng.range_inclusive(70, 99) as u8;
    let ocr_accuracy = rng.range_inclusive(90, 99) as u8;
    let institution = BATCH_INSTITUTIONS[rng.pick_index(BATCH_INSTITUTIONS.len())].to_string();
    let issue_date = random_issue_date(rng);

    let anomaly_count = match outcome {
        VerificationOutcome::Verified => 0,
        VerificationOutcome::Suspicious => rng.range_inclusive(1, 2) as usize,
        VerificationOutcome::Fraudulent => rng.range_inclusive(2, 4) as usize,
    };

    VerificationResult {
        outcome,
        confidence,
        ocr_accuracy,
        fields: ExtractedFields {
            student_name: None,
            institution,
            degree: None,
            issue_date,
        },
        checks: IntegrityChecks::for_outcome(outcome),
        anomalies: sample_anomalies(rng, anomaly_count),
    }
}

/// Issue date between 2015-01-01 and 2024-12-31, as `dd/mm/yyyy`
fn random_issue_date(rng: &mut dyn RandomSource) -> String {
    const SPAN_DAYS: i64 = 3652;
    let offset = rng.range_inclusive(0, SPAN_DAYS);
    NaiveDate::from_ymd_opt(2015, 1, 1)
        .and_then(|start| start.checked_add_signed(chrono::Duration::days(offset)))
        .map(|date| date.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Draw `count` distinct anomalies from the pool
fn sample_anomalies(rng: &mut dyn RandomSource, count: usize) -> Vec<String> {
    let mut pool: Vec<&str> = ANOMALY_POOL.to_vec();
    let count = count.min(pool.len());
    let mut picked = Vec::with_capacity(count);
    for _ in 0..count {
        let index = rng.pick_index(pool.len());
        picked.push(pool.swap_remove(index).to_string());
    }
    picked
}

fn completion_entry(verdict: &DocumentVerdict) -> ActivityEntry {
    let result = &verdict.result;
    let details = format!("{} - {}", verdict.document.name, result.fields.institution);
    match result.outcome {
        VerificationOutcome::Verified => ActivityEntry::certificate_verified(details),
        VerificationOutcome::Suspicious => {
            ActivityEntry::new(ActivityKind::Fraud, "Suspicious Certificate Flagged", details)
        }
        VerificationOutcome::Fraudulent => ActivityEntry::fraud_alert(details),
    }
}
