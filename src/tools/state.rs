//! Per-instance controller state machine.
//!
//! `Idle → Validating → Loading → {Success, Failed}`, re-entering
//! `Validating` on every submission. A submission that arrives while the
//! instance is `Loading` is ignored.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::{Checked, Clients, ToolError, ToolKind, ToolOutput, execute};

/// Controller phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolPhase {
    #[default]
    Idle,
    Validating,
    Loading,
    Success,
    Failed,
}

/// Snapshot of one tool's state.
///
/// After a completed submission exactly one of `error` and `result` is set;
/// both are `None` before the first submission and while loading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolState<T = ToolOutput> {
    pub input: String,
    pub phase: ToolPhase,
    pub error: Option<String>,
    /// [`ToolError::code`] of the stored error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,
    pub result: Option<T>,
}

impl<T> Default for ToolState<T> {
    fn default() -> Self {
        Self {
            input: String::new(),
            phase: ToolPhase::Idle,
            error: None,
            error_code: None,
            result: None,
        }
    }
}

impl<T> ToolState<T> {
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.phase == ToolPhase::Loading
    }

    fn begin(&mut self) {
        self.phase = ToolPhase::Loading;
        self.error = None;
        self.error_code = None;
        self.result = None;
    }

    fn succeed(&mut self, result: T) {
        self.phase = ToolPhase::Success;
        self.error = None;
        self.error_code = None;
        self.result = Some(result);
    }

    fn fail(&mut self, err: &ToolError) {
        self.phase = ToolPhase::Failed;
        self.error = Some(err.to_string());
        self.error_code = Some(err.code());
        self.result = None;
    }
}

/// What became of a submission.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// Validation or the client calls finished; carries the new state.
    Completed(ToolState),
    /// Another request was in flight; state untouched.
    Ignored(ToolState),
}

impl Submission {
    #[must_use]
    pub fn state(&self) -> &ToolState {
        match self {
            Self::Completed(state) | Self::Ignored(state) => state,
        }
    }

    #[must_use]
    pub fn into_state(self) -> ToolState {
        match self {
            Self::Completed(state) | Self::Ignored(state) => state,
        }
    }

    #[must_use]
    pub fn is_ignored(&self) -> bool {
        matches!(self, Self::Ignored(_))
    }
}

/// One opened tool view and its controller state.
#[derive(Debug)]
pub struct ToolInstance {
    id: Uuid,
    kind: ToolKind,
    state: Mutex<ToolState>,
    created_at: DateTime<Utc>,
    last_activity: Mutex<Instant>,
}

impl ToolInstance {
    #[must_use]
    pub fn new(kind: ToolKind) -> Self {
        Self::with_id(Uuid::new_v4(), kind)
    }

    #[must_use]
    pub fn with_id(id: Uuid, kind: ToolKind) -> Self {
        Self {
            id,
            kind,
            state: Mutex::new(ToolState::default()),
            created_at: Utc::now(),
            last_activity: Mutex::new(Instant::now()),
        }
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> ToolKind {
        self.kind
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Current state.
    #[must_use]
    pub fn snapshot(&self) -> ToolState {
        self.lock().clone()
    }

    /// Pre-fill the input without submitting (ignored while loading).
    pub fn prefill(&self, input: impl Into<String>) {
        let mut state = self.lock();
        if !state.is_loading() {
            state.input = input.into();
        }
    }

    /// Whether the instance has been idle longer than `ttl`.
    ///
    /// An instance with a request in flight never expires.
    #[must_use]
    pub fn is_expired(&self, ttl: Duration) -> bool {
        let idle = self
            .last_activity
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .elapsed();
        idle > ttl && !self.lock().is_loading()
    }

    pub(crate) fn touch(&self) {
        *self
            .last_activity
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    fn lock(&self) -> MutexGuard<'_, ToolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Validate `input` and, if it passes, run the client calls.
    ///
    /// The client calls run on a spawned task, so the outcome is recorded
    /// even if the caller stops waiting.
    pub async fn submit(self: &Arc<Self>, input: impl Into<String>, clients: &Clients) -> Submission {
        let input = input.into();
        self.touch();

        let payload = {
            let mut state = self.lock();
            if state.is_loading() {
                tracing::info!(
                    name: "tool.submit.ignored",
                    kind = %self.kind,
                    instance = %self.id,
                    "Submission ignored while a request is in flight"
                );
                return Submission::Ignored(state.clone());
            }

            state.input.clone_from(&input);
            state.phase = ToolPhase::Validating;

            match self.kind.check(&input) {
                Err(err) => {
                    tracing::debug!(
                        name: "tool.submit.invalid",
                        kind = %self.kind,
                        instance = %self.id,
                        error = %err,
                        "Validation failed"
                    );
                    state.fail(&err);
                    return Submission::Completed(state.clone());
                }
                Ok(Checked::Resolved(output)) => {
                    state.succeed(output);
                    return Submission::Completed(state.clone());
                }
                Ok(Checked::Dispatch(payload)) => {
                    state.begin();
                    payload
                }
            }
        };

        let started = Instant::now();
        let instance = Arc::clone(self);
        let clients = clients.clone();
        let task = tokio::spawn(async move {
            let outcome = execute(instance.kind, &payload, &clients).await;
            instance.finish(outcome)
        });

        let state = match task.await {
            Ok(state) => state,
            Err(join_err) => {
                tracing::error!(
                    name: "tool.submit.panicked",
                    kind = %self.kind,
                    instance = %self.id,
                    error = %join_err,
                    "Tool task aborted"
                );
                self.finish(Err(ToolError::ServiceUnavailable(
                    "An error occurred during the analysis.".to_string(),
                )))
            }
        };

        tracing::info!(
            name: "tool.submit.completed",
            kind = %self.kind,
            instance = %self.id,
            phase = ?state.phase,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Tool request completed"
        );
        Submission::Completed(state)
    }

    fn finish(&self, outcome: Result<ToolOutput, ToolError>) -> ToolState {
        let mut state = self.lock();
        match outcome {
            Ok(output) => state.succeed(output),
            Err(err) => state.fail(&err),
        }
        self.touch();
        state.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::{CompletionError, CompletionService, SchemaDescriptor};
    use crate::geo::{GeoError, GeoLookup, IpRecord};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    /// Geolocation double that blocks until released when `gate` is set.
    #[derive(Debug, Default)]
    struct FakeGeo {
        calls: AtomicUsize,
        gate: Option<Arc<Notify>>,
    }

    #[async_trait::async_trait]
    impl GeoLookup for FakeGeo {
        async fn resolve_ip(&self, ip: &str) -> Result<IpRecord, GeoError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if ip == "999.1.1.1" {
                return Err(GeoError::InvalidAddress("invalid query".to_string()));
            }
            Ok(IpRecord {
                query: ip.to_string(),
                ..IpRecord::default()
            })
        }

        async fn resolve_caller_ip(&self) -> Option<String> {
            None
        }
    }

    #[derive(Debug, Default)]
    struct CountingCompletion {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl CompletionService for CountingCompletion {
        async fn complete_text(
            &self,
            _prompt: &str,
            _schema: &SchemaDescriptor,
        ) -> Result<String, CompletionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(CompletionError::ServiceUnavailable("offline".to_string()))
        }
    }

    fn clients(geo: Arc<FakeGeo>, completion: Arc<CountingCompletion>) -> Clients {
        Clients::new(geo, completion)
    }

    #[tokio::test]
    async fn test_lookup_success_then_overwrite() {
        let geo = Arc::new(FakeGeo::default());
        let clients = clients(Arc::clone(&geo), Arc::new(CountingCompletion::default()));
        let instance = Arc::new(ToolInstance::new(ToolKind::IpLookup));

        assert_eq!(instance.snapshot(), ToolState::default());

        let first = instance.submit("8.8.8.8", &clients).await.into_state();
        assert_eq!(first.phase, ToolPhase::Success);
        assert!(first.error.is_none());
        match first.result {
            Some(ToolOutput::IpRecord(record)) => assert_eq!(record.query, "8.8.8.8"),
            other => panic!("unexpected result: {other:?}"),
        }

        let second = instance.submit("1.1.1.1", &clients).await.into_state();
        match second.result {
            Some(ToolOutput::IpRecord(record)) => assert_eq!(record.query, "1.1.1.1"),
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(geo.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_validation_failure_clears_result() {
        let geo = Arc::new(FakeGeo::default());
        let clients = clients(Arc::clone(&geo), Arc::new(CountingCompletion::default()));
        let instance = Arc::new(ToolInstance::new(ToolKind::IpLookup));

        instance.submit("8.8.8.8", &clients).await;
        let state = instance.submit("  ", &clients).await.into_state();

        assert_eq!(state.phase, ToolPhase::Failed);
        assert_eq!(state.error.as_deref(), Some("Please enter an IP address."));
        assert_eq!(state.error_code, Some("validation_error"));
        assert!(state.result.is_none());
        assert_eq!(geo.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_geo_error_surfaces_message() {
        let clients = clients(
            Arc::new(FakeGeo::default()),
            Arc::new(CountingCompletion::default()),
        );
        let instance = Arc::new(ToolInstance::new(ToolKind::IpLookup));

        let state = instance.submit("999.1.1.1", &clients).await.into_state();
        assert_eq!(state.phase, ToolPhase::Failed);
        assert_eq!(state.error.as_deref(), Some("invalid query"));
    }

    #[tokio::test]
    async fn test_email_invalid_format_short_circuits() {
        let completion = Arc::new(CountingCompletion::default());
        let clients = clients(Arc::new(FakeGeo::default()), Arc::clone(&completion));
        let instance = Arc::new(ToolInstance::new(ToolKind::EmailCheck));

        let state = instance.submit("not-an-email", &clients).await.into_state();
        assert_eq!(state.phase, ToolPhase::Success);
        match state.result {
            Some(ToolOutput::Email(verdict)) => {
                assert!(!verdict.is_valid_format);
                assert!(!verdict.is_disposable);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(completion.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_completion_failure_uses_tool_message() {
        let completion = Arc::new(CountingCompletion::default());
        let clients = clients(Arc::new(FakeGeo::default()), Arc::clone(&completion));
        let instance = Arc::new(ToolInstance::new(ToolKind::IpScore));

        let state = instance.submit("8.8.8.8", &clients).await.into_state();
        assert_eq!(state.phase, ToolPhase::Failed);
        assert_eq!(
            state.error.as_deref(),
            Some("Failed to get AI analysis for the IP address.")
        );
        assert_eq!(completion.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_submit_while_loading_is_ignored() {
        let gate = Arc::new(Notify::new());
        let geo = Arc::new(FakeGeo {
            calls: AtomicUsize::new(0),
            gate: Some(Arc::clone(&gate)),
        });
        let clients = clients(Arc::clone(&geo), Arc::new(CountingCompletion::default()));
        let instance = Arc::new(ToolInstance::new(ToolKind::IpLookup));

        let pending = {
            let instance = Arc::clone(&instance);
            let clients = clients.clone();
            tokio::spawn(async move { instance.submit("8.8.8.8", &clients).await })
        };

        while geo.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        assert!(instance.snapshot().is_loading());
        assert!(instance.snapshot().result.is_none());
        assert!(instance.snapshot().error.is_none());

        let second = instance.submit("1.1.1.1", &clients).await;
        assert!(second.is_ignored());
        assert_eq!(second.state().input, "8.8.8.8");

        gate.notify_one();
        let first = pending.await.unwrap();
        assert!(!first.is_ignored());
        assert_eq!(first.state().phase, ToolPhase::Success);
        assert_eq!(geo.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dropped_caller_still_records_outcome() {
        let gate = Arc::new(Notify::new());
        let geo = Arc::new(FakeGeo {
            calls: AtomicUsize::new(0),
            gate: Some(Arc::clone(&gate)),
        });
        let clients = clients(Arc::clone(&geo), Arc::new(CountingCompletion::default()));
        let instance = Arc::new(ToolInstance::new(ToolKind::IpLookup));

        let pending = {
            let instance = Arc::clone(&instance);
            let clients = clients.clone();
            tokio::spawn(async move { instance.submit("8.8.8.8", &clients).await })
        };
        while geo.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        pending.abort();
        gate.notify_one();

        for _ in 0..100 {
            if !instance.snapshot().is_loading() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(instance.snapshot().phase, ToolPhase::Success);
    }

    #[test]
    fn test_prefill_and_expiry() {
        let instance = ToolInstance::new(ToolKind::IpLookup);
        instance.prefill("203.0.113.7");
        assert_eq!(instance.snapshot().input, "203.0.113.7");
        assert_eq!(instance.snapshot().phase, ToolPhase::Idle);
        assert!(!instance.is_expired(Duration::from_secs(60)));
        std::thread::sleep(Duration::from_millis(5));
        assert!(instance.is_expired(Duration::from_millis(1)));
    }

    #[test]
    fn test_created_at_is_fixed_at_open() {
        let before = Utc::now();
        let instance = ToolInstance::new(ToolKind::UaCheck);
        let opened = instance.created_at();
        assert!(opened >= before && opened <= Utc::now());

        instance.touch();
        assert_eq!(instance.created_at(), opened);
    }
}
