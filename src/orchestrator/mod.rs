//! Job orchestrator: submit an indexing job, wait for it, run one query.
//!
//! Per job the lifecycle is `Submitted -> {Pending, InProgress}* -> Completed`.
//! The job handle is derived from the submission inputs, so the orchestrator
//! keeps no state between calls and every call can be retried by the caller.
//!
//! `await_completion` is bounded by a [`PollPolicy`]. It is an ordinary future:
//! dropping it (for example when racing it against Ctrl-C) cancels the wait.

pub mod poll;

use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::errors::OrchestratorError;
use crate::remote::{
    AnalysisService, IndexRequest, JobHandle, JobStatus, QueryMessage, QueryRequest, Remote,
};

pub use poll::PollPolicy;

pub const DEFAULT_SESSION_ID: &str = "repo-improvement-session";
const QUERY_MESSAGE_ID: &str = "analysis-1";

/// Summary of a completed wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSummary {
    pub attempts: u32,
    pub elapsed: Duration,
}

/// Drives one analysis service through index → wait → query.
pub struct JobOrchestrator<S> {
    service: S,
    policy: PollPolicy,
    session_id: String,
}

impl<S: AnalysisService> JobOrchestrator<S> {
    pub fn new(service: S, policy: PollPolicy) -> Self {
        Self {
            service,
            policy,
            session_id: DEFAULT_SESSION_ID.to_string(),
        }
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Submit `repository`@`branch` for indexing and return its handle.
    ///
    /// Transport failures are returned as-is; nothing is retried here.
    pub async fn submit(
        &self,
        remote: Remote,
        repository: &str,
        branch: &str,
    ) -> Result<JobHandle, OrchestratorError> {
        let request = IndexRequest {
            remote,
            repository: repository.to_string(),
            branch: branch.to_string(),
        };
        self.service.submit_index(&request).await?;

        let handle = JobHandle::new(remote, repository, branch);
        info!(handle = %handle, "Indexing job submitted");
        Ok(handle)
    }

    /// Poll until the job reports `completed`.
    pub async fn await_completion(
        &self,
        handle: &JobHandle,
    ) -> Result<PollSummary, OrchestratorError> {
        self.await_completion_with(handle, |_, _| {}).await
    }

    /// Like [`await_completion`](Self::await_completion), calling `on_poll`
    /// with the attempt number and status after every check.
    pub async fn await_completion_with<F>(
        &self,
        handle: &JobHandle,
        mut on_poll: F,
    ) -> Result<PollSummary, OrchestratorError>
    where
        F: FnMut(u32, &JobStatus) + Send,
    {
        let started = Instant::now();
        let mut delay = self.policy.interval;
        let mut attempts = 0;

        while attempts < self.policy.max_attempts {
            attempts += 1;
            let status = self.service.index_status(handle).await?;
            debug!(handle = %handle, attempt = attempts, status = %status, "Polled indexing status");
            on_poll(attempts, &status);

            if status.is_terminal() {
                info!(handle = %handle, attempts, "Indexing completed");
                return Ok(PollSummary {
                    attempts,
                    elapsed: started.elapsed(),
                });
            }
            match status {
                JobStatus::Failed if self.policy.fail_fast => {
                    return Err(OrchestratorError::JobFailed {
                        handle: handle.to_string(),
                    });
                }
                JobStatus::Failed | JobStatus::Other(_) => {
                    warn!(handle = %handle, status = %status, "Unexpected indexing status, still waiting");
                }
                JobStatus::Pending | JobStatus::InProgress | JobStatus::Completed => {}
            }

            if attempts == self.policy.max_attempts {
                break;
            }
            if let Some(timeout) = self.policy.timeout
                && started.elapsed() + delay > timeout
            {
                break;
            }

            tokio::time::sleep(delay).await;
            delay = self.policy.next_delay(delay);
        }

        Err(OrchestratorError::PollTimeout {
            handle: handle.to_string(),
            attempts,
            elapsed: started.elapsed(),
        })
    }

    /// Ask one question about the repository behind `handle` and return the
    /// raw response body. Enhanced reasoning is always requested.
    pub async fn query(&self, handle: &JobHandle, prompt: &str) -> Result<String, OrchestratorError> {
        let request = QueryRequest {
            messages: vec![QueryMessage {
                id: QUERY_MESSAGE_ID.to_string(),
                content: prompt.to_string(),
                role: "user".to_string(),
            }],
            repositories: vec![handle.repository_ref()?],
            genius: true,
            session_id: self.session_id.clone(),
        };
        let raw = self.service.query(&request).await?;
        info!(handle = %handle, bytes = raw.len(), "Query answered");
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RemoteError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Scripted service: returns queued statuses in order, then `fallback`.
    struct ScriptedService {
        statuses: Mutex<VecDeque<Result<JobStatus, RemoteError>>>,
        fallback: JobStatus,
        status_calls: AtomicU32,
        submitted: Mutex<Vec<IndexRequest>>,
        queries: Mutex<Vec<QueryRequest>>,
        fail_submit: bool,
    }

    impl ScriptedService {
        fn new(statuses: Vec<&str>) -> Self {
            Self {
                statuses: Mutex::new(
                    statuses
                        .into_iter()
                        .map(|s| Ok(JobStatus::from_wire(s)))
                        .collect(),
                ),
                fallback: JobStatus::Pending,
                status_calls: AtomicU32::new(0),
                submitted: Mutex::new(Vec::new()),
                queries: Mutex::new(Vec::new()),
                fail_submit: false,
            }
        }

        fn calls(&self) -> u32 {
            self.status_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AnalysisService for ScriptedService {
        async fn submit_index(&self, request: &IndexRequest) -> Result<(), RemoteError> {
            if self.fail_submit {
                return Err(RemoteError::Status {
                    operation: "index",
                    status: 500,
                    body: "boom".to_string(),
                });
            }
            self.submitted.lock().unwrap().push(request.clone());
            Ok(())
        }

        async fn index_status(&self, _handle: &JobHandle) -> Result<JobStatus, RemoteError> {
            self.status_calls.fetch_add(1, Ordering::SeqCst);
            self.statuses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(self.fallback.clone()))
        }

        async fn query(&self, request: &QueryRequest) -> Result<String, RemoteError> {
            self.queries.lock().unwrap().push(request.clone());
            Ok(r#"{"message": "[]"}"#.to_string())
        }
    }

    fn fast_policy(max_attempts: u32) -> PollPolicy {
        PollPolicy::fixed(Duration::from_millis(1), max_attempts)
    }

    fn handle() -> JobHandle {
        JobHandle::new(Remote::Github, "owner/repo", "main")
    }

    #[tokio::test]
    async fn test_submit_returns_deterministic_handle() {
        let orchestrator = JobOrchestrator::new(ScriptedService::new(vec![]), fast_policy(1));
        let handle = orchestrator
            .submit(Remote::Github, "owner/repo", "main")
            .await
            .unwrap();

        assert_eq!(handle.as_str(), "github:main:owner/repo");
        let submitted = orchestrator.service().submitted.lock().unwrap();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].repository, "owner/repo");
        assert_eq!(submitted[0].branch, "main");
    }

    #[tokio::test]
    async fn test_submit_failure_is_surfaced() {
        let mut service = ScriptedService::new(vec![]);
        service.fail_submit = true;
        let orchestrator = JobOrchestrator::new(service, fast_policy(1));

        let err = orchestrator
            .submit(Remote::Github, "owner/repo", "main")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            OrchestratorError::Remote(RemoteError::Status { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn test_three_polls_until_completed() {
        let orchestrator = JobOrchestrator::new(
            ScriptedService::new(vec!["pending", "pending", "completed"]),
            fast_policy(10),
        );

        let summary = orchestrator.await_completion(&handle()).await.unwrap();

        assert_eq!(summary.attempts, 3);
        assert_eq!(orchestrator.service().calls(), 3);
    }

    #[tokio::test]
    async fn test_unknown_and_failed_statuses_keep_polling() {
        let orchestrator = JobOrchestrator::new(
            ScriptedService::new(vec!["cloning", "failed", "mystery", "completed"]),
            fast_policy(10),
        );

        let summary = orchestrator.await_completion(&handle()).await.unwrap();

        assert_eq!(summary.attempts, 4);
    }

    #[tokio::test]
    async fn test_fail_fast_stops_on_failed() {
        let orchestrator = JobOrchestrator::new(
            ScriptedService::new(vec!["pending", "failed", "completed"]),
            fast_policy(10).with_fail_fast(true),
        );

        let err = orchestrator.await_completion(&handle()).await.unwrap_err();

        assert!(matches!(err, OrchestratorError::JobFailed { .. }));
        assert_eq!(orchestrator.service().calls(), 2);
    }

    #[tokio::test]
    async fn test_attempt_ceiling_times_out() {
        let orchestrator = JobOrchestrator::new(ScriptedService::new(vec![]), fast_policy(4));

        let err = orchestrator.await_completion(&handle()).await.unwrap_err();

        match err {
            OrchestratorError::PollTimeout { attempts, .. } => assert_eq!(attempts, 4),
            other => panic!("Expected PollTimeout, got {:?}", other),
        }
        assert_eq!(orchestrator.service().calls(), 4);
    }

    #[tokio::test]
    async fn test_deadline_times_out_before_sleeping_past_it() {
        let policy = PollPolicy::fixed(Duration::from_secs(30), 100)
            .with_timeout(Duration::from_secs(10));
        let orchestrator = JobOrchestrator::new(ScriptedService::new(vec![]), policy);

        let err = orchestrator.await_completion(&handle()).await.unwrap_err();

        assert!(matches!(err, OrchestratorError::PollTimeout { attempts: 1, .. }));
    }

    #[tokio::test]
    async fn test_status_error_propagates() {
        let service = ScriptedService::new(vec![]);
        service.statuses.lock().unwrap().push_back(Err(RemoteError::Status {
            operation: "status",
            status: 503,
            body: String::new(),
        }));
        let orchestrator = JobOrchestrator::new(service, fast_policy(10));

        let err = orchestrator.await_completion(&handle()).await.unwrap_err();

        assert!(matches!(
            err,
            OrchestratorError::Remote(RemoteError::Status { status: 503, .. })
        ));
        assert_eq!(orchestrator.service().calls(), 1);
    }

    #[tokio::test]
    async fn test_on_poll_sees_every_status() {
        let orchestrator = JobOrchestrator::new(
            ScriptedService::new(vec!["pending", "processing", "completed"]),
            fast_policy(10),
        );
        let mut seen = Vec::new();

        orchestrator
            .await_completion_with(&handle(), |attempt, status| {
                seen.push((attempt, status.to_string()))
            })
            .await
            .unwrap();

        assert_eq!(
            seen,
            vec![
                (1, "pending".to_string()),
                (2, "in-progress".to_string()),
                (3, "completed".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_query_is_scoped_to_handle() {
        let orchestrator = JobOrchestrator::new(ScriptedService::new(vec![]), fast_policy(1))
            .with_session_id("custom-session");

        let raw = orchestrator.query(&handle(), "rename things").await.unwrap();

        assert_eq!(raw, r#"{"message": "[]"}"#);
        let queries = orchestrator.service().queries.lock().unwrap();
        assert_eq!(queries.len(), 1);
        let request = &queries[0];
        assert!(request.genius);
        assert_eq!(request.session_id, "custom-session");
        assert_eq!(request.messages[0].content, "rename things");
        assert_eq!(request.repositories.len(), 1);
        assert_eq!(request.repositories[0].remote, "github");
        assert_eq!(request.repositories[0].branch, "main");
        assert_eq!(request.repositories[0].repository, "owner/repo");
    }
}
