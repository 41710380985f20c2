//! Parity check orchestrator
//!
//! Runs the roster strictly in sequence: one request in flight at a time,
//! every check runs regardless of earlier failures, and each failure is
//! recorded on its own CheckResult rather than aborting the run.
//!
//! At most one run is active per orchestrator. A second `run_all` while one
//! is in flight is rejected with `ParityError::RunInProgress`; nothing is
//! cancelled. There is no per-check timeout beyond what the transport sets.

use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};

use serde_json::Value;

use crate::checks::{self, CheckDefinition};
use crate::engine::result::{CheckStatus, RunState};
use crate::error::ParityError;
use crate::transport::CheckTransport;

pub struct ParityOrchestrator<T: CheckTransport> {
    transport: T,
    definitions: Vec<CheckDefinition>,
    state: Arc<RwLock<RunState>>,
}

/// Clears the running flag when the run ends, including when the run
/// future is dropped part-way through.
struct RunGuard<'a> {
    state: &'a RwLock<RunState>,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .set_running(false);
    }
}

impl<T: CheckTransport> ParityOrchestrator<T> {
    /// Orchestrator over the standard roster
    pub fn new(transport: T) -> Self {
        Self::with_definitions(transport, checks::roster())
    }

    pub fn with_definitions(transport: T, definitions: Vec<CheckDefinition>) -> Self {
        let state = RunState::new(definitions.iter().map(|d| d.name));
        Self {
            transport,
            definitions,
            state: Arc::new(RwLock::new(state)),
        }
    }

    pub fn definitions(&self) -> &[CheckDefinition] {
        &self.definitions
    }

    /// Copy of the current run state, usable while a run is in flight
    pub fn snapshot(&self) -> RunState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_running(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_running()
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, RunState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Clear previous results and run every check in roster order
    pub async fn run_all(&self) -> Result<RunState, ParityError> {
        {
            let mut state = self.write_state();
            if state.is_running() {
                return Err(ParityError::RunInProgress);
            }
            *state = RunState::new(self.definitions.iter().map(|d| d.name));
            state.set_running(true);
        }
        let guard = RunGuard { state: &self.state };

        tracing::info!("Starting parity run ({} checks)", self.definitions.len());

        for definition in &self.definitions {
            self.run_check(definition).await;
        }

        drop(guard);
        let state = self.snapshot();
        tracing::info!(
            "Parity run finished: {} passed, {} failed",
            state.pass_count(),
            state.fail_count()
        );
        Ok(state)
    }

    async fn run_check(&self, definition: &CheckDefinition) {
        self.write_state().update(
            definition.name,
            CheckStatus::Running,
            definition.progress_detail,
        );
        tracing::debug!("Check '{}' -> GET {}", definition.name, definition.endpoint);

        let outcome = match self
            .transport
            .get_json(definition.endpoint, definition.credentials)
            .await
        {
            Ok(body) => {
                let verdict = definition.evaluate(&body);
                if definition.retain_body {
                    self.retain(body);
                }
                verdict
            }
            Err(failure) => Err(failure),
        };

        let mut state = self.write_state();
        match outcome {
            Ok(detail) => {
                tracing::debug!("Check '{}' passed: {}", definition.name, detail);
                state.update(definition.name, CheckStatus::Pass, detail);
            }
            Err(failure) => {
                let detail = definition.describe_failure(&failure);
                tracing::warn!(
                    "Check '{}' failed ({}): {}",
                    definition.name,
                    failure.kind(),
                    detail
                );
                state.update(definition.name, CheckStatus::Fail, detail);
            }
        }
    }

    fn retain(&self, body: Value) {
        self.write_state().set_raw_report(body);
    }
}
