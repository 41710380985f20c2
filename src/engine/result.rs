//! Run state and per-check results

use std::collections::HashMap;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// Lifecycle of one check within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pending,
    Running,
    Pass,
    Fail,
}

impl CheckStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CheckStatus::Pass | CheckStatus::Fail)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Pending => "pending",
            CheckStatus::Running => "running",
            CheckStatus::Pass => "pass",
            CheckStatus::Fail => "fail",
        }
    }
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one named check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub detail: String,
}

/// Aggregate counters, recomputed on demand
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub total: usize,
    pub pass_count: usize,
    pub fail_count: usize,
}

/// Results of one run.
///
/// `roster` is the display order; `results` is only a lookup keyed by name,
/// so updating a check overwrites its row instead of appending a new one.
#[derive(Debug, Clone, Default)]
pub struct RunState {
    roster: Vec<String>,
    results: HashMap<String, CheckResult>,
    running: bool,
    last_raw_report: Option<Value>,
}

impl RunState {
    pub fn new<I, S>(roster: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roster: roster.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Upsert the result for `name`
    pub fn update(&mut self, name: &str, status: CheckStatus, detail: impl Into<String>) {
        if !self.roster.iter().any(|n| n == name) {
            self.roster.push(name.to_string());
        }
        self.results.insert(
            name.to_string(),
            CheckResult {
                name: name.to_string(),
                status,
                detail: detail.into(),
            },
        );
    }

    /// Results in roster order (checks not yet started are skipped)
    pub fn checks(&self) -> impl Iterator<Item = &CheckResult> + '_ {
        self.roster.iter().filter_map(|name| self.results.get(name))
    }

    pub fn get(&self, name: &str) -> Option<&CheckResult> {
        self.results.get(name)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub(crate) fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    pub fn last_raw_report(&self) -> Option<&Value> {
        self.last_raw_report.as_ref()
    }

    pub(crate) fn set_raw_report(&mut self, report: Value) {
        self.last_raw_report = Some(report);
    }

    pub fn pass_count(&self) -> usize {
        self.count(CheckStatus::Pass)
    }

    pub fn fail_count(&self) -> usize {
        self.count(CheckStatus::Fail)
    }

    fn count(&self, status: CheckStatus) -> usize {
        self.results.values().filter(|r| r.status == status).count()
    }

    /// `total` counts every check in the roster, started or not
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            total: self.roster.len(),
            pass_count: self.pass_count(),
            fail_count: self.fail_count(),
        }
    }

    /// Every started check has reached pass or fail
    pub fn is_settled(&self) -> bool {
        self.results.values().all(|r| r.status.is_terminal())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RunStateView<'a> {
    checks: Vec<&'a CheckResult>,
    running: bool,
    pass_count: usize,
    fail_count: usize,
    last_raw_report: Option<&'a Value>,
}

impl Serialize for RunState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        RunStateView {
            checks: self.checks().collect(),
            running: self.running,
            pass_count: self.pass_count(),
            fail_count: self.fail_count(),
            last_raw_report: self.last_raw_report.as_ref(),
        }
        .serialize(serializer)
    }
}
