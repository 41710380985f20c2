//! Rendering of run results
//!
//! A direct projection of `RunState`: nothing here decides pass or fail.

use serde::Serialize;

use crate::engine::result::{CheckStatus, RunState, RunSummary};

/// Results for one deployment
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetReport {
    pub target: String,
    pub base_url: String,
    pub summary: RunSummary,
    pub run: RunState,
}

impl TargetReport {
    pub fn new(target: impl Into<String>, base_url: impl Into<String>, run: RunState) -> Self {
        Self {
            target: target.into(),
            base_url: base_url.into(),
            summary: run.summary(),
            run,
        }
    }

    pub fn has_failures(&self) -> bool {
        self.summary.fail_count > 0
    }
}

fn marker(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Pass => "PASS",
        CheckStatus::Fail => "FAIL",
        CheckStatus::Running => "....",
        CheckStatus::Pending => "    ",
    }
}

/// Plain-text rendering; `raw` appends the retained parity report
pub fn render_text(report: &TargetReport, raw: bool) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Deployment Parity Check: {} ({})\n",
        report.target, report.base_url
    ));

    let width = report
        .run
        .checks()
        .map(|c| c.name.len())
        .max()
        .unwrap_or(0);
    for check in report.run.checks() {
        out.push_str(&format!(
            "  [{}] {:<width$}  {}\n",
            marker(check.status),
            check.name,
            check.detail,
            width = width
        ));
    }

    out.push_str(&format!("{} passed", report.summary.pass_count));
    if report.summary.fail_count > 0 {
        out.push_str(&format!(", {} failed", report.summary.fail_count));
    }
    out.push('\n');

    if raw {
        if let Some(parity) = report.run.last_raw_report() {
            out.push_str("\nRaw Parity Report\n");
            let pretty =
                serde_json::to_string_pretty(parity).unwrap_or_else(|_| parity.to_string());
            out.push_str(&pretty);
            out.push('\n');
        }
    }

    out
}

pub fn render_json(reports: &[TargetReport]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(reports)
}
