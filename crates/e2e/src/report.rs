//! Result aggregation and reporting
//!
//! [`AggregateResult`] collects one entry per test case; [`SuiteReport`] is
//! the machine-readable form written next to the textual summary.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::compare::ComparisonResult;
use crate::error::E2eResult;

/// A test case id paired with the reason it did not pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseIssue {
    pub id: String,
    pub reason: String,
}

/// Pass / fail / error buckets for one run. Created fresh per run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub passed: Vec<String>,
    pub failed: Vec<CaseIssue>,
    pub errors: Vec<CaseIssue>,
    pub total: usize,
}

impl AggregateResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a comparison: `ok` goes to passed, anything else to failed
    pub fn record(&mut self, id: impl Into<String>, result: &ComparisonResult) {
        let id = id.into();
        if result.ok {
            self.passed.push(id);
        } else {
            let reason = result
                .reason
                .clone()
                .unwrap_or_else(|| "comparison failed".to_string());
            self.failed.push(CaseIssue { id, reason });
        }
        self.total += 1;
    }

    /// Record a case that could not be executed
    pub fn record_error(&mut self, id: impl Into<String>, reason: impl Into<String>) {
        self.errors.push(CaseIssue {
            id: id.into(),
            reason: reason.into(),
        });
        self.total += 1;
    }

    pub fn summarize(&self) -> Summary {
        Summary {
            total: self.total,
            passed_count: self.passed.len(),
            failed_count: self.failed.len(),
            error_count: self.errors.len(),
            failures: self.failed.clone(),
            errors: self.errors.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub passed_count: usize,
    pub failed_count: usize,
    pub error_count: usize,
    pub failures: Vec<CaseIssue>,
    pub errors: Vec<CaseIssue>,
}

impl Summary {
    pub fn is_clean(&self) -> bool {
        self.failed_count == 0 && self.error_count == 0
    }

    /// The end-of-run text block
    pub fn render(&self, title: &str) -> String {
        let rule = "=".repeat(60);
        let mut out = String::new();
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "TEST EXECUTION SUMMARY: {}", title);
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "Total Tests: {}", self.total);
        let _ = writeln!(out, "Passed: {}", self.passed_count);
        let _ = writeln!(out, "Failed: {}", self.failed_count);
        let _ = writeln!(out, "Errors: {}", self.error_count);

        if !self.failures.is_empty() {
            let _ = writeln!(out, "\n✗ FAILED TEST CASES:");
            for issue in &self.failures {
                let _ = writeln!(out, "  - {}\n    Reason: {}", issue.id, issue.reason);
            }
        }
        if !self.errors.is_empty() {
            let _ = writeln!(out, "\n⚠ ERROR TEST CASES:");
            for issue in &self.errors {
                let _ = writeln!(out, "  - {}\n    Reason: {}", issue.id, issue.reason);
            }
        }
        let _ = write!(out, "{}", rule);
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
    Passed,
    Failed,
    Error,
}

/// One executed test case
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseReport {
    pub id: String,
    pub description: Option<String>,
    pub row: usize,
    pub status: CaseStatus,
    pub reason: Option<String>,
    pub duration_ms: u64,
}

/// Everything known about one suite run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteReport {
    pub suite: String,
    pub scenario: String,
    pub profile: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub summary: Summary,
    pub cases: Vec<CaseReport>,
    /// Set when a run-fatal error stopped the suite early
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aborted: Option<String>,
}

impl SuiteReport {
    /// Write `<dir>/<suite>-results.json`
    pub fn write_json(&self, dir: &Path) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(dir)?;

        let path = dir.join(format!("{}-results.json", file_stem(&self.suite)));
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
