//! Suite runner: feeds records through a scenario one at a time

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::browser::SessionFactory;
use crate::compare::{compare, ComparisonResult};
use crate::driver::Driver;
use crate::error::{E2eError, E2eResult};
use crate::profile::SiteProfile;
use crate::report::{AggregateResult, CaseReport, CaseStatus, SuiteReport};
use crate::scenario::{ScenarioKind, Session};
use crate::source::TestCaseRecord;

/// How browser sessions map onto test cases
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPolicy {
    /// Fresh browser per case
    #[default]
    PerCase,
    /// One browser for the whole suite
    Shared,
}

/// One suite: a scenario, the profile it runs against and its data rows
pub struct Suite<'a> {
    pub name: String,
    pub scenario: ScenarioKind,
    pub profile: &'a SiteProfile,
    pub records: Vec<TestCaseRecord>,
    pub id_column: Option<String>,
    pub description_column: Option<String>,
}

/// A suite stopped by a run-fatal error, with the cases that ran before it
#[derive(Error, Debug)]
#[error("Suite '{}' aborted: {}", .report.suite, .error)]
pub struct SuiteAborted {
    pub report: Box<SuiteReport>,
    #[source]
    pub error: E2eError,
}

/// Runs suites sequentially against browsers from a [`SessionFactory`]
pub struct SuiteRunner<'f> {
    factory: &'f dyn SessionFactory,
    policy: SessionPolicy,
}

impl<'f> SuiteRunner<'f> {
    pub fn new(factory: &'f dyn SessionFactory) -> Self {
        Self {
            factory,
            policy: SessionPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: SessionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Run every record of the suite. Failing and erroring cases are recorded
    /// and the run continues; only run-fatal errors abort it.
    pub async fn run(&self, suite: &Suite<'_>) -> Result<SuiteReport, SuiteAborted> {
        let mut progress = Progress::start(suite);

        info!(
            "Running suite '{}' ({}, {} case(s)) against {}",
            suite.name,
            suite.scenario,
            suite.records.len(),
            suite.profile.name
        );

        let mut shared = match self.policy {
            SessionPolicy::Shared => match self.open_driver(suite.profile).await {
                Ok(driver) => Some(driver),
                Err(e) => return Err(progress.abort(suite, e)),
            },
            SessionPolicy::PerCase => None,
        };

        let mut fatal = None;
        for record in &suite.records {
            let id = record.id(suite.id_column.as_deref());
            let description = suite
                .description_column
                .as_deref()
                .and_then(|column| record.get(column))
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string);
            let label = match &description {
                Some(description) => format!("{} ({})", id, description),
                None => id.clone(),
            };
            let case_start = Instant::now();

            let outcome = match &shared {
                Some(driver) => execute(suite, driver, record).await,
                None => self.execute_isolated(suite, record).await,
            };
            let duration_ms = case_start.elapsed().as_millis() as u64;

            let (status, reason) = match outcome {
                Ok(result) => {
                    progress.aggregate.record(id.clone(), &result);
                    if result.ok {
                        info!("✓ {} ({} ms)", label, duration_ms);
                        (CaseStatus::Passed, None)
                    } else {
                        let reason = result.reason.unwrap_or_default();
                        error!("✗ {} - {}", label, reason);
                        (CaseStatus::Failed, Some(reason))
                    }
                }
                Err(e) => {
                    warn!("⚠ {} - {}", label, e);
                    progress.aggregate.record_error(id.clone(), e.to_string());
                    let reason = e.to_string();
                    if e.is_run_fatal() {
                        fatal = Some(e);
                    }
                    (CaseStatus::Error, Some(reason))
                }
            };

            progress.cases.push(CaseReport {
                id,
                description,
                row: record.row,
                status,
                reason,
                duration_ms,
            });

            if fatal.is_some() {
                break;
            }
        }

        if let Some(driver) = shared.take() {
            quit(&driver).await;
        }
        if let Some(e) = fatal {
            error!("Suite '{}' aborted: {}", suite.name, e);
            return Err(progress.abort(suite, e));
        }

        let report = progress.finish(suite);
        info!(
            "Suite '{}': {} passed, {} failed, {} errors ({} ms)",
            suite.name,
            report.summary.passed_count,
            report.summary.failed_count,
            report.summary.error_count,
            report.duration_ms
        );
        Ok(report)
    }

    async fn open_driver(&self, profile: &SiteProfile) -> E2eResult<Driver> {
        let browser = self.factory.open().await?;
        Ok(Driver::new(browser, profile.timeouts))
    }

    /// One case in its own browser; the browser is quit whatever happens
    async fn execute_isolated(
        &self,
        suite: &Suite<'_>,
        record: &TestCaseRecord,
    ) -> E2eResult<ComparisonResult> {
        let driver = self.open_driver(suite.profile).await?;
        let result = execute(suite, &driver, record).await;
        quit(&driver).await;
        result
    }
}

/// Results collected so far for one suite
struct Progress {
    started_at: DateTime<Utc>,
    start: Instant,
    aggregate: AggregateResult,
    cases: Vec<CaseReport>,
}

impl Progress {
    fn start(suite: &Suite<'_>) -> Self {
        Self {
            started_at: Utc::now(),
            start: Instant::now(),
            aggregate: AggregateResult::new(),
            cases: Vec::with_capacity(suite.records.len()),
        }
    }

    fn finish(self, suite: &Suite<'_>) -> SuiteReport {
        SuiteReport {
            suite: suite.name.clone(),
            scenario: suite.scenario.to_string(),
            profile: suite.profile.name.clone(),
            started_at: self.started_at,
            duration_ms: self.start.elapsed().as_millis() as u64,
            summary: self.aggregate.summarize(),
            cases: self.cases,
            aborted: None,
        }
    }

    fn abort(self, suite: &Suite<'_>, error: E2eError) -> SuiteAborted {
        let mut report = self.finish(suite);
        report.aborted = Some(error.to_string());
        SuiteAborted {
            report: Box::new(report),
            error,
        }
    }
}

/// Observe, build the expectation, compare.
///
/// Lookup and interaction failures that escape a scenario mean the page did
/// not behave as the row declared: they fail the case rather than error it.
async fn execute(
    suite: &Suite<'_>,
    driver: &Driver,
    record: &TestCaseRecord,
) -> E2eResult<ComparisonResult> {
    let session = Session::new(driver, suite.profile);
    let expectation = suite.scenario.expect(record, suite.profile)?;
    let outcome = match suite.scenario.observe(&session, record).await {
        Ok(outcome) => outcome,
        Err(e) if e.is_element_error() => {
            debug!("row {} stopped on the page: {}", record.row, e);
            return Ok(ComparisonResult::fail(e.to_string()));
        }
        Err(e) => return Err(e),
    };
    debug!("row {} observed {} field(s)", record.row, outcome.len());
    Ok(compare(&expectation, &outcome))
}

async fn quit(driver: &Driver) {
    if let Err(e) = driver.quit().await {
        warn!("Failed to quit browser session: {}", e);
    }
}

/// Check a suite before opening any browser
pub fn preflight(suite: &Suite<'_>) -> E2eResult<()> {
    let header: Vec<&str> = match suite.records.first() {
        Some(record) => record.fields().map(|(name, _)| name).collect(),
        None => return Ok(()),
    };
    let problems = suite.scenario.validate(&header, suite.profile);
    if problems.is_empty() {
        Ok(())
    } else {
        Err(E2eError::Config(format!(
            "suite '{}': {}",
            suite.name,
            problems.join("; ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{shop_profile, Effect, FakeFactory, FakeSite, Page};
    use std::sync::atomic::Ordering;

    /// Search page that forgets nothing between searches
    #[derive(Default)]
    struct Shop {
        typed: String,
        query: Option<String>,
        /// Search button rejects clicks, as when an overlay covers it
        jammed: bool,
    }

    impl FakeSite for Shop {
        fn render(&mut self, _url: &str) -> Page {
            let mut page = Page::default();
            page.add("search", &[""]).add("#search-button", &["Search"]);
            if let Some(query) = &self.query {
                page.add("product-search", &[""]);
                if query.eq_ignore_ascii_case("ipod") {
                    page.add(".product h4", &["iPod Touch"]);
                } else {
                    page.add("#no-product", &["There is no product that matches the search criteria."]);
                }
            }
            page
        }

        fn click(&mut self, url: &str, selector: &str, _index: usize) -> E2eResult<Effect> {
            if selector == "#search-button" {
                if self.jammed {
                    return Err(E2eError::InteractionError(
                        "element click intercepted: #search-button".to_string(),
                    ));
                }
                self.query = Some(self.typed.clone());
                return Ok(Effect::Navigate(url.to_string()));
            }
            Ok(Effect::None)
        }

        fn type_text(&mut self, _selector: &str, text: &str) {
            self.typed.push_str(text);
        }

        fn clear(&mut self, _selector: &str) {
            self.typed.clear();
        }
    }

    fn records() -> Vec<TestCaseRecord> {
        let rows: &[(&str, &str, &str, &str)] = &[
            ("TC01", "ipod", "iPod", "N/A"),
            ("TC02", "zzz", "N/A", "There is no product that matches the search criteria."),
            ("TC03", "ipod", "MacBook", "N/A"),
        ];
        let mut records: Vec<TestCaseRecord> = rows
            .iter()
            .enumerate()
            .map(|(i, &(id, term, contains, not_found))| {
                TestCaseRecord::from_pairs(
                    i + 1,
                    &[
                        ("tc_id", id),
                        ("search_term", term),
                        ("expected_contains", contains),
                        ("expected_not_found", not_found),
                        ("note", "smoke"),
                    ],
                )
            })
            .collect();
        // No search_term: an error for this case only
        records.push(TestCaseRecord::from_pairs(4, &[("tc_id", "TC04"), ("expected_contains", "x")]));
        records
    }

    fn suite(profile: &SiteProfile) -> Suite<'_> {
        Suite {
            name: "search".to_string(),
            scenario: ScenarioKind::Search,
            profile,
            records: records(),
            id_column: None,
            description_column: Some("note".to_string()),
        }
    }

    #[tokio::test]
    async fn test_run_records_every_case() {
        let profile = shop_profile();
        let factory = FakeFactory::new(Shop::default);
        let report = SuiteRunner::new(&factory).run(&suite(&profile)).await.unwrap();

        let summary = &report.summary;
        assert_eq!(summary.total, 4);
        assert_eq!(summary.passed_count, 2);
        assert_eq!(summary.failures[0].id, "TC03");
        assert!(summary.failures[0].reason.starts_with("product_name:"));
        assert_eq!(summary.errors[0].id, "TC04");
        assert_eq!(report.cases[0].description.as_deref(), Some("smoke"));
        assert_eq!(report.cases[3].status, CaseStatus::Error);

        // One browser per case, every one of them quit
        assert_eq!(factory.opened.load(Ordering::SeqCst), 4);
        assert_eq!(factory.quits.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_shared_session_quits_once() {
        let profile = shop_profile();
        let factory = FakeFactory::new(Shop::default);
        let runner = SuiteRunner::new(&factory).with_policy(SessionPolicy::Shared);
        let report = runner.run(&suite(&profile)).await.unwrap();

        assert_eq!(report.summary.passed_count, 2);
        assert_eq!(factory.opened.load(Ordering::SeqCst), 1);
        assert_eq!(factory.quits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_config_error_aborts_run() {
        // Price filter needs profile values the login profile does not have
        let profile = crate::testing::login_profile();
        let factory = FakeFactory::new(Shop::default);
        let suite = Suite {
            name: "filter".to_string(),
            scenario: ScenarioKind::PriceFilter,
            profile: &profile,
            records: vec![TestCaseRecord::from_pairs(
                1,
                &[("min_price", "1"), ("max_price", "2"), ("expected_result", "pass")],
            )],
            id_column: None,
            description_column: None,
        };

        let aborted = SuiteRunner::new(&factory).run(&suite).await.unwrap_err();
        assert!(aborted.error.is_run_fatal());
        assert_eq!(factory.quits.load(Ordering::SeqCst), factory.opened.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_aborted_suite_keeps_earlier_cases() {
        // Direct product URLs need a path template this profile lacks
        let mut profile = shop_profile();
        profile.values.remove("product_path");
        let factory = FakeFactory::new(Shop::default);
        let rows: &[&[(&str, &str)]] = &[
            &[("tc_id", "PD01"), ("action", "click_image"), ("product_name", "iPod"), ("expected_result", "iPod")],
            &[("tc_id", "PD02"), ("action", "direct_url"), ("product_id", "40"), ("expected_result", "iPhone")],
            &[("tc_id", "PD03"), ("action", "direct_url"), ("product_id", "41"), ("expected_result", "iMac")],
        ];
        let suite = Suite {
            name: "product detail".to_string(),
            scenario: ScenarioKind::ProductDetail,
            profile: &profile,
            records: rows
                .iter()
                .enumerate()
                .map(|(i, pairs)| TestCaseRecord::from_pairs(i + 1, pairs))
                .collect(),
            id_column: None,
            description_column: None,
        };

        let aborted = SuiteRunner::new(&factory).run(&suite).await.unwrap_err();
        assert!(aborted.error.is_run_fatal());

        let report = aborted.report;
        assert_eq!(report.cases.len(), 2);
        assert_eq!(report.summary.failed_count, 1);
        assert_eq!(report.summary.errors[0].id, "PD02");
        assert!(report.aborted.unwrap().contains("product_path"));
        assert_eq!(factory.opened.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_rejected_click_is_a_failure() {
        let profile = shop_profile();
        let factory = FakeFactory::new(|| Shop {
            jammed: true,
            ..Shop::default()
        });
        let mut suite = suite(&profile);
        suite.records.truncate(1);

        let report = SuiteRunner::new(&factory).run(&suite).await.unwrap();
        let summary = &report.summary;
        assert_eq!(summary.failed_count, 1);
        assert_eq!(summary.error_count, 0);
        assert!(summary.failures[0].reason.starts_with("Interaction rejected:"));
        assert_eq!(report.cases[0].status, CaseStatus::Failed);
    }

    #[test]
    fn test_preflight() {
        let profile = shop_profile();
        assert!(preflight(&suite(&profile)).is_ok());

        let login = crate::testing::login_profile();
        let mut bad = suite(&login);
        bad.records.truncate(1);
        let err = preflight(&bad).unwrap_err().to_string();
        assert!(err.contains("no locator 'search_input'"));
    }
}
