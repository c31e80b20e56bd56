//! Run Command

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::Serialize;
use tracing::{info, warn};

use storefront_e2e::{
    preflight, SessionPolicy, SiteProfile, Suite, SuiteReport, SuiteRunner, WebDriverFactory,
};

use super::load_config;
use crate::output::{print_json, print_list, print_success, print_warning, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct RunArgs {
    /// Run only these suites (repeatable); all configured suites by default
    #[arg(short, long = "suite")]
    pub suites: Vec<String>,

    /// WebDriver endpoint, overriding the config
    #[arg(long, env = "STOREFRONT_WEBDRIVER")]
    pub webdriver: Option<String>,

    /// Exit with status 1 when any case fails or errors
    #[arg(long)]
    pub strict: bool,

    /// Directory for JSON reports, overriding the config
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Reuse one browser session for a whole suite
    #[arg(long)]
    pub shared_session: bool,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Skip writing JSON reports
    #[arg(long)]
    pub no_report: bool,
}

/// Per-suite totals
#[derive(Serialize)]
pub struct SuiteRow {
    pub suite: String,
    pub scenario: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub duration_ms: u64,
}

impl From<&SuiteReport> for SuiteRow {
    fn from(report: &SuiteReport) -> Self {
        Self {
            suite: report.suite.clone(),
            scenario: report.scenario.clone(),
            total: report.summary.total,
            passed: report.summary.passed_count,
            failed: report.summary.failed_count,
            errors: report.summary.error_count,
            duration_ms: report.duration_ms,
        }
    }
}

impl TableDisplay for SuiteRow {
    fn headers() -> Vec<&'static str> {
        vec!["Suite", "Scenario", "Total", "Passed", "Failed", "Errors", "Duration"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.suite.clone(),
            self.scenario.clone(),
            self.total.to_string(),
            self.passed.to_string(),
            self.failed.to_string(),
            self.errors.to_string(),
            format!("{:.1}s", self.duration_ms as f64 / 1000.0),
        ]
    }
}

pub async fn execute(args: RunArgs, config_path: &Path, format: OutputFormat) -> Result<ExitCode> {
    let (mut config, base_dir) = load_config(config_path)?;
    if let Some(url) = args.webdriver {
        config.webdriver_url = url;
    }
    if let Some(dir) = args.output {
        config.output_dir = dir;
    }
    if args.shared_session {
        config.session_policy = SessionPolicy::Shared;
    }
    if args.headed {
        config.headless = false;
    }
    let strict = args.strict || config.strict;

    let selected = config.select(&args.suites)?;
    if selected.is_empty() {
        bail!("No suites configured in {}", config_path.display());
    }

    // Load everything up front so data errors stop the run before a browser opens
    let profiles = selected
        .iter()
        .map(|s| {
            s.load_profile(base_dir)
                .with_context(|| format!("Suite '{}': failed to load profile '{}'", s.name, s.profile))
        })
        .collect::<Result<Vec<SiteProfile>>>()?;

    let mut suites: Vec<Suite<'_>> = Vec::with_capacity(selected.len());
    for (suite_config, profile) in selected.iter().zip(&profiles) {
        let records = suite_config.load_records(base_dir).with_context(|| {
            format!("Suite '{}': failed to load test data", suite_config.name)
        })?;
        let suite = suite_config.bind(profile, records);
        preflight(&suite)?;
        suites.push(suite);
    }

    let factory = WebDriverFactory::new(config.webdriver())?;
    match factory.status().await {
        Ok(true) => info!("WebDriver ready at {}", config.webdriver_url),
        Ok(false) => warn!("WebDriver at {} reports not ready; trying anyway", config.webdriver_url),
        Err(e) => {
            return Err(e).with_context(|| format!("WebDriver not reachable at {}", config.webdriver_url))
        }
    }

    let runner = SuiteRunner::new(&factory).with_policy(config.session_policy);
    let mut reports = Vec::with_capacity(suites.len());
    let mut aborted = None;
    for suite in &suites {
        let report = match runner.run(suite).await {
            Ok(report) => report,
            Err(e) => {
                aborted = Some(e.error);
                *e.report
            }
        };

        if format != OutputFormat::Json {
            println!("{}", report.summary.render(&report.suite));
        }
        if !args.no_report {
            report.write_json(&config.output_dir)?;
        }
        reports.push(report);

        if aborted.is_some() {
            break;
        }
    }

    match format {
        OutputFormat::Json => print_json(&reports),
        _ => {
            let rows: Vec<SuiteRow> = reports.iter().map(SuiteRow::from).collect();
            print_list(&rows, format);
        }
    }

    if let Some(e) = aborted {
        let suite = reports.last().map(|r| r.suite.as_str()).unwrap_or_default();
        return Err(e).with_context(|| format!("Suite '{}' aborted", suite));
    }

    let clean = reports.iter().all(|r| r.summary.is_clean());
    if clean {
        print_success("All test cases passed");
        Ok(ExitCode::SUCCESS)
    } else if strict {
        print_warning("Failures or errors in a strict run");
        Ok(ExitCode::from(1))
    } else {
        print_warning("Some test cases failed or errored");
        Ok(ExitCode::SUCCESS)
    }
}
