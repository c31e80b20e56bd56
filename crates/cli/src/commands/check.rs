//! Check Command

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use serde::Serialize;
use storefront_e2e::{preflight, E2eResult, SuiteConfig};

use super::load_config;
use crate::output::{print_list, print_success, print_warning, OutputFormat, TableDisplay};

/// Validation result for one suite
#[derive(Serialize)]
pub struct CheckRow {
    pub suite: String,
    pub scenario: String,
    pub profile: String,
    pub cases: usize,
    pub problem: Option<String>,
}

impl TableDisplay for CheckRow {
    fn headers() -> Vec<&'static str> {
        vec!["Suite", "Scenario", "Profile", "Cases", "Status"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.suite.clone(),
            self.scenario.clone(),
            self.profile.clone(),
            self.cases.to_string(),
            self.problem.clone().unwrap_or_else(|| "ok".to_string()),
        ]
    }
}

/// Load one suite's profile and data and run the preflight checks
fn check_suite(suite: &SuiteConfig, base_dir: &Path) -> E2eResult<usize> {
    let profile = suite.load_profile(base_dir)?;
    let records = suite.load_records(base_dir)?;
    let count = records.len();
    preflight(&suite.bind(&profile, records))?;
    Ok(count)
}

pub fn execute(config_path: &Path, format: OutputFormat) -> Result<ExitCode> {
    let (config, base_dir) = load_config(config_path)?;

    let rows: Vec<CheckRow> = config
        .suites
        .iter()
        .map(|suite| {
            let (cases, problem) = match check_suite(suite, base_dir) {
                Ok(cases) => (cases, None),
                Err(e) => (0, Some(e.to_string())),
            };
            CheckRow {
                suite: suite.name.clone(),
                scenario: suite.scenario.to_string(),
                profile: suite.profile.clone(),
                cases,
                problem,
            }
        })
        .collect();

    print_list(&rows, format);

    let broken = rows.iter().filter(|r| r.problem.is_some()).count();
    if broken == 0 {
        print_success(&format!("{} suite(s) ready", rows.len()));
        Ok(ExitCode::SUCCESS)
    } else {
        print_warning(&format!("{} of {} suite(s) have problems", broken, rows.len()));
        Ok(ExitCode::from(2))
    }
}
