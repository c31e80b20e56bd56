//! Scenarios Command

use std::process::ExitCode;

use anyhow::Result;
use serde::Serialize;
use storefront_e2e::ScenarioKind;

use crate::output::{print_list, OutputFormat, TableDisplay};

#[derive(Serialize)]
pub struct ScenarioRow {
    pub name: &'static str,
    pub description: &'static str,
    pub columns: Vec<&'static str>,
    pub optional_columns: Vec<&'static str>,
}

impl From<ScenarioKind> for ScenarioRow {
    fn from(kind: ScenarioKind) -> Self {
        Self {
            name: kind.name(),
            description: kind.description(),
            columns: kind.columns().to_vec(),
            optional_columns: kind.optional_columns().to_vec(),
        }
    }
}

impl TableDisplay for ScenarioRow {
    fn headers() -> Vec<&'static str> {
        vec!["Scenario", "Description", "Columns", "Optional"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.name.to_string(),
            self.description.to_string(),
            self.columns.join(", "),
            self.optional_columns.join(", "),
        ]
    }
}

pub fn execute(format: OutputFormat) -> Result<ExitCode> {
    let rows: Vec<ScenarioRow> = ScenarioKind::ALL.iter().copied().map(ScenarioRow::from).collect();
    print_list(&rows, format);
    Ok(ExitCode::SUCCESS)
}
