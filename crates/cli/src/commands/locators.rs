//! Locators Command

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use storefront_e2e::SiteProfile;

use crate::output::{print_list, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct LocatorsArgs {
    /// Embedded profile name or profile file (JSON, YAML, TOML)
    #[arg(short, long, default_value = "ecommerce-playground")]
    pub profile: String,

    /// List the profile's values instead of its locators
    #[arg(long)]
    pub values: bool,
}

#[derive(Serialize)]
pub struct LocatorRow {
    pub key: String,
    pub strategy: String,
    pub selector: String,
    pub placeholders: Vec<String>,
}

impl TableDisplay for LocatorRow {
    fn headers() -> Vec<&'static str> {
        vec!["Key", "Strategy", "Selector", "Placeholders"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.key.clone(),
            self.strategy.clone(),
            self.selector.clone(),
            self.placeholders.join(", "),
        ]
    }
}

#[derive(Serialize)]
pub struct ValueRow {
    pub key: String,
    pub value: String,
}

impl TableDisplay for ValueRow {
    fn headers() -> Vec<&'static str> {
        vec!["Key", "Value"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.key.clone(), self.value.clone()]
    }
}

pub fn execute(args: LocatorsArgs, config_path: &Path, format: OutputFormat) -> Result<ExitCode> {
    // Profile files are resolved like suite profiles: next to the config
    let base_dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let profile = SiteProfile::load(&args.profile, base_dir)
        .with_context(|| format!("Failed to load profile '{}'", args.profile))?;

    if args.values {
        let rows: Vec<ValueRow> = profile
            .values
            .iter()
            .map(|(key, value)| ValueRow {
                key: key.clone(),
                value: value.clone(),
            })
            .collect();
        print_list(&rows, format);
    } else {
        let rows: Vec<LocatorRow> = profile
            .locators
            .iter()
            .map(|(key, locator)| LocatorRow {
                key: key.to_string(),
                strategy: locator.strategy.to_string(),
                selector: locator.selector.clone(),
                placeholders: locator.placeholders(),
            })
            .collect();
        print_list(&rows, format);
    }

    Ok(ExitCode::SUCCESS)
}
