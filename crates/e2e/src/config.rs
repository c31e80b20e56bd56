//! Harness configuration (`storefront.toml`)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{E2eError, E2eResult};
use crate::profile::SiteProfile;
use crate::runner::{SessionPolicy, Suite};
use crate::scenario::ScenarioKind;
use crate::source::{self, TestCaseRecord};
use crate::webdriver::{BrowserKind, WebDriverConfig};

/// Harness configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// WebDriver remote end
    pub webdriver_url: String,

    pub browser: BrowserKind,

    pub headless: bool,

    pub session_policy: SessionPolicy,

    /// Where JSON reports are written
    pub output_dir: PathBuf,

    /// Exit non-zero when any case fails or errors
    pub strict: bool,

    #[serde(rename = "suite")]
    pub suites: Vec<SuiteConfig>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            webdriver_url: WebDriverConfig::default().url,
            browser: BrowserKind::Chrome,
            headless: true,
            session_policy: SessionPolicy::PerCase,
            output_dir: PathBuf::from("test-results"),
            strict: false,
            suites: Vec::new(),
        }
    }
}

/// One `[[suite]]` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteConfig {
    pub name: String,
    pub scenario: ScenarioKind,
    /// CSV file, relative to the config file
    pub data: PathBuf,
    /// Embedded profile name or profile file
    pub profile: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_column: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_column: Option<String>,
}

impl HarnessConfig {
    /// Load configuration from file; a missing file yields the defaults
    pub fn load(path: &Path) -> E2eResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> E2eResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| E2eError::Config(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn webdriver(&self) -> WebDriverConfig {
        WebDriverConfig {
            url: self.webdriver_url.clone(),
            browser: self.browser,
            headless: self.headless,
            ..WebDriverConfig::default()
        }
    }

    /// Suites by name, in config order; all of them when `names` is empty
    pub fn select(&self, names: &[String]) -> E2eResult<Vec<&SuiteConfig>> {
        if names.is_empty() {
            return Ok(self.suites.iter().collect());
        }
        if let Some(unknown) = names
            .iter()
            .find(|name| !self.suites.iter().any(|s| &s.name == *name))
        {
            return Err(E2eError::Config(format!("no suite named '{}'", unknown)));
        }
        Ok(self
            .suites
            .iter()
            .filter(|s| names.contains(&s.name))
            .collect())
    }
}

impl SuiteConfig {
    pub fn data_path(&self, base_dir: &Path) -> PathBuf {
        base_dir.join(&self.data)
    }

    pub fn load_profile(&self, base_dir: &Path) -> E2eResult<SiteProfile> {
        SiteProfile::load(&self.profile, base_dir)
    }

    pub fn load_records(&self, base_dir: &Path) -> E2eResult<Vec<TestCaseRecord>> {
        source::load(&self.data_path(base_dir))
    }

    /// Bind loaded records and a profile into a runnable suite
    pub fn bind<'p>(&self, profile: &'p SiteProfile, records: Vec<TestCaseRecord>) -> Suite<'p> {
        Suite {
            name: self.name.clone(),
            scenario: self.scenario,
            profile,
            records,
            id_column: self.id_column.clone(),
            description_column: self.description_column.clone(),
        }
    }
}
