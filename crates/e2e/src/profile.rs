//! Site profiles: base URL, locators and expected values for one storefront
//!
//! A profile is either embedded in the binary or loaded from a JSON, YAML or
//! TOML file. Both forms produce the same [`SiteProfile`].

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::{E2eError, E2eResult};
use crate::locator::LocatorRegistry;

const ECOMMERCE_PLAYGROUND: &str = include_str!("../profiles/ecommerce-playground.yaml");
const SAUCEDEMO: &str = include_str!("../profiles/saucedemo.yaml");

/// Names of the profiles compiled into the harness
pub const EMBEDDED_PROFILES: &[&str] = &["ecommerce-playground", "saucedemo"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteProfile {
    pub name: String,

    pub base_url: String,

    #[serde(default)]
    pub timeouts: Timeouts,

    pub locators: LocatorRegistry,

    /// Expected messages, regex shapes, URL paths and account data
    #[serde(default)]
    pub values: BTreeMap<String, String>,

    /// Products added, in order, when a cart test needs pre-filled rows
    #[serde(default)]
    pub cart_seed: Vec<CartSeed>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSeed {
    pub product: String,
    #[serde(default = "default_seed_quantity")]
    pub quantity: u32,
}

fn default_seed_quantity() -> u32 {
    1
}

/// Bounded waits used by the driver adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Upper bound for "wait until present" lookups
    pub explicit_ms: u64,
    /// Delay between polls while waiting
    pub poll_ms: u64,
    /// Upper bound when waiting for a list to re-render
    pub stale_ms: u64,
    /// Page load timeout handed to the browser session
    pub page_load_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            explicit_ms: 10_000,
            poll_ms: 250,
            stale_ms: 10_000,
            page_load_ms: 30_000,
        }
    }
}

impl Timeouts {
    pub fn explicit(&self) -> Duration {
        Duration::from_millis(self.explicit_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_ms.max(1))
    }

    pub fn stale(&self) -> Duration {
        Duration::from_millis(self.stale_ms)
    }

    pub fn page_load(&self) -> Duration {
        Duration::from_millis(self.page_load_ms)
    }
}

impl SiteProfile {
    /// Load one of the embedded profiles by name
    pub fn embedded(name: &str) -> E2eResult<Self> {
        let source = match name {
            "ecommerce-playground" => ECOMMERCE_PLAYGROUND,
            "saucedemo" => SAUCEDEMO,
            other => {
                return Err(E2eError::Config(format!(
                    "no embedded profile named '{}' (available: {})",
                    other,
                    EMBEDDED_PROFILES.join(", ")
                )))
            }
        };
        Self::from_yaml(source)
    }

    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        let profile: Self = serde_yaml::from_str(yaml)?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn from_json(json: &str) -> E2eResult<Self> {
        let profile: Self = serde_json::from_str(json)?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn from_toml(text: &str) -> E2eResult<Self> {
        let profile: Self = toml::from_str(text)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Load a profile file; the format follows the extension
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            Some("toml") => Self::from_toml(&content),
            Some("yaml") | Some("yml") => Self::from_yaml(&content),
            _ => Err(E2eError::Config(format!(
                "unsupported profile format: {}",
                path.display()
            ))),
        }
    }

    /// Resolve a profile reference: an embedded name or a file path
    pub fn load(reference: &str, base_dir: &Path) -> E2eResult<Self> {
        if EMBEDDED_PROFILES.contains(&reference) {
            return Self::embedded(reference);
        }
        let path = base_dir.join(reference);
        Self::from_file(&path)
    }

    fn validate(&self) -> E2eResult<()> {
        self.base_url()?;
        if self.locators.is_empty() {
            return Err(E2eError::Config(format!(
                "profile '{}' defines no locators",
                self.name
            )));
        }
        Ok(())
    }

    pub fn base_url(&self) -> E2eResult<Url> {
        Url::parse(&self.base_url)
            .map_err(|e| E2eError::Config(format!("invalid base_url '{}': {}", self.base_url, e)))
    }

    /// Join a relative path (or absolute URL) onto the base URL
    pub fn url(&self, path: &str) -> E2eResult<Url> {
        self.base_url()?
            .join(path)
            .map_err(|e| E2eError::Config(format!("invalid URL path '{}': {}", path, e)))
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// A value the scenario cannot run without
    pub fn require_value(&self, key: &str) -> E2eResult<&str> {
        self.value(key).ok_or_else(|| {
            E2eError::Config(format!("profile '{}' is missing value '{}'", self.name, key))
        })
    }
}
