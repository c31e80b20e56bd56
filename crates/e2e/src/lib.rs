//! Storefront E2E Harness
//!
//! Data-driven browser tests for e-commerce storefronts:
//! - Loads test cases from CSV files, one record per row
//! - Resolves element locators from an embedded or external site profile
//! - Drives a browser over the W3C WebDriver protocol
//! - Compares what the page shows against the expectations in each record
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  SuiteRunner (one suite)                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  source::load(csv) -> [TestCaseRecord]                       │
//! │    for each record:                                          │
//! │      SessionFactory::open() -> Driver                        │
//! │      ScenarioKind::observe(session, record) -> Outcome       │
//! │      ScenarioKind::expect(record, profile) -> Expectation    │
//! │      compare(expectation, outcome) -> ComparisonResult       │
//! │      AggregateResult::record(id, result)                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  SiteProfile (YAML / JSON / TOML)                            │
//! │    ├── base_url, timeouts                                    │
//! │    ├── locators: key -> { strategy, selector }               │
//! │    ├── values: expected messages, patterns, paths            │
//! │    └── cart_seed: products for cart scenarios                │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod browser;
pub mod compare;
pub mod config;
pub mod driver;
pub mod error;
pub mod locator;
pub mod profile;
pub mod report;
pub mod runner;
pub mod scenario;
pub mod source;
pub mod webdriver;

#[cfg(test)]
mod testing;

pub use browser::{Browser, ElementHandle, SessionFactory};
pub use compare::{compare, ComparisonResult, Expectation, Expected, FieldRule, Observed, Outcome};
pub use config::{HarnessConfig, SuiteConfig};
pub use driver::{Driver, Lookup};
pub use error::{E2eError, E2eResult};
pub use locator::{LocatorDescriptor, LocatorRegistry, Strategy};
pub use profile::{SiteProfile, Timeouts};
pub use report::{AggregateResult, SuiteReport, Summary};
pub use runner::{preflight, SessionPolicy, Suite, SuiteAborted, SuiteRunner};
pub use scenario::{ScenarioKind, Session};
pub use source::TestCaseRecord;
pub use webdriver::{BrowserKind, WebDriverConfig, WebDriverFactory};
