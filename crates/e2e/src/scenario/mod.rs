//! Scenario executors
//!
//! Every feature under test is one [`ScenarioKind`] variant. A variant knows
//! which columns it reads, which locators it uses, how to drive the page for
//! one record ([`ScenarioKind::observe`]) and what the record declares the
//! page should show ([`ScenarioKind::expect`]). Executors never assert;
//! absence of an element is captured as [`Observed::Absent`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::browser::{keys, ElementHandle};
use crate::compare::{Expectation, Expected, Observed, Outcome};
use crate::driver::{Driver, Lookup};
use crate::error::{E2eError, E2eResult};
use crate::locator::LocatorDescriptor;
use crate::profile::SiteProfile;
use crate::source::TestCaseRecord;

mod account;
mod cart;
mod price_filter;
mod product;
mod search;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    Search,
    SearchTwice,
    PriceFilter,
    AddToCart,
    RemoveFromCart,
    Login,
    Logout,
    ChangePassword,
    ProductDetail,
}

impl ScenarioKind {
    pub const ALL: &'static [ScenarioKind] = &[
        ScenarioKind::Search,
        ScenarioKind::SearchTwice,
        ScenarioKind::PriceFilter,
        ScenarioKind::AddToCart,
        ScenarioKind::RemoveFromCart,
        ScenarioKind::Login,
        ScenarioKind::Logout,
        ScenarioKind::ChangePassword,
        ScenarioKind::ProductDetail,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ScenarioKind::Search => "search",
            ScenarioKind::SearchTwice => "search_twice",
            ScenarioKind::PriceFilter => "price_filter",
            ScenarioKind::AddToCart => "add_to_cart",
            ScenarioKind::RemoveFromCart => "remove_from_cart",
            ScenarioKind::Login => "login",
            ScenarioKind::Logout => "logout",
            ScenarioKind::ChangePassword => "change_password",
            ScenarioKind::ProductDetail => "product_detail",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ScenarioKind::Search => "Search one term; check first product, no-result message and result count",
            ScenarioKind::SearchTwice => "Search two terms in a row on the same page",
            ScenarioKind::PriceFilter => "Apply a min/max price filter to the full catalog",
            ScenarioKind::AddToCart => "Open a product (in or out of stock) and add it to the cart",
            ScenarioKind::RemoveFromCart => "Seed the cart, click remove N times, check what is left",
            ScenarioKind::Login => "Log in with the given credentials",
            ScenarioKind::Logout => "Log in, then log out through the menu",
            ScenarioKind::ChangePassword => "Change the account password from the account menu",
            ScenarioKind::ProductDetail => "Open a product page by image, category or direct URL",
        }
    }

    /// Columns the data file must provide
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            ScenarioKind::Search => search::COLUMNS,
            ScenarioKind::SearchTwice => search::TWICE_COLUMNS,
            ScenarioKind::PriceFilter => price_filter::COLUMNS,
            ScenarioKind::AddToCart => cart::ADD_COLUMNS,
            ScenarioKind::RemoveFromCart => cart::REMOVE_COLUMNS,
            ScenarioKind::Login => account::LOGIN_COLUMNS,
            ScenarioKind::Logout => account::LOGOUT_COLUMNS,
            ScenarioKind::ChangePassword => account::CHANGE_PASSWORD_COLUMNS,
            ScenarioKind::ProductDetail => product::COLUMNS,
        }
    }

    /// Expectation columns read as "N/A" (or a scenario default) when missing
    pub fn optional_columns(&self) -> &'static [&'static str] {
        match self {
            ScenarioKind::Search => search::OPTIONAL_COLUMNS,
            ScenarioKind::SearchTwice => search::TWICE_OPTIONAL_COLUMNS,
            ScenarioKind::PriceFilter => price_filter::OPTIONAL_COLUMNS,
            ScenarioKind::ProductDetail => product::OPTIONAL_COLUMNS,
            _ => &[],
        }
    }

    /// Locator keys the profile must define
    pub fn locator_keys(&self) -> &'static [&'static str] {
        match self {
            ScenarioKind::Search | ScenarioKind::SearchTwice => search::LOCATORS,
            ScenarioKind::PriceFilter => price_filter::LOCATORS,
            ScenarioKind::AddToCart => cart::ADD_LOCATORS,
            ScenarioKind::RemoveFromCart => cart::REMOVE_LOCATORS,
            ScenarioKind::Login => account::LOGIN_LOCATORS,
            ScenarioKind::Logout => account::LOGOUT_LOCATORS,
            ScenarioKind::ChangePassword => account::CHANGE_PASSWORD_LOCATORS,
            ScenarioKind::ProductDetail => product::LOCATORS,
        }
    }

    /// Profile values the scenario cannot run without
    pub fn value_keys(&self) -> &'static [&'static str] {
        match self {
            ScenarioKind::Search | ScenarioKind::SearchTwice => &[],
            ScenarioKind::PriceFilter => price_filter::VALUES,
            ScenarioKind::AddToCart => cart::ADD_VALUES,
            ScenarioKind::RemoveFromCart => cart::REMOVE_VALUES,
            ScenarioKind::Login => &[],
            ScenarioKind::Logout => account::LOGOUT_VALUES,
            ScenarioKind::ChangePassword => account::CHANGE_PASSWORD_VALUES,
            ScenarioKind::ProductDetail => product::VALUES,
        }
    }

    /// Drive the page for one record and capture what it shows
    pub async fn observe(
        &self,
        session: &Session<'_>,
        record: &TestCaseRecord,
    ) -> E2eResult<Outcome> {
        debug!("{} row {}", self.name(), record.row);
        match self {
            ScenarioKind::Search => search::observe(session, record).await,
            ScenarioKind::SearchTwice => search::observe_twice(session, record).await,
            ScenarioKind::PriceFilter => price_filter::observe(session, record).await,
            ScenarioKind::AddToCart => cart::observe_add(session, record).await,
            ScenarioKind::RemoveFromCart => cart::observe_remove(session, record).await,
            ScenarioKind::Login => account::observe_login(session, record).await,
            ScenarioKind::Logout => account::observe_logout(session, record).await,
            ScenarioKind::ChangePassword => account::observe_change_password(session, record).await,
            ScenarioKind::ProductDetail => product::observe(session, record).await,
        }
    }

    /// What the record declares the page should show
    pub fn expect(&self, record: &TestCaseRecord, profile: &SiteProfile) -> E2eResult<Expectation> {
        match self {
            ScenarioKind::Search => search::expect(record, profile),
            ScenarioKind::SearchTwice => search::expect_twice(record, profile),
            ScenarioKind::PriceFilter => price_filter::expect(record, profile),
            ScenarioKind::AddToCart => cart::expect_add(record),
            ScenarioKind::RemoveFromCart => cart::expect_remove(record, profile),
            ScenarioKind::Login => account::expect_login(record, profile),
            ScenarioKind::Logout => account::expect_logout(record, profile),
            ScenarioKind::ChangePassword => account::expect_change_password(record),
            ScenarioKind::ProductDetail => product::expect(record, profile),
        }
    }

    /// Check a data file's header and a profile against this scenario
    pub fn validate(&self, header: &[&str], profile: &SiteProfile) -> Vec<String> {
        let mut problems = Vec::new();
        for column in self.columns() {
            if !header.contains(column) {
                problems.push(format!("missing column '{}'", column));
            }
        }
        for key in self.locator_keys() {
            if !profile.locators.contains(key) {
                problems.push(format!(
                    "profile '{}' has no locator '{}'",
                    profile.name, key
                ));
            }
        }
        for key in self.value_keys() {
            if profile.value(key).is_none() {
                problems.push(format!("profile '{}' has no value '{}'", profile.name, key));
            }
        }
        problems
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScenarioKind {
    type Err = E2eError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| E2eError::UnknownScenario(s.to_string()))
    }
}

/// Browser driver plus the profile it runs against
pub struct Session<'a> {
    pub driver: &'a Driver,
    pub profile: &'a SiteProfile,
}

impl<'a> Session<'a> {
    pub fn new(driver: &'a Driver, profile: &'a SiteProfile) -> Self {
        Self { driver, profile }
    }

    pub fn locator(&self, key: &str) -> E2eResult<LocatorDescriptor> {
        self.profile.locators.get(key)
    }

    pub fn locator_with(&self, key: &str, substitutions: &[(&str, &str)]) -> E2eResult<LocatorDescriptor> {
        self.profile.locators.resolve(key, substitutions)
    }

    pub async fn open_home(&self) -> E2eResult<()> {
        let url = self.profile.base_url()?;
        self.driver.navigate(url.as_str()).await
    }

    /// Navigate to a path (or URL) relative to the profile's base URL
    pub async fn open_path(&self, path: &str) -> E2eResult<()> {
        let url = self.profile.url(path)?;
        self.driver.navigate(url.as_str()).await
    }

    /// Wait up to the explicit timeout for an element
    pub async fn wait_for(&self, key: &str) -> E2eResult<ElementHandle> {
        self.driver.wait_for(&self.locator(key)?).await
    }

    /// Immediate lookup; fails when absent
    pub async fn element(&self, key: &str) -> E2eResult<ElementHandle> {
        self.driver.find(&self.locator(key)?, None).await
    }

    pub async fn click(&self, key: &str) -> E2eResult<()> {
        let element = self.element(key).await?;
        self.driver.click(&element).await
    }

    /// Wait for an input, clear it and type `text` (nothing for an empty string)
    pub async fn fill(&self, key: &str, text: &str) -> E2eResult<ElementHandle> {
        let input = self.wait_for(key).await?;
        self.driver.clear(&input).await?;
        if !text.is_empty() {
            self.driver.type_text(&input, text).await?;
        }
        Ok(input)
    }

    pub async fn press_enter(&self, element: &ElementHandle) -> E2eResult<()> {
        self.driver.type_text(element, keys::ENTER).await
    }

    /// Text of the first match, or `Absent`. An element that disappears
    /// between lookup and read also counts as absent.
    pub async fn observe_text(&self, key: &str) -> E2eResult<Observed> {
        self.observe_locator_text(&self.locator(key)?).await
    }

    pub async fn observe_locator_text(&self, locator: &LocatorDescriptor) -> E2eResult<Observed> {
        match self.driver.probe(locator).await? {
            Lookup::Found(element) => match self.driver.read_text(&element).await {
                Ok(text) => Ok(Observed::present(text)),
                Err(E2eError::ElementNotFound(_)) => Ok(Observed::Absent),
                Err(e) => Err(e),
            },
            Lookup::NotFound => Ok(Observed::Absent),
        }
    }

    /// Presence only; a found element is recorded under its key
    pub async fn observe_presence(&self, key: &str) -> E2eResult<Observed> {
        match self.driver.probe(&self.locator(key)?).await? {
            Lookup::Found(_) => Ok(Observed::Present(key.to_string())),
            Lookup::NotFound => Ok(Observed::Absent),
        }
    }

    /// Number of matches right now
    pub async fn count(&self, key: &str) -> E2eResult<usize> {
        Ok(self.driver.find_all(&self.locator(key)?).await?.len())
    }

    /// Wait until one of several mutually exclusive elements shows up;
    /// returns the index of the key that matched.
    pub async fn wait_for_any(&self, keys: &[&str]) -> E2eResult<Option<usize>> {
        let locators = keys
            .iter()
            .map(|key| self.locator(key))
            .collect::<E2eResult<Vec<_>>>()?;
        let found = self
            .driver
            .find_any(&locators, self.driver.timeouts().explicit())
            .await?;
        Ok(found.map(|(index, _)| index))
    }
}

/// A record cell where "N/A" means absent, `YES`/`PRESENT` means "any text"
/// and anything else is the exact expected text.
pub(crate) fn presence_or_value(cell: &str) -> Expected {
    match cell.trim().to_ascii_uppercase().as_str() {
        "YES" | "PRESENT" => Expected::Present,
        _ => Expected::from_cell(cell),
    }
}

/// Parse a YES/NO cell
pub(crate) fn yes_no(record: &TestCaseRecord, field: &str) -> E2eResult<bool> {
    let raw = record.require(field)?;
    match raw.trim().to_ascii_uppercase().as_str() {
        "YES" | "Y" | "TRUE" => Ok(true),
        "NO" | "N" | "FALSE" => Ok(false),
        _ => Err(E2eError::invalid_field(field, raw, "expected YES or NO")),
    }
}
