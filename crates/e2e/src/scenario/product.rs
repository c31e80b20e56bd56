//! Product detail page, reached three ways

use tracing::debug;

use crate::compare::{Expectation, Expected, FieldRule, Observed, Outcome};
use crate::error::{E2eError, E2eResult};
use crate::locator::fill_template;
use crate::profile::SiteProfile;
use crate::source::{TestCaseRecord, NOT_APPLICABLE};

use super::Session;

pub(super) const COLUMNS: &[&str] = &["action", "expected_result"];
pub(super) const OPTIONAL_COLUMNS: &[&str] = &["product_name", "product_id", "category"];
pub(super) const LOCATORS: &[&str] = &[
    "search_input",
    "product_link",
    "product_image",
    "category_image",
    "product_page_title",
    "product_page_price",
    "product_not_found",
    "no_product_message",
];
pub(super) const VALUES: &[&str] = &["product_path", "price_pattern"];

/// `expected_result` for rows that only check the page rendered
const PAGE_DISPLAYED: &str = "product page displayed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    ClickImage,
    ClickCategory,
    DirectUrl,
}

impl Action {
    fn parse(record: &TestCaseRecord) -> E2eResult<Self> {
        let raw = record.require("action")?;
        match raw.trim().to_ascii_lowercase().as_str() {
            "click_image" => Ok(Action::ClickImage),
            "click_category" => Ok(Action::ClickCategory),
            "direct_url" => Ok(Action::DirectUrl),
            _ => Err(E2eError::invalid_field(
                "action",
                raw,
                "expected click_image, click_category or direct_url",
            )),
        }
    }
}

/// A cell that is neither empty nor "N/A"
fn cell<'r>(record: &'r TestCaseRecord, field: &str) -> Option<&'r str> {
    record
        .get(field)
        .map(str::trim)
        .filter(|value| !value.is_empty() && *value != NOT_APPLICABLE)
}

async fn search(session: &Session<'_>, product: &str) -> E2eResult<()> {
    session.open_home().await?;
    let input = session.fill("search_input", product).await?;
    session.press_enter(&input).await
}

/// Click the element `key` resolves to; false when it never shows up
async fn click_resolved(session: &Session<'_>, key: &str, name: &str, value: &str) -> E2eResult<bool> {
    let locator = session.locator_with(key, &[(name, value)])?;
    let found = session
        .driver
        .find_any(std::slice::from_ref(&locator), session.driver.timeouts().explicit())
        .await?;
    match found {
        Some((_, element)) => {
            session.driver.click(&element).await?;
            Ok(true)
        }
        None => {
            debug!("'{}' not on the page", locator);
            Ok(false)
        }
    }
}

pub(super) async fn observe(session: &Session<'_>, record: &TestCaseRecord) -> E2eResult<Outcome> {
    let reached = match Action::parse(record)? {
        Action::ClickImage => {
            let product = record.require("product_name")?;
            search(session, product).await?;
            click_resolved(session, "product_image", "product", product).await?
        }
        Action::ClickCategory => {
            let product = record.require("product_name")?;
            let listed = match cell(record, "category") {
                Some(category) => {
                    session.open_home().await?;
                    click_resolved(session, "category_image", "category", category).await?
                }
                None => {
                    search(session, product).await?;
                    true
                }
            };
            listed && click_resolved(session, "product_link", "product", product).await?
        }
        Action::DirectUrl => {
            let id = record.require("product_id")?.trim();
            let template = session.profile.require_value("product_path")?;
            let path = fill_template("product_path", template, &[("product_id", id)])?;
            session.open_path(&path).await?;
            true
        }
    };

    // No product page: whatever "no product" notice the listing shows stands in
    if !reached {
        return Ok(Outcome::new()
            .with("product_title", Observed::Absent)
            .with("product_price", Observed::Absent)
            .with("not_found_message", session.observe_text("no_product_message").await?));
    }

    if session
        .wait_for_any(&["product_page_price", "product_not_found"])
        .await?
        .is_none()
    {
        debug!("product page showed neither a price nor a not-found notice");
    }

    Ok(Outcome::new()
        .with("product_title", session.observe_text("product_page_title").await?)
        .with("product_price", session.observe_text("product_page_price").await?)
        .with("not_found_message", session.observe_text("product_not_found").await?))
}

pub(super) fn expect(record: &TestCaseRecord, profile: &SiteProfile) -> E2eResult<Expectation> {
    Action::parse(record)?;
    let price_rule = FieldRule::exact().with_pattern(profile.require_value("price_pattern")?)?;
    let expected = record.require("expected_result")?.trim();
    let lowered = expected.to_lowercase();

    if lowered.contains("not found") {
        return Ok(Expectation::new()
            .field("not_found_message", Expected::Present, FieldRule::exact())
            .field("product_price", Expected::Absent, price_rule));
    }

    let title = if lowered == PAGE_DISPLAYED {
        Expected::Present
    } else {
        Expected::Value(expected.to_string())
    };
    Ok(Expectation::new()
        .field("product_title", title, FieldRule::contains_ignore_case())
        .field("product_price", Expected::Present, price_rule)
        .field("not_found_message", Expected::Absent, FieldRule::exact()))
}
