//! Product search

use crate::compare::{Expectation, Expected, FieldRule, Observed, Outcome};
use crate::error::E2eResult;
use crate::profile::SiteProfile;
use crate::source::TestCaseRecord;

use super::{presence_or_value, Session};

pub(super) const COLUMNS: &[&str] = &["search_term"];
pub(super) const OPTIONAL_COLUMNS: &[&str] = &["expected_contains", "expected_not_found", "expected_count"];
pub(super) const TWICE_COLUMNS: &[&str] = &["search_term1", "search_term2"];
pub(super) const TWICE_OPTIONAL_COLUMNS: &[&str] = &[
    "expected_contains1",
    "expected_contains2",
    "expected_count1",
    "expected_count2",
];
pub(super) const LOCATORS: &[&str] = &[
    "search_input",
    "search_button",
    "product_container",
    "product_title",
    "no_product_message",
    "result_info",
];

/// Submit one search from whatever page the browser is on
async fn run_search(session: &Session<'_>, term: &str) -> E2eResult<()> {
    session.fill("search_input", term).await?;
    session.click("search_button").await?;
    session.wait_for("product_container").await?;
    Ok(())
}

pub(super) async fn observe(session: &Session<'_>, record: &TestCaseRecord) -> E2eResult<Outcome> {
    let term = record.require("search_term")?;

    session.open_home().await?;
    run_search(session, term).await?;

    Ok(Outcome::new()
        .with("product_name", session.observe_text("product_title").await?)
        .with("not_found_message", session.observe_text("no_product_message").await?)
        .with("result_count", session.observe_text("result_info").await?))
}

pub(super) async fn observe_twice(session: &Session<'_>, record: &TestCaseRecord) -> E2eResult<Outcome> {
    let first = record.require("search_term1")?;
    let second = record.require("search_term2")?;

    session.open_home().await?;
    let mut outcome = Outcome::new();
    for (suffix, term) in [("1", first), ("2", second)] {
        run_search(session, term).await?;
        outcome.set(
            &format!("product_name_{}", suffix),
            session.observe_text("product_title").await?,
        );
        outcome.set(
            &format!("result_count_{}", suffix),
            session.observe_text("result_info").await?,
        );
    }
    Ok(outcome)
}

/// Result counts must look like the site's pagination line when present.
/// `YES` accepts any such line; "N/A" requires there be none.
fn count_rule(profile: &SiteProfile) -> E2eResult<FieldRule> {
    match profile.value("pagination_pattern") {
        Some(pattern) => FieldRule::exact().with_pattern(pattern),
        None => Ok(FieldRule::exact()),
    }
}

pub(super) fn expect(record: &TestCaseRecord, profile: &SiteProfile) -> E2eResult<Expectation> {
    Ok(Expectation::new()
        .field(
            "product_name",
            Expected::from_cell(record.expected("expected_contains")),
            FieldRule::contains_ignore_case(),
        )
        .field(
            "not_found_message",
            Expected::from_cell(record.expected("expected_not_found")),
            FieldRule::exact(),
        )
        .field(
            "result_count",
            presence_or_value(record.expected("expected_count")),
            count_rule(profile)?,
        ))
}

pub(super) fn expect_twice(record: &TestCaseRecord, profile: &SiteProfile) -> E2eResult<Expectation> {
    let mut expectation = Expectation::new();
    for suffix in ["1", "2"] {
        expectation.push(
            &format!("product_name_{}", suffix),
            Expected::from_cell(record.expected(&format!("expected_contains{}", suffix))),
            FieldRule::contains_ignore_case(),
        );
        expectation.push(
            &format!("result_count_{}", suffix),
            presence_or_value(record.expected(&format!("expected_count{}", suffix))),
            count_rule(profile)?,
        );
    }
    Ok(expectation)
}
