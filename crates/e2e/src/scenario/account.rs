//! Login, logout and password change

use tracing::debug;

use crate::compare::{Expectation, Expected, FieldRule, Observed, Outcome};
use crate::driver::Lookup;
use crate::error::{E2eError, E2eResult};
use crate::profile::SiteProfile;
use crate::source::TestCaseRecord;

use super::Session;

pub(super) const LOGIN_COLUMNS: &[&str] = &["username", "password", "expected"];
pub(super) const LOGOUT_COLUMNS: &[&str] = &["username", "password", "expected"];
pub(super) const CHANGE_PASSWORD_COLUMNS: &[&str] = &["new_password", "confirm", "expected_result"];

pub(super) const LOGIN_LOCATORS: &[&str] = &[
    "username_field",
    "password_field",
    "login_button",
    "error_message",
    "inventory_page_marker",
];
pub(super) const LOGOUT_LOCATORS: &[&str] = &[
    "username_field",
    "password_field",
    "login_button",
    "error_message",
    "inventory_page_marker",
    "menu_button",
    "logout_button",
    "login_page_marker",
];
pub(super) const CHANGE_PASSWORD_LOCATORS: &[&str] = &[
    "my_account_dropdown",
    "login_link",
    "input_email",
    "input_password_login",
    "btn_login",
    "password_link",
    "input_new_password",
    "input_confirm",
    "btn_continue",
    "alert_message",
    "field_error",
];
pub(super) const LOGOUT_VALUES: &[&str] = &["logout_url"];
pub(super) const CHANGE_PASSWORD_VALUES: &[&str] = &["account_email", "account_password"];

/// `expected` value meaning the login goes through
const LOGIN_SUCCESS: &str = "success";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogoutExpectation {
    LogoutSuccess,
    LoginFailedNoLogout,
}

impl LogoutExpectation {
    fn parse(record: &TestCaseRecord) -> E2eResult<Self> {
        let raw = record.require("expected")?;
        match raw.trim().to_ascii_lowercase().as_str() {
            "logout_success" => Ok(Self::LogoutSuccess),
            "login_failed_no_logout" => Ok(Self::LoginFailedNoLogout),
            _ => Err(E2eError::invalid_field(
                "expected",
                raw,
                "expected logout_success or login_failed_no_logout",
            )),
        }
    }
}

/// Submit the login form and wait for either the inventory or an error
async fn submit_login(session: &Session<'_>, record: &TestCaseRecord) -> E2eResult<()> {
    let username = record.require("username")?;
    let password = record.require("password")?;

    session.open_home().await?;
    session.fill("username_field", username).await?;
    session.fill("password_field", password).await?;
    session.click("login_button").await?;

    if session
        .wait_for_any(&["inventory_page_marker", "error_message"])
        .await?
        .is_none()
    {
        debug!("neither inventory nor error appeared after login");
    }
    Ok(())
}

pub(super) async fn observe_login(session: &Session<'_>, record: &TestCaseRecord) -> E2eResult<Outcome> {
    submit_login(session, record).await?;

    Ok(Outcome::new()
        .with("inventory", session.observe_presence("inventory_page_marker").await?)
        .with("error_message", session.observe_text("error_message").await?))
}

pub(super) fn expect_login(record: &TestCaseRecord, profile: &SiteProfile) -> E2eResult<Expectation> {
    let expected = record.require("expected")?.trim();
    if expected.eq_ignore_ascii_case(LOGIN_SUCCESS) {
        return Ok(Expectation::new()
            .field("inventory", Expected::Present, FieldRule::exact())
            .field("error_message", Expected::Absent, FieldRule::exact()));
    }

    // A message key from the profile, or the literal message
    let message = profile.value(expected).unwrap_or(expected);
    Ok(Expectation::new()
        .field("inventory", Expected::Absent, FieldRule::exact())
        .field("error_message", Expected::Value(message.to_string()), FieldRule::exact()))
}

pub(super) async fn observe_logout(session: &Session<'_>, record: &TestCaseRecord) -> E2eResult<Outcome> {
    submit_login(session, record).await?;

    let logged_in = session.observe_presence("inventory_page_marker").await?;
    if logged_in.is_present() {
        session.click("menu_button").await?;
        let logout = session.wait_for("logout_button").await?;
        session.driver.click(&logout).await?;
        session.wait_for_any(&["login_page_marker"]).await?;
    }

    Ok(Outcome::new()
        .with("logged_in", logged_in)
        .with("login_page", session.observe_presence("login_page_marker").await?)
        .with("current_url", Observed::present(session.driver.current_url().await?)))
}

pub(super) fn expect_logout(record: &TestCaseRecord, profile: &SiteProfile) -> E2eResult<Expectation> {
    let expectation = match LogoutExpectation::parse(record)? {
        LogoutExpectation::LogoutSuccess => Expectation::new()
            .field("logged_in", Expected::Present, FieldRule::exact())
            .field("login_page", Expected::Present, FieldRule::exact())
            .field(
                "current_url",
                Expected::Value(profile.require_value("logout_url")?.to_string()),
                FieldRule::exact(),
            ),
        LogoutExpectation::LoginFailedNoLogout => Expectation::new()
            .field("logged_in", Expected::Absent, FieldRule::exact())
            .field("login_page", Expected::Present, FieldRule::exact()),
    };
    Ok(expectation)
}

/// Log in through the account menu unless the session already is
async fn ensure_account_login(session: &Session<'_>) -> E2eResult<()> {
    session.open_home().await?;
    session.click("my_account_dropdown").await?;

    match session.driver.probe(&session.locator("login_link")?).await? {
        Lookup::Found(link) => {
            session.driver.click(&link).await?;
            session
                .fill("input_email", session.profile.require_value("account_email")?)
                .await?;
            session
                .fill("input_password_login", session.profile.require_value("account_password")?)
                .await?;
            session.click("btn_login").await?;
            session.wait_for("my_account_dropdown").await?;
        }
        Lookup::NotFound => debug!("account session already logged in"),
    }
    Ok(())
}

pub(super) async fn observe_change_password(
    session: &Session<'_>,
    record: &TestCaseRecord,
) -> E2eResult<Outcome> {
    let new_password = record.require("new_password")?;
    let confirm = record.require("confirm")?;

    ensure_account_login(session).await?;
    session.click("my_account_dropdown").await?;
    let link = session.wait_for("password_link").await?;
    session.driver.click(&link).await?;

    session.fill("input_new_password", new_password).await?;
    session.fill("input_confirm", confirm).await?;
    session.click("btn_continue").await?;

    let message = match session.wait_for_any(&["alert_message", "field_error"]).await? {
        Some(0) => session.observe_text("alert_message").await?,
        Some(_) => session.observe_text("field_error").await?,
        None => Observed::Absent,
    };
    Ok(Outcome::new().with("message", message))
}

pub(super) fn expect_change_password(record: &TestCaseRecord) -> E2eResult<Expectation> {
    Ok(Expectation::new().field(
        "message",
        Expected::from_cell(record.require("expected_result")?),
        FieldRule::substring(),
    ))
}
