//! Add to cart and remove from cart

use tracing::{debug, warn};

use crate::compare::{Expectation, Expected, FieldRule, Observed, Outcome};
use crate::driver::Lookup;
use crate::error::{E2eError, E2eResult};
use crate::profile::SiteProfile;
use crate::source::{TestCaseRecord, NOT_APPLICABLE};

use super::{yes_no, Session};

pub(super) const ADD_COLUMNS: &[&str] = &[
    "product",
    "quantity",
    "size_option",
    "stock_status",
    "expected_message",
];
pub(super) const REMOVE_COLUMNS: &[&str] = &[
    "initial_items",
    "remove_clicks",
    "expected_items_after",
    "expect_empty_message",
];
pub(super) const ADD_LOCATORS: &[&str] = &[
    "shop_by_category_link",
    "desktops_menu_item",
    "product_tile",
    "filter_in_stock",
    "filter_out_of_stock",
    "category_image",
    "product_link",
    "product_image",
    "size_dropdown",
    "quantity_input",
    "add_to_cart_button",
    "notification_message",
    "size_error_message",
];
pub(super) const REMOVE_LOCATORS: &[&str] = &[
    "shop_by_category_link",
    "desktops_menu_item",
    "product_tile",
    "filter_in_stock",
    "product_link",
    "product_image",
    "quantity_input",
    "add_to_cart_button",
    "notification_message",
    "size_error_message",
    "cart_rows",
    "cart_remove_button",
    "empty_cart_message",
    "continue_link",
];
pub(super) const ADD_VALUES: &[&str] = &["out_of_stock_category"];
pub(super) const REMOVE_VALUES: &[&str] = &["cart_path", "empty_cart_message"];

/// Upper bound on remove clicks while emptying the cart
const MAX_CLEAR_CLICKS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stock {
    InStock,
    OutOfStock,
}

impl Stock {
    fn parse(record: &TestCaseRecord) -> E2eResult<Self> {
        let raw = record.require("stock_status")?;
        match raw.trim().to_ascii_uppercase().replace([' ', '-'], "_").as_str() {
            "IN_STOCK" => Ok(Stock::InStock),
            "OUT_OF_STOCK" => Ok(Stock::OutOfStock),
            _ => Err(E2eError::invalid_field(
                "stock_status",
                raw,
                "expected IN_STOCK or OUT_OF_STOCK",
            )),
        }
    }
}

/// Click a listing filter and wait for the product tiles to re-render
async fn apply_filter(session: &Session<'_>, filter_key: &str) -> E2eResult<()> {
    let tiles = session.driver.find_all(&session.locator("product_tile")?).await?;
    match session.driver.probe(&session.locator(filter_key)?).await? {
        Lookup::Found(filter) => {
            session.driver.click(&filter).await?;
            if let Some(first) = tiles.first() {
                let timeout = session.driver.timeouts().stale();
                session.driver.wait_until_stale(first, timeout).await;
            }
        }
        Lookup::NotFound => debug!("filter '{}' not on the page, listing unfiltered", filter_key),
    }
    Ok(())
}

/// Open the product page from the current listing: by link text, falling
/// back to the product image. False when the listing has neither.
async fn open_product(session: &Session<'_>, product: &str) -> E2eResult<bool> {
    let substitutions = [("product", product)];
    let link = session.locator_with("product_link", &substitutions)?;
    let image = session.locator_with("product_image", &substitutions)?;

    let found = session
        .driver
        .find_any(&[link, image], session.driver.timeouts().explicit())
        .await?;
    match found {
        Some((_, element)) => {
            session.driver.click(&element).await?;
            Ok(true)
        }
        None => {
            debug!("no link or image for product '{}'", product);
            Ok(false)
        }
    }
}

/// Navigate to the in-stock desktop listing
async fn open_in_stock_listing(session: &Session<'_>) -> E2eResult<()> {
    session.open_home().await?;
    session.click("shop_by_category_link").await?;
    let desktops = session.wait_for("desktops_menu_item").await?;
    session.driver.click(&desktops).await?;
    apply_filter(session, "filter_in_stock").await
}

/// The confirmation or validation message shown after "Add to Cart"
async fn add_to_cart_message(session: &Session<'_>) -> E2eResult<Observed> {
    match session
        .wait_for_any(&["notification_message", "size_error_message"])
        .await?
    {
        Some(0) => session.observe_text("notification_message").await,
        Some(_) => session.observe_text("size_error_message").await,
        None => Ok(Observed::Absent),
    }
}

fn requested_size(record: &TestCaseRecord) -> Option<&str> {
    record
        .get("size_option")
        .map(str::trim)
        .filter(|size| !size.is_empty() && *size != NOT_APPLICABLE)
}

pub(super) async fn observe_add(session: &Session<'_>, record: &TestCaseRecord) -> E2eResult<Outcome> {
    let product = record.require("product")?;
    let quantity = record.require("quantity")?;
    let stock = Stock::parse(record)?;

    match stock {
        Stock::InStock => open_in_stock_listing(session).await?,
        Stock::OutOfStock => {
            session.open_home().await?;
            let category = session.profile.require_value("out_of_stock_category")?;
            let image = session.locator_with("category_image", &[("category", category)])?;
            let element = session.driver.wait_for(&image).await?;
            session.driver.click(&element).await?;
            apply_filter(session, "filter_out_of_stock").await?;
        }
    }
    let mut outcome = Outcome::new();
    if !open_product(session, product).await? {
        // Nothing to add: no size picker, no message
        if stock == Stock::InStock && requested_size(record).is_some() {
            outcome.set("size_selector", Observed::Absent);
        }
        outcome.set("message", Observed::Absent);
        return Ok(outcome);
    }

    match stock {
        Stock::InStock => {
            if let Some(size) = requested_size(record) {
                let label = session
                    .profile
                    .value(&format!("size_label.{}", size))
                    .unwrap_or(size);
                let observed = match session.driver.probe(&session.locator("size_dropdown")?).await? {
                    Lookup::Found(dropdown) => {
                        session.driver.select_option(&dropdown, label).await?;
                        Observed::present(label)
                    }
                    Lookup::NotFound => Observed::Absent,
                };
                outcome.set("size_selector", observed);
            }

            session.fill("quantity_input", quantity).await?;
            session.click("add_to_cart_button").await?;
            outcome.set("message", add_to_cart_message(session).await?);
        }
        Stock::OutOfStock => {
            if let Lookup::Found(input) = session.driver.probe(&session.locator("quantity_input")?).await? {
                session.driver.clear(&input).await?;
                if !quantity.is_empty() {
                    session.driver.type_text(&input, quantity).await?;
                }
            }
            // The button itself carries the stock label
            outcome.set("message", session.observe_text("add_to_cart_button").await?);
        }
    }
    Ok(outcome)
}

pub(super) fn expect_add(record: &TestCaseRecord) -> E2eResult<Expectation> {
    let mut expectation = Expectation::new().field(
        "message",
        Expected::from_cell(record.require("expected_message")?),
        FieldRule::exact(),
    );
    if Stock::parse(record)? == Stock::InStock && requested_size(record).is_some() {
        expectation.push("size_selector", Expected::Present, FieldRule::exact());
    }
    Ok(expectation)
}

/// Click the first remove button until none are left
async fn clear_cart(session: &Session<'_>) -> E2eResult<()> {
    session.open_path(session.profile.require_value("cart_path")?).await?;
    for _ in 0..MAX_CLEAR_CLICKS {
        if !remove_first_row(session).await? {
            return Ok(());
        }
    }
    warn!("cart still has rows after {} removals", MAX_CLEAR_CLICKS);
    Ok(())
}

/// Click the first remove button; false when there is none
async fn remove_first_row(session: &Session<'_>) -> E2eResult<bool> {
    let buttons = session.driver.find_all(&session.locator("cart_remove_button")?).await?;
    let Some(button) = buttons.first() else {
        return Ok(false);
    };
    session.driver.click(button).await?;
    let timeout = session.driver.timeouts().stale();
    session.driver.wait_until_stale(button, timeout).await;
    Ok(true)
}

async fn add_product(session: &Session<'_>, product: &str, quantity: u32) -> E2eResult<()> {
    open_in_stock_listing(session).await?;
    if !open_product(session, product).await? {
        return Err(E2eError::ElementNotFound(format!(
            "cart seed product '{}' is not in the in-stock listing",
            product
        )));
    }

    if let Lookup::Found(input) = session.driver.probe(&session.locator("quantity_input")?).await? {
        session.driver.clear(&input).await?;
        session.driver.type_text(&input, &quantity.to_string()).await?;
    }
    session.click("add_to_cart_button").await?;
    if let Observed::Present(message) = add_to_cart_message(session).await? {
        debug!("added {} x {}: {}", quantity, product, message);
    }
    Ok(())
}

pub(super) async fn observe_remove(session: &Session<'_>, record: &TestCaseRecord) -> E2eResult<Outcome> {
    let initial = record.count("initial_items")?;
    let clicks = record.count("remove_clicks")?;

    let seeds = &session.profile.cart_seed;
    if initial > seeds.len() {
        return Err(E2eError::invalid_field(
            "initial_items",
            record.require("initial_items")?,
            format!("profile '{}' seeds at most {} products", session.profile.name, seeds.len()),
        ));
    }

    clear_cart(session).await?;
    for seed in &seeds[..initial] {
        add_product(session, &seed.product, seed.quantity).await?;
    }

    session.open_path(session.profile.require_value("cart_path")?).await?;
    for click in 0..clicks {
        if !remove_first_row(session).await? {
            debug!("no remove button left after {} click(s)", click);
            break;
        }
    }

    Ok(Outcome::new()
        .with(
            "cart_rows",
            Observed::present(session.count("cart_rows").await?.to_string()),
        )
        .with("empty_message", session.observe_text("empty_cart_message").await?)
        .with("continue_link", session.observe_presence("continue_link").await?))
}

pub(super) fn expect_remove(record: &TestCaseRecord, profile: &SiteProfile) -> E2eResult<Expectation> {
    let rows = record.count("expected_items_after")?;
    let empty_text = profile.require_value("empty_cart_message")?.to_string();

    let expectation = Expectation::new().field("cart_rows", Expected::Value(rows.to_string()), FieldRule::exact());
    Ok(if yes_no(record, "expect_empty_message")? {
        expectation
            .field("empty_message", Expected::Value(empty_text), FieldRule::exact())
            .field("continue_link", Expected::Present, FieldRule::exact())
    } else {
        expectation.field("empty_message", Expected::Not(empty_text), FieldRule::exact())
    })
}
