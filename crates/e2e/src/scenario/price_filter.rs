//! Price range filter on the full catalog

use tracing::debug;

use crate::compare::{Expectation, Expected, FieldRule, Outcome};
use crate::driver::Lookup;
use crate::error::{E2eError, E2eResult};
use crate::profile::SiteProfile;
use crate::source::TestCaseRecord;

use super::{presence_or_value, Session};

pub(super) const COLUMNS: &[&str] = &["min_price", "max_price", "expected_result"];
pub(super) const OPTIONAL_COLUMNS: &[&str] = &["expected_price", "expected_pagination", "expected_message"];
pub(super) const LOCATORS: &[&str] = &[
    "search_button",
    "min_price_input",
    "max_price_input",
    "product_tile",
    "first_product_price",
    "pagination_text",
    "no_product_message",
];
pub(super) const VALUES: &[&str] = &["no_product_message", "price_pattern", "pagination_pattern"];

pub(super) async fn observe(session: &Session<'_>, record: &TestCaseRecord) -> E2eResult<Outcome> {
    let min = record.require("min_price")?;
    let max = record.require("max_price")?;

    // An empty search lists the whole catalog with the filter panel
    session.open_home().await?;
    let search = session.wait_for("search_button").await?;
    session.driver.click(&search).await?;

    session.fill("min_price_input", min).await?;
    let max_input = session.fill("max_price_input", max).await?;

    let first_tile = session.driver.probe(&session.locator("product_tile")?).await?;
    session.press_enter(&max_input).await?;
    if let Lookup::Found(tile) = first_tile {
        let timeout = session.driver.timeouts().stale();
        if !session.driver.wait_until_stale(&tile, timeout).await {
            debug!("product list did not re-render after filtering {}..{}", min, max);
        }
    }

    Ok(Outcome::new()
        .with("first_price", session.observe_text("first_product_price").await?)
        .with("pagination", session.observe_text("pagination_text").await?)
        .with("no_product_message", session.observe_text("no_product_message").await?))
}

pub(super) fn expect(record: &TestCaseRecord, profile: &SiteProfile) -> E2eResult<Expectation> {
    let price_rule = FieldRule::exact().with_pattern(profile.require_value("price_pattern")?)?;
    let pagination_rule = FieldRule::exact().with_pattern(profile.require_value("pagination_pattern")?)?;
    let pagination = presence_or_value(record.expected("expected_pagination"));

    let raw = record.require("expected_result")?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "pass" => Ok(Expectation::new()
            .field(
                "first_price",
                record
                    .get("expected_price")
                    .map(presence_or_value)
                    .unwrap_or(Expected::Present),
                price_rule,
            )
            .field("pagination", pagination, pagination_rule)
            .field(
                "no_product_message",
                Expected::from_cell(record.expected("expected_message")),
                FieldRule::exact(),
            )),
        // An invalid range must produce exactly the declared negative outcome
        "fail" => {
            let message = match record.get("expected_message") {
                Some(cell) => Expected::from_cell(cell),
                None => Expected::Value(profile.require_value("no_product_message")?.to_string()),
            };
            Ok(Expectation::new()
                .field("first_price", Expected::Absent, price_rule)
                .field("pagination", pagination, pagination_rule)
                .field("no_product_message", message, FieldRule::exact()))
        }
        _ => Err(E2eError::invalid_field(
            "expected_result",
            raw,
            "expected 'pass' or 'fail'",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::{compare, Observed};
    use crate::driver::Driver;
    use crate::scenario::ScenarioKind;
    use crate::testing::{shop_profile, Effect, FakeBrowser, FakeSite, Page};

    const PRICES: &[u32] = &[98, 122, 146, 242, 1_208];

    #[derive(Default)]
    struct FilterPanel {
        min: String,
        max: String,
        filtered: bool,
        /// When false the list keeps its DOM nodes after filtering
        rerenders: bool,
    }

    impl FilterPanel {
        fn hits(&self) -> Vec<String> {
            let min: u32 = self.min.parse().unwrap_or(0);
            let max: u32 = self.max.parse().unwrap_or(u32::MAX);
            PRICES
                .iter()
                .filter(|p| !self.filtered || (**p >= min && **p <= max))
                .map(|p| {
                    if *p >= 1000 {
                        format!("${},{:03}.00", p / 1000, p % 1000)
                    } else {
                        format!("${}.00", p)
                    }
                })
                .collect()
        }
    }

    impl FakeSite for FilterPanel {
        fn render(&mut self, url: &str) -> Page {
            let mut page = Page::default();
            page.add("#search-button", &["Search"]);
            if url.contains("search") {
                page.add("#min-price", &[""]).add("#max-price", &[""]);
                let hits = self.hits();
                if hits.is_empty() {
                    page.add("#no-product", &["There is no product that matches the search criteria."]);
                } else {
                    let prices: Vec<&str> = hits.iter().map(String::as_str).collect();
                    page.add(".product", &prices).add(".product .price", &prices);
                    let info = format!("Showing 1 to {0} of {0} (1 Pages)", hits.len());
                    page.add("#pagination", &[info.as_str()]);
                }
            }
            page
        }

        fn click(&mut self, url: &str, selector: &str, _index: usize) -> E2eResult<Effect> {
            if selector == "#search-button" {
                return Ok(Effect::Navigate(format!("{}search", url)));
            }
            Ok(Effect::None)
        }

        fn type_text(&mut self, selector: &str, text: &str) {
            match selector {
                "#min-price" => self.min.push_str(text),
                "#max-price" => self.max.push_str(text),
                _ => {}
            }
        }

        fn clear(&mut self, selector: &str) {
            match selector {
                "#min-price" => self.min.clear(),
                "#max-price" => self.max.clear(),
                _ => {}
            }
        }

        fn enter(&mut self, _url: &str, _selector: &str) -> Effect {
            self.filtered = true;
            if self.rerenders {
                Effect::Rerender
            } else {
                Effect::None
            }
        }
    }

    async fn run(record: &TestCaseRecord, rerenders: bool) -> (Outcome, Expectation) {
        let profile = shop_profile();
        let site = FilterPanel {
            rerenders,
            ..Default::default()
        };
        let driver = Driver::new(Box::new(FakeBrowser::new(site)), profile.timeouts);
        let session = Session::new(&driver, &profile);
        let outcome = ScenarioKind::PriceFilter.observe(&session, record).await.unwrap();
        let expectation = ScenarioKind::PriceFilter.expect(record, &profile).unwrap();
        (outcome, expectation)
    }

    #[tokio::test]
    async fn test_valid_range() {
        let record = TestCaseRecord::from_pairs(
            1,
            &[
                ("test_case_id", "PF_01"),
                ("min_price", "100"),
                ("max_price", "300"),
                ("expected_result", "pass"),
                ("expected_price", "$122.00"),
                ("expected_pagination", "Showing 1 to 3 of 3 (1 Pages)"),
                ("expected_message", "N/A"),
            ],
        );
        let (outcome, expectation) = run(&record, true).await;
        assert_eq!(outcome.get("first_price"), Some(&Observed::Present("$122.00".into())));
        assert!(compare(&expectation, &outcome).ok);
    }

    #[tokio::test]
    async fn test_inverted_range_only_accepts_declared_outcome() {
        let record = TestCaseRecord::from_pairs(
            2,
            &[
                ("min_price", "100"),
                ("max_price", "50"),
                ("expected_result", "fail"),
                ("expected_pagination", "N/A"),
            ],
        );
        let (outcome, expectation) = run(&record, true).await;
        assert!(compare(&expectation, &outcome).ok);

        // A page that still lists products is not an acceptable negative outcome
        let listing = Outcome::new()
            .with("first_price", Observed::present("$98.00"))
            .with("pagination", Observed::Absent)
            .with("no_product_message", Observed::Absent);
        let result = compare(&expectation, &listing);
        assert!(!result.ok);
        assert!(result.reason.unwrap().contains("first_price: expected absent"));
    }

    #[tokio::test]
    async fn test_proceeds_when_list_does_not_rerender() {
        let record = TestCaseRecord::from_pairs(
            3,
            &[
                ("min_price", "1000"),
                ("max_price", ""),
                ("expected_result", "pass"),
                ("expected_pagination", "YES"),
            ],
        );
        let (outcome, expectation) = run(&record, false).await;
        // The stale wait times out; the page still shows the pre-filter list
        assert_eq!(outcome.get("first_price"), Some(&Observed::Present("$98.00".into())));
        assert!(compare(&expectation, &outcome).ok);
    }

    #[test]
    fn test_unknown_expected_result() {
        let record = TestCaseRecord::from_pairs(
            1,
            &[("min_price", "1"), ("max_price", "2"), ("expected_result", "maybe")],
        );
        assert!(matches!(
            expect(&record, &shop_profile()),
            Err(E2eError::InvalidField { .. })
        ));
    }
}
