//! Loading suites from disk: config, CSV data and external profiles

use std::fs;
use std::path::Path;

use storefront_e2e::{preflight, E2eError, HarnessConfig, ScenarioKind, SiteProfile};

const PROFILE_JSON: &str = r##"{
  "name": "local-shop",
  "base_url": "http://localhost:8080/",
  "timeouts": { "explicit_ms": 2000 },
  "locators": {
    "search_input": { "strategy": "name", "selector": "search" },
    "search_button": { "strategy": "css", "selector": "button.search" },
    "product_container": { "strategy": "id", "selector": "results" },
    "product_title": { "strategy": "css", "selector": ".product h4" },
    "no_product_message": { "strategy": "css", "selector": "#content > p" },
    "result_info": { "strategy": "css", "selector": ".pagination-info" }
  },
  "values": {}
}"##;

const CONFIG: &str = r#"
output_dir = "reports"

[[suite]]
name = "search"
scenario = "search"
data = "data/search.csv"
profile = "profiles/local.json"
id_column = "case"
"#;

fn write(dir: &Path, relative: &str, content: &str) {
    let path = dir.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn suite_loads_from_config_directory() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "storefront.toml", CONFIG);
    write(dir.path(), "profiles/local.json", PROFILE_JSON);
    write(
        dir.path(),
        "data/search.csv",
        "\u{feff}case , search_term,expected_contains\nS1,iPod,ipod\nS2, mac ,N/A\n",
    );

    let config = HarnessConfig::load(&dir.path().join("storefront.toml")).unwrap();
    let selected = config.select(&[]).unwrap();
    let suite_config = selected[0];
    let profile = suite_config.load_profile(dir.path()).unwrap();
    let records = suite_config.load_records(dir.path()).unwrap();

    assert_eq!(profile.name, "local-shop");
    assert_eq!(profile.timeouts.explicit_ms, 2000);
    assert_eq!(records.len(), 2);
    // Header whitespace and BOM are dropped; cell values are verbatim
    assert_eq!(records[1].get("search_term"), Some(" mac "));

    let suite = suite_config.bind(&profile, records);
    assert_eq!(suite.scenario, ScenarioKind::Search);
    assert_eq!(suite.records[0].id(suite.id_column.as_deref()), "S1");
    preflight(&suite).unwrap();
}

#[test]
fn ragged_csv_is_a_data_source_error() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "storefront.toml", CONFIG);
    write(dir.path(), "data/search.csv", "case,search_term\nS1,iPod,extra\n");

    let config = HarnessConfig::load(&dir.path().join("storefront.toml")).unwrap();
    let err = config.suites[0].load_records(dir.path()).unwrap_err();
    assert!(matches!(err, E2eError::DataSource { .. }));
    assert!(err.is_run_fatal());
}

#[test]
fn missing_data_file_is_a_data_source_error() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "storefront.toml", CONFIG);

    let config = HarnessConfig::load(&dir.path().join("storefront.toml")).unwrap();
    let err = config.suites[0].load_records(dir.path()).unwrap_err();
    assert!(err.to_string().contains("search.csv"));
    assert!(err.is_run_fatal());
}

#[test]
fn preflight_names_missing_columns_and_locators() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "profiles/local.json", PROFILE_JSON);
    let profile = SiteProfile::load("profiles/local.json", dir.path()).unwrap();

    let config: HarnessConfig = toml::from_str(
        r#"
[[suite]]
name = "filter"
scenario = "price_filter"
data = "unused.csv"
profile = "profiles/local.json"
"#,
    )
    .unwrap();
    let records =
        storefront_e2e::source::load_str("filter.csv", "min_price,expected_result\n1,pass\n").unwrap();
    let suite = config.suites[0].bind(&profile, records);

    let message = preflight(&suite).unwrap_err().to_string();
    assert!(message.contains("missing column 'max_price'"));
    assert!(message.contains("no locator 'min_price_input'"));
    assert!(message.contains("no value 'price_pattern'"));
}

#[test]
fn embedded_profile_names_resolve_without_files() {
    let dir = tempfile::tempdir().unwrap();
    let profile = SiteProfile::load("ecommerce-playground", dir.path()).unwrap();
    assert!(profile.locators.contains("search_input"));
    assert_eq!(profile.value("cart_path"), Some("index.php?route=checkout/cart"));
}

#[test]
fn bundled_suites_pass_preflight() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../..");
    let config = HarnessConfig::load(&root.join("storefront.toml")).unwrap();
    assert_eq!(config.suites.len(), ScenarioKind::ALL.len());

    for suite_config in &config.suites {
        let profile = suite_config.load_profile(&root).unwrap();
        let records = suite_config.load_records(&root).unwrap();
        assert!(!records.is_empty(), "{} has no cases", suite_config.name);
        let suite = suite_config.bind(&profile, records);
        if let Err(e) = preflight(&suite) {
            panic!("{}: {}", suite_config.name, e);
        }
    }
}
