//! In-memory browser for unit tests
//!
//! A [`FakeSite`] renders each URL into a [`Page`] (selector -> element texts)
//! and reacts to clicks, typing and Enter. Locators are matched on their
//! selector string alone. Every render bumps a generation counter, so handles
//! from an earlier render go stale the same way real DOM nodes do.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::browser::{keys, Browser, ElementHandle, SessionFactory};
use crate::error::{E2eError, E2eResult};
use crate::locator::LocatorDescriptor;
use crate::profile::SiteProfile;

#[derive(Debug, Clone, Default)]
pub struct Page {
    elements: Vec<(String, Vec<String>)>,
}

impl Page {
    pub fn add(&mut self, selector: &str, texts: &[&str]) -> &mut Self {
        self.elements.push((
            selector.to_string(),
            texts.iter().map(|t| t.to_string()).collect(),
        ));
        self
    }

    fn texts(&self, selector: &str) -> &[String] {
        self.elements
            .iter()
            .find(|(s, _)| s == selector)
            .map(|(_, texts)| texts.as_slice())
            .unwrap_or(&[])
    }
}

/// What an interaction does to the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    Rerender,
    Navigate(String),
}

pub trait FakeSite: Send {
    fn render(&mut self, url: &str) -> Page;

    /// Called before every lookup; lets a page change while the harness polls
    fn tick(&mut self, _url: &str) -> Effect {
        Effect::None
    }

    fn click(&mut self, _url: &str, _selector: &str, _index: usize) -> E2eResult<Effect> {
        Ok(Effect::None)
    }

    fn type_text(&mut self, _selector: &str, _text: &str) {}

    fn clear(&mut self, _selector: &str) {}

    fn enter(&mut self, _url: &str, _selector: &str) -> Effect {
        Effect::None
    }

    fn select(&mut self, _selector: &str, _option: &str) -> E2eResult<()> {
        Ok(())
    }
}

struct State {
    site: Box<dyn FakeSite>,
    url: String,
    page: Page,
    generation: u64,
}

impl State {
    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::None => {}
            Effect::Rerender => self.rerender(),
            Effect::Navigate(url) => {
                self.url = url;
                self.rerender();
            }
        }
    }

    fn rerender(&mut self) {
        self.generation += 1;
        self.page = self.site.render(&self.url);
    }

    /// Selector and index of a live handle
    fn resolve(&self, element: &ElementHandle) -> E2eResult<(String, usize)> {
        let stale = || E2eError::ElementNotFound(format!("{} (stale)", element.locator));
        let mut parts = element.id.splitn(3, ':');
        let generation: u64 = parts.next().and_then(|g| g.parse().ok()).ok_or_else(stale)?;
        let index: usize = parts.next().and_then(|i| i.parse().ok()).ok_or_else(stale)?;
        let selector = parts.next().ok_or_else(stale)?.to_string();
        if generation != self.generation || index >= self.page.texts(&selector).len() {
            return Err(stale());
        }
        Ok((selector, index))
    }
}

pub struct FakeBrowser {
    state: Mutex<State>,
    quits: Arc<AtomicUsize>,
}

impl FakeBrowser {
    pub fn new(site: impl FakeSite + 'static) -> Self {
        Self::boxed(Box::new(site), Arc::new(AtomicUsize::new(0)))
    }

    fn boxed(site: Box<dyn FakeSite>, quits: Arc<AtomicUsize>) -> Self {
        Self {
            state: Mutex::new(State {
                site,
                url: "about:blank".to_string(),
                page: Page::default(),
                generation: 0,
            }),
            quits,
        }
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut State) -> E2eResult<T>) -> E2eResult<T> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| E2eError::WebDriver("fake browser poisoned".into()))?;
        f(&mut state)
    }
}

#[async_trait]
impl Browser for FakeBrowser {
    async fn goto(&self, url: &str) -> E2eResult<()> {
        self.with_state(|s| {
            s.apply(Effect::Navigate(url.to_string()));
            Ok(())
        })
    }

    async fn current_url(&self) -> E2eResult<String> {
        self.with_state(|s| Ok(s.url.clone()))
    }

    async fn find_elements(&self, locator: &LocatorDescriptor) -> E2eResult<Vec<ElementHandle>> {
        self.with_state(|s| {
            let url = s.url.clone();
            let effect = s.site.tick(&url);
            s.apply(effect);
            let count = s.page.texts(&locator.selector).len();
            Ok((0..count)
                .map(|i| {
                    ElementHandle::new(format!("{}:{}:{}", s.generation, i, locator.selector), locator)
                })
                .collect())
        })
    }

    async fn click(&self, element: &ElementHandle) -> E2eResult<()> {
        self.with_state(|s| {
            let (selector, index) = s.resolve(element)?;
            let url = s.url.clone();
            let effect = s.site.click(&url, &selector, index)?;
            s.apply(effect);
            Ok(())
        })
    }

    async fn send_keys(&self, element: &ElementHandle, text: &str) -> E2eResult<()> {
        self.with_state(|s| {
            let (selector, _) = s.resolve(element)?;
            match text.strip_suffix(keys::ENTER) {
                Some(prefix) => {
                    if !prefix.is_empty() {
                        s.site.type_text(&selector, prefix);
                    }
                    let url = s.url.clone();
                    let effect = s.site.enter(&url, &selector);
                    s.apply(effect);
                }
                None => s.site.type_text(&selector, text),
            }
            Ok(())
        })
    }

    async fn clear(&self, element: &ElementHandle) -> E2eResult<()> {
        self.with_state(|s| {
            let (selector, _) = s.resolve(element)?;
            s.site.clear(&selector);
            Ok(())
        })
    }

    async fn text(&self, element: &ElementHandle) -> E2eResult<String> {
        self.with_state(|s| {
            let (selector, index) = s.resolve(element)?;
            Ok(s.page.texts(&selector)[index].clone())
        })
    }

    async fn select_by_text(&self, element: &ElementHandle, text: &str) -> E2eResult<()> {
        self.with_state(|s| {
            let (selector, _) = s.resolve(element)?;
            s.site.select(&selector, text)
        })
    }

    async fn is_stale(&self, element: &ElementHandle) -> E2eResult<bool> {
        self.with_state(|s| Ok(s.resolve(element).is_err()))
    }

    async fn quit(&self) -> E2eResult<()> {
        self.quits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Opens a fresh [`FakeBrowser`] per session and counts opens and quits
pub struct FakeFactory {
    make: Box<dyn Fn() -> Box<dyn FakeSite> + Send + Sync>,
    pub opened: Arc<AtomicUsize>,
    pub quits: Arc<AtomicUsize>,
}

impl FakeFactory {
    pub fn new<S, F>(make: F) -> Self
    where
        S: FakeSite + 'static,
        F: Fn() -> S + Send + Sync + 'static,
    {
        Self {
            make: Box::new(move || Box::new(make()) as Box<dyn FakeSite>),
            opened: Arc::new(AtomicUsize::new(0)),
            quits: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl SessionFactory for FakeFactory {
    async fn open(&self) -> E2eResult<Box<dyn Browser>> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeBrowser::boxed((self.make)(), self.quits.clone())))
    }
}

/// Storefront profile with short CSS selectors the fake sites render
pub fn shop_profile() -> SiteProfile {
    SiteProfile::from_yaml(
        r##"
name: fake-shop
base_url: https://shop.test/
timeouts: { explicit_ms: 100, poll_ms: 5, stale_ms: 20, page_load_ms: 1000 }
locators:
  search_input: { strategy: name, selector: search }
  search_button: { strategy: css, selector: "#search-button" }
  product_container: { strategy: id, selector: product-search }
  product_title: { strategy: css, selector: ".product h4" }
  no_product_message: { strategy: css, selector: "#no-product" }
  result_info: { strategy: css, selector: "#result-info" }
  min_price_input: { strategy: css, selector: "#min-price" }
  max_price_input: { strategy: css, selector: "#max-price" }
  first_product_price: { strategy: css, selector: ".product .price" }
  pagination_text: { strategy: css, selector: "#pagination" }
  product_tile: { strategy: css, selector: ".product" }
  shop_by_category_link: { strategy: link_text, selector: Shop by Category }
  desktops_menu_item: { strategy: css, selector: "#menu-desktops" }
  filter_in_stock: { strategy: css, selector: "#filter-in-stock" }
  filter_out_of_stock: { strategy: css, selector: "#filter-out-of-stock" }
  category_image: { strategy: xpath, selector: "//img[@alt='{category}']" }
  product_link: { strategy: link_text, selector: "{product}" }
  product_image: { strategy: xpath, selector: "//img[contains(@alt, '{product}')]" }
  size_dropdown: { strategy: css, selector: "#size" }
  quantity_input: { strategy: css, selector: "#quantity" }
  add_to_cart_button: { strategy: css, selector: "#add-to-cart" }
  notification_message: { strategy: css, selector: "#notification p" }
  size_error_message: { strategy: css, selector: "#size-error" }
  product_page_title: { strategy: css, selector: h1 }
  product_page_price: { strategy: css, selector: ".product-price" }
  product_not_found: { strategy: css, selector: "#not-found" }
  cart_rows: { strategy: css, selector: "#cart tr" }
  cart_remove_button: { strategy: css, selector: "#cart .remove" }
  empty_cart_message: { strategy: css, selector: "#content p" }
  continue_link: { strategy: link_text, selector: Continue }
  my_account_dropdown: { strategy: css, selector: "#my-account" }
  login_link: { strategy: link_text, selector: Login }
  input_email: { strategy: id, selector: input-email }
  input_password_login: { strategy: id, selector: input-password }
  btn_login: { strategy: css, selector: "#login" }
  password_link: { strategy: link_text, selector: Password }
  input_new_password: { strategy: id, selector: input-new-password }
  input_confirm: { strategy: id, selector: input-confirm }
  btn_continue: { strategy: css, selector: "#continue" }
  alert_message: { strategy: css, selector: ".alert" }
  field_error: { strategy: css, selector: ".text-danger" }
values:
  no_product_message: There is no product that matches the search criteria.
  empty_cart_message: Your shopping cart is empty!
  price_pattern: '^\$\d{1,3}(,\d{3})*\.\d{2}$'
  pagination_pattern: 'Showing \d+ to \d+ of \d+ \(\d+ Pages\)'
  cart_path: cart
  product_path: product?id={product_id}
  out_of_stock_category: Desktops
  size_label.Small: Small (+$12.00)
  account_email: shopper@example.test
  account_password: secret
cart_seed:
  - { product: iPod Touch, quantity: 2 }
  - { product: Samsung SyncMaster 941BW, quantity: 3 }
"##,
    )
    .expect("fake shop profile")
}

/// Login / logout profile mirroring the embedded saucedemo layout
pub fn login_profile() -> SiteProfile {
    SiteProfile::from_yaml(
        r#"
name: fake-login
base_url: https://login.test/
timeouts: { explicit_ms: 50, poll_ms: 5, stale_ms: 20, page_load_ms: 1000 }
locators:
  username_field: { strategy: id, selector: user-name }
  password_field: { strategy: id, selector: password }
  login_button: { strategy: id, selector: login-button }
  error_message: { strategy: css, selector: "h3[data-test='error']" }
  inventory_page_marker: { strategy: css, selector: .inventory_list }
  menu_button: { strategy: id, selector: menu }
  logout_button: { strategy: id, selector: logout }
  login_page_marker: { strategy: css, selector: .login_container }
values:
  username_required: "Epic sadface: Username is required"
  password_required: "Epic sadface: Password is required"
  invalid_credentials: "Epic sadface: Username and password do not match any user in this service"
  locked_out: "Epic sadface: Sorry, this user has been locked out."
  logout_url: https://login.test/
"#,
    )
    .expect("fake login profile")
}
