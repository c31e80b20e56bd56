//! W3C WebDriver client
//!
//! Talks the WebDriver wire protocol over HTTP to chromedriver, geckodriver
//! or a Selenium Grid endpoint. One [`WebDriverSession`] is one browser.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::browser::{Browser, ElementHandle, SessionFactory};
use crate::error::{E2eError, E2eResult};
use crate::locator::{LocatorDescriptor, Strategy};

/// Key under which W3C drivers return element references
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    #[default]
    Chrome,
    Firefox,
    Edge,
}

impl BrowserKind {
    fn as_str(&self) -> &'static str {
        match self {
            BrowserKind::Chrome => "chrome",
            BrowserKind::Firefox => "firefox",
            BrowserKind::Edge => "MicrosoftEdge",
        }
    }
}

/// Configuration for WebDriver sessions
#[derive(Debug, Clone)]
pub struct WebDriverConfig {
    /// Remote end, e.g. `http://127.0.0.1:9515` for chromedriver
    pub url: String,
    pub browser: BrowserKind,
    pub headless: bool,
    pub window_width: u32,
    pub window_height: u32,
    pub page_load_timeout: Duration,
    /// Timeout for a single HTTP round trip to the driver
    pub request_timeout: Duration,
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:9515".to_string(),
            browser: BrowserKind::Chrome,
            headless: true,
            window_width: 1280,
            window_height: 720,
            page_load_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl WebDriverConfig {
    /// Capabilities payload for `POST /session`
    pub fn capabilities(&self) -> Value {
        let size = format!("--window-size={},{}", self.window_width, self.window_height);
        let mut always_match = json!({
            "browserName": self.browser.as_str(),
            "timeouts": { "pageLoad": self.page_load_timeout.as_millis() as u64 },
        });

        match self.browser {
            BrowserKind::Chrome | BrowserKind::Edge => {
                let mut args = vec![
                    size,
                    "--disable-notifications".to_string(),
                    "--disable-popup-blocking".to_string(),
                ];
                if self.headless {
                    args.push("--headless=new".to_string());
                }
                let key = if self.browser == BrowserKind::Chrome {
                    "goog:chromeOptions"
                } else {
                    "ms:edgeOptions"
                };
                always_match[key] = json!({
                    "args": args,
                    "excludeSwitches": ["enable-automation"],
                    "prefs": {
                        "credentials_enable_service": false,
                        "profile.password_manager_enabled": false,
                    },
                });
            }
            BrowserKind::Firefox => {
                let mut args = vec![
                    format!("--width={}", self.window_width),
                    format!("--height={}", self.window_height),
                ];
                if self.headless {
                    args.push("-headless".to_string());
                }
                always_match["moz:firefoxOptions"] = json!({ "args": args });
            }
        }

        json!({ "capabilities": { "alwaysMatch": always_match } })
    }
}

/// Opens a new WebDriver session per call
pub struct WebDriverFactory {
    config: WebDriverConfig,
    client: reqwest::Client,
}

impl WebDriverFactory {
    pub fn new(config: WebDriverConfig) -> E2eResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { config, client })
    }

    /// Check the remote end is up before running a suite
    pub async fn status(&self) -> E2eResult<bool> {
        let url = format!("{}/status", self.config.url.trim_end_matches('/'));
        let body: Value = self.client.get(&url).send().await?.json().await?;
        Ok(body["value"]["ready"].as_bool().unwrap_or(false))
    }
}

#[async_trait]
impl SessionFactory for WebDriverFactory {
    async fn open(&self) -> E2eResult<Box<dyn Browser>> {
        let url = format!("{}/session", self.config.url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(&self.config.capabilities())
            .send()
            .await?;
        let value = unwrap_response(response).await?;

        let session_id = value["sessionId"]
            .as_str()
            .ok_or_else(|| E2eError::WebDriver("new session response has no sessionId".into()))?;

        info!("Opened {} session {}", self.config.browser.as_str(), session_id);

        Ok(Box::new(WebDriverSession {
            client: self.client.clone(),
            session_url: format!("{}/{}", url, session_id),
        }))
    }
}

/// One W3C WebDriver session
pub struct WebDriverSession {
    client: reqwest::Client,
    session_url: String,
}

impl WebDriverSession {
    async fn command(&self, method: Method, path: &str, body: Option<Value>) -> E2eResult<Value> {
        let url = format!("{}{}", self.session_url, path);
        debug!("{} {}", method, url);

        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;
        unwrap_response(response).await
    }

    async fn element_command(
        &self,
        method: Method,
        element: &ElementHandle,
        action: &str,
        body: Option<Value>,
    ) -> E2eResult<Value> {
        let path = format!("/element/{}{}", element.id, action);
        self.command(method, &path, body)
            .await
            .map_err(|e| describe_element_error(e, element))
    }
}

#[async_trait]
impl Browser for WebDriverSession {
    async fn goto(&self, url: &str) -> E2eResult<()> {
        self.command(Method::POST, "/url", Some(json!({ "url": url })))
            .await?;
        Ok(())
    }

    async fn current_url(&self) -> E2eResult<String> {
        let value = self.command(Method::GET, "/url", None).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn find_elements(&self, locator: &LocatorDescriptor) -> E2eResult<Vec<ElementHandle>> {
        let (using, value) = wire_locator(locator);
        let found = self
            .command(
                Method::POST,
                "/elements",
                Some(json!({ "using": using, "value": value })),
            )
            .await?;
        Ok(element_refs(&found)
            .into_iter()
            .map(|id| ElementHandle::new(id, locator))
            .collect())
    }

    async fn click(&self, element: &ElementHandle) -> E2eResult<()> {
        self.element_command(Method::POST, element, "/click", Some(json!({})))
            .await?;
        Ok(())
    }

    async fn send_keys(&self, element: &ElementHandle, text: &str) -> E2eResult<()> {
        self.element_command(Method::POST, element, "/value", Some(json!({ "text": text })))
            .await?;
        Ok(())
    }

    async fn clear(&self, element: &ElementHandle) -> E2eResult<()> {
        self.element_command(Method::POST, element, "/clear", Some(json!({})))
            .await?;
        Ok(())
    }

    async fn text(&self, element: &ElementHandle) -> E2eResult<String> {
        let value = self
            .element_command(Method::GET, element, "/text", None)
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn select_by_text(&self, element: &ElementHandle, text: &str) -> E2eResult<()> {
        let xpath = format!(".//option[normalize-space(.)={}]", xpath_literal(text.trim()));
        let options = self
            .element_command(
                Method::POST,
                element,
                "/elements",
                Some(json!({ "using": "xpath", "value": xpath })),
            )
            .await?;

        let option = element_refs(&options).into_iter().next().ok_or_else(|| {
            E2eError::ElementNotFound(format!("option '{}' in {}", text, element.locator))
        })?;
        let option = ElementHandle {
            id: option,
            locator: format!("{} option '{}'", element.locator, text),
        };
        self.click(&option).await
    }

    async fn is_stale(&self, element: &ElementHandle) -> E2eResult<bool> {
        match self.element_command(Method::GET, element, "/name", None).await {
            Ok(_) => Ok(false),
            Err(E2eError::ElementNotFound(_)) => Ok(true),
            Err(e) => Err(e),
        }
    }

    async fn quit(&self) -> E2eResult<()> {
        debug!("Closing session {}", self.session_url);
        if let Err(e) = self.command(Method::DELETE, "", None).await {
            warn!("Failed to close session cleanly: {}", e);
        }
        Ok(())
    }
}

/// Map a locator onto the W3C `using`/`value` pair.
/// WebDriver has no id or name strategies, so those become attribute selectors.
pub fn wire_locator(locator: &LocatorDescriptor) -> (&'static str, String) {
    match locator.strategy {
        Strategy::Css => ("css selector", locator.selector.clone()),
        Strategy::Xpath => ("xpath", locator.selector.clone()),
        Strategy::LinkText => ("link text", locator.selector.clone()),
        Strategy::Id => ("css selector", format!("[id=\"{}\"]", css_escape(&locator.selector))),
        Strategy::Name => ("css selector", format!("[name=\"{}\"]", css_escape(&locator.selector))),
    }
}

fn css_escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Quote a string as an XPath 1.0 literal
fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        format!("'{}'", value)
    } else if !value.contains('"') {
        format!("\"{}\"", value)
    } else {
        let parts: Vec<String> = value.split('\'').map(|p| format!("'{}'", p)).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

fn element_refs(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item[ELEMENT_KEY].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

async fn unwrap_response(response: reqwest::Response) -> E2eResult<Value> {
    let status = response.status();
    let body: Value = response.json().await?;
    let value = body.get("value").cloned().unwrap_or(Value::Null);

    if status.is_success() && value.get("error").is_none() {
        return Ok(value);
    }
    Err(protocol_error(&value))
}

/// Translate a W3C error payload into the harness taxonomy
fn protocol_error(value: &Value) -> E2eError {
    let code = value["error"].as_str().unwrap_or("unknown error");
    let message = value["message"].as_str().unwrap_or_default();

    match code {
        "no such element" | "stale element reference" => {
            E2eError::ElementNotFound(format!("{}: {}", code, message))
        }
        "element not interactable" | "element click intercepted" | "invalid element state" => {
            E2eError::InteractionError(format!("{}: {}", code, message))
        }
        _ => E2eError::WebDriver(format!("{}: {}", code, message)),
    }
}

fn describe_element_error(error: E2eError, element: &ElementHandle) -> E2eError {
    match error {
        E2eError::ElementNotFound(reason) => {
            E2eError::ElementNotFound(format!("{} ({})", element.locator, reason))
        }
        E2eError::InteractionError(reason) => {
            E2eError::InteractionError(format!("{} ({})", element.locator, reason))
        }
        other => other,
    }
}
