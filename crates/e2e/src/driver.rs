//! Action driver adapter
//!
//! The narrow, uniform surface every scenario uses: navigation, single and
//! multiple lookups (optionally waited), typed absence via [`Lookup`], and the
//! element interactions. All waits are bounded.

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::browser::{Browser, ElementHandle};
use crate::error::{E2eError, E2eResult};
use crate::locator::LocatorDescriptor;
use crate::profile::Timeouts;

/// Result of an immediate lookup: absence is a value, not an error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(ElementHandle),
    NotFound,
}

impl Lookup {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    pub fn into_option(self) -> Option<ElementHandle> {
        match self {
            Lookup::Found(handle) => Some(handle),
            Lookup::NotFound => None,
        }
    }
}

pub struct Driver {
    browser: Box<dyn Browser>,
    timeouts: Timeouts,
}

impl Driver {
    pub fn new(browser: Box<dyn Browser>, timeouts: Timeouts) -> Self {
        Self { browser, timeouts }
    }

    pub fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    pub async fn navigate(&self, url: &str) -> E2eResult<()> {
        debug!("navigate {}", url);
        self.browser.goto(url).await
    }

    pub async fn current_url(&self) -> E2eResult<String> {
        self.browser.current_url().await
    }

    /// Single-element lookup.
    ///
    /// Without a timeout this checks once and fails immediately when absent;
    /// with one it polls until the element appears or the timeout elapses.
    pub async fn find(
        &self,
        locator: &LocatorDescriptor,
        timeout: Option<Duration>,
    ) -> E2eResult<ElementHandle> {
        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            if let Lookup::Found(handle) = self.probe(locator).await? {
                return Ok(handle);
            }
            match deadline {
                Some(deadline) if Instant::now() < deadline => {
                    sleep(self.timeouts.poll_interval()).await
                }
                _ => return Err(E2eError::ElementNotFound(locator.to_string())),
            }
        }
    }

    /// Wait using the profile's explicit timeout
    pub async fn wait_for(&self, locator: &LocatorDescriptor) -> E2eResult<ElementHandle> {
        self.find(locator, Some(self.timeouts.explicit())).await
    }

    /// Immediate lookup that reports absence as [`Lookup::NotFound`]
    pub async fn probe(&self, locator: &LocatorDescriptor) -> E2eResult<Lookup> {
        match self.browser.find_elements(locator).await {
            Ok(mut found) if !found.is_empty() => Ok(Lookup::Found(found.swap_remove(0))),
            Ok(_) | Err(E2eError::ElementNotFound(_)) => Ok(Lookup::NotFound),
            Err(e) => Err(e),
        }
    }

    /// Every match, in document order; never fails on absence
    pub async fn find_all(&self, locator: &LocatorDescriptor) -> E2eResult<Vec<ElementHandle>> {
        match self.browser.find_elements(locator).await {
            Ok(found) => Ok(found),
            Err(E2eError::ElementNotFound(_)) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    /// Poll several locators until one matches; returns its index and handle
    pub async fn find_any(
        &self,
        locators: &[LocatorDescriptor],
        timeout: Duration,
    ) -> E2eResult<Option<(usize, ElementHandle)>> {
        let deadline = Instant::now() + timeout;
        loop {
            for (index, locator) in locators.iter().enumerate() {
                if let Lookup::Found(handle) = self.probe(locator).await? {
                    return Ok(Some((index, handle)));
                }
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            sleep(self.timeouts.poll_interval()).await;
        }
    }

    pub async fn click(&self, element: &ElementHandle) -> E2eResult<()> {
        debug!("click {}", element.locator);
        self.browser.click(element).await
    }

    pub async fn type_text(&self, element: &ElementHandle, text: &str) -> E2eResult<()> {
        debug!("type into {}", element.locator);
        self.browser.send_keys(element, text).await
    }

    pub async fn clear(&self, element: &ElementHandle) -> E2eResult<()> {
        self.browser.clear(element).await
    }

    pub async fn read_text(&self, element: &ElementHandle) -> E2eResult<String> {
        self.browser.text(element).await
    }

    pub async fn select_option(&self, element: &ElementHandle, visible_text: &str) -> E2eResult<()> {
        debug!("select '{}' in {}", visible_text, element.locator);
        self.browser.select_by_text(element, visible_text).await
    }

    /// Wait for an element to detach (a list re-rendering after a filter).
    ///
    /// Returns `false` on timeout; callers proceed anyway.
    pub async fn wait_until_stale(&self, element: &ElementHandle, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            match self.browser.is_stale(element).await {
                Ok(true) => return true,
                Ok(false) => {}
                Err(e) => {
                    warn!("Staleness check on {} failed: {}", element.locator, e);
                    return false;
                }
            }
            if Instant::now() >= deadline {
                warn!(
                    "{} did not re-render within {} ms, continuing",
                    element.locator,
                    timeout.as_millis()
                );
                return false;
            }
            sleep(self.timeouts.poll_interval()).await;
        }
    }

    pub async fn quit(&self) -> E2eResult<()> {
        self.browser.quit().await
    }
}
