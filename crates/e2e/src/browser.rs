//! The browser capability the harness drives
//!
//! [`Browser`] is the opaque automation surface (navigate, find, click, type,
//! read text). The WebDriver client implements it for real browsers; nothing
//! outside [`crate::driver`] calls it directly.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::E2eResult;
use crate::locator::LocatorDescriptor;

/// Special keys understood by `send_keys`
pub mod keys {
    pub const ENTER: &str = "\u{E007}";
}

/// Opaque reference to an element in the current page
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle {
    pub id: String,
    /// Locator the element was found with, kept for error messages
    pub locator: String,
}

impl ElementHandle {
    pub fn new(id: impl Into<String>, locator: &LocatorDescriptor) -> Self {
        Self {
            id: id.into(),
            locator: locator.to_string(),
        }
    }
}

/// One live browser session
#[async_trait]
pub trait Browser: Send + Sync {
    /// Load a URL and wait for the browser's notion of "loaded"
    async fn goto(&self, url: &str) -> E2eResult<()>;

    async fn current_url(&self) -> E2eResult<String>;

    /// All elements matching the locator, in document order; empty when none match
    async fn find_elements(&self, locator: &LocatorDescriptor) -> E2eResult<Vec<ElementHandle>>;

    async fn click(&self, element: &ElementHandle) -> E2eResult<()>;

    async fn send_keys(&self, element: &ElementHandle, text: &str) -> E2eResult<()>;

    async fn clear(&self, element: &ElementHandle) -> E2eResult<()>;

    /// Rendered text of the element
    async fn text(&self, element: &ElementHandle) -> E2eResult<String>;

    /// Pick the `<option>` of a `<select>` whose visible text matches
    async fn select_by_text(&self, element: &ElementHandle, text: &str) -> E2eResult<()>;

    /// Whether the element has been detached from the document
    async fn is_stale(&self, element: &ElementHandle) -> E2eResult<bool>;

    /// End the session
    async fn quit(&self) -> E2eResult<()>;
}

/// Opens browser sessions for the runner
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> E2eResult<Box<dyn Browser>>;
}
