//! Locator registry: symbolic element keys mapped to selector descriptors

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{E2eError, E2eResult};

/// How a selector string is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Id,
    #[serde(alias = "css_selector")]
    Css,
    Xpath,
    LinkText,
    Name,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Id => "id",
            Strategy::Css => "css",
            Strategy::Xpath => "xpath",
            Strategy::LinkText => "link_text",
            Strategy::Name => "name",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A strategy + selector pair, possibly with `{placeholder}` fields
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocatorDescriptor {
    #[serde(alias = "by")]
    pub strategy: Strategy,
    #[serde(alias = "value")]
    pub selector: String,
}

impl LocatorDescriptor {
    pub fn new(strategy: Strategy, selector: impl Into<String>) -> Self {
        Self {
            strategy,
            selector: selector.into(),
        }
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Self::new(Strategy::Css, selector)
    }

    pub fn xpath(selector: impl Into<String>) -> Self {
        Self::new(Strategy::Xpath, selector)
    }

    pub fn link_text(text: impl Into<String>) -> Self {
        Self::new(Strategy::LinkText, text)
    }

    /// Names of the `{placeholder}` fields in the selector, in order
    pub fn placeholders(&self) -> Vec<String> {
        let mut names = Vec::new();
        for segment in parse_template(&self.selector) {
            if let Segment::Placeholder(name) = segment {
                if !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }
        }
        names
    }

    fn substitute(&self, key: &str, substitutions: &[(&str, &str)]) -> E2eResult<Self> {
        let selector = fill_template(key, &self.selector, substitutions)?;
        Ok(Self::new(self.strategy, selector))
    }
}

impl fmt::Display for LocatorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.strategy, self.selector)
    }
}

/// Replace every `{name}` in `template`; `key` names the template in errors.
pub(crate) fn fill_template(
    key: &str,
    template: &str,
    substitutions: &[(&str, &str)],
) -> E2eResult<String> {
    let mut filled = String::with_capacity(template.len());
    for segment in parse_template(template) {
        match segment {
            Segment::Literal(text) => filled.push_str(text),
            Segment::Brace(c) => filled.push(c),
            Segment::Placeholder(name) => {
                let value = substitutions
                    .iter()
                    .find(|(k, _)| *k == name)
                    .map(|(_, v)| *v)
                    .ok_or_else(|| E2eError::MissingSubstitution {
                        key: key.to_string(),
                        placeholder: name.to_string(),
                    })?;
                filled.push_str(value);
            }
        }
    }
    Ok(filled)
}

enum Segment<'a> {
    Literal(&'a str),
    Brace(char),
    Placeholder(&'a str),
}

/// Split a selector into literals and `{name}` placeholders.
/// `{{` and `}}` are literal braces; an unclosed `{` is kept as text.
fn parse_template(template: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let bytes = template.as_bytes();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'{' | b'}' if bytes.get(i + 1) == Some(&bytes[i]) => {
                if start < i {
                    segments.push(Segment::Literal(&template[start..i]));
                }
                segments.push(Segment::Brace(bytes[i] as char));
                i += 2;
                start = i;
            }
            b'{' => match template[i + 1..].find('}') {
                Some(len) if is_placeholder_name(&template[i + 1..i + 1 + len]) => {
                    if start < i {
                        segments.push(Segment::Literal(&template[start..i]));
                    }
                    segments.push(Segment::Placeholder(&template[i + 1..i + 1 + len]));
                    i += len + 2;
                    start = i;
                }
                _ => i += 1,
            },
            _ => i += 1,
        }
    }

    if start < template.len() {
        segments.push(Segment::Literal(&template[start..]));
    }
    segments
}

fn is_placeholder_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Immutable key -> descriptor map, shared read-only for the whole run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocatorRegistry {
    locators: BTreeMap<String, LocatorDescriptor>,
}

impl LocatorRegistry {
    pub fn new(locators: BTreeMap<String, LocatorDescriptor>) -> Self {
        Self { locators }
    }

    /// Resolve a key without substitutions
    pub fn get(&self, key: &str) -> E2eResult<LocatorDescriptor> {
        self.resolve(key, &[])
    }

    /// Resolve a key, filling `{placeholder}` fields from `substitutions`
    pub fn resolve(&self, key: &str, substitutions: &[(&str, &str)]) -> E2eResult<LocatorDescriptor> {
        let descriptor = self
            .locators
            .get(key)
            .ok_or_else(|| E2eError::UnknownLocatorKey(key.to_string()))?;
        descriptor.substitute(key, substitutions)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.locators.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.locators.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LocatorDescriptor)> {
        self.locators.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.locators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locators.is_empty()
    }
}

impl FromIterator<(String, LocatorDescriptor)> for LocatorRegistry {
    fn from_iter<I: IntoIterator<Item = (String, LocatorDescriptor)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
