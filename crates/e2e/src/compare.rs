//! Outcome comparator
//!
//! Scenarios produce an [`Outcome`] (what the page showed) and an
//! [`Expectation`] (what the test data declared). [`compare`] checks every
//! declared field and reports all mismatches at once.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::E2eResult;
use crate::source::NOT_APPLICABLE;

/// Collapse every run of whitespace to one space and trim the ends
pub fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The observed state of one element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "text", rename_all = "snake_case")]
pub enum Observed {
    Present(String),
    Absent,
}

impl Observed {
    pub fn present(text: impl AsRef<str>) -> Self {
        Observed::Present(normalize(text.as_ref()))
    }

    pub fn from_option(text: Option<String>) -> Self {
        text.map(Observed::present).unwrap_or(Observed::Absent)
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Observed::Present(_))
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Observed::Present(text) => Some(text),
            Observed::Absent => None,
        }
    }
}

/// Named observations from one scenario run, in capture order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Outcome {
    fields: Vec<(String, Observed)>,
}

impl Outcome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: &str, observed: Observed) -> Self {
        self.set(field, observed);
        self
    }

    /// Record an observation, replacing an earlier one for the same field
    pub fn set(&mut self, field: &str, observed: Observed) {
        match self.fields.iter_mut().find(|(name, _)| name == field) {
            Some((_, slot)) => *slot = observed,
            None => self.fields.push((field.to_string(), observed)),
        }
    }

    pub fn get(&self, field: &str) -> Option<&Observed> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, observed)| observed)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Observed)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// What a field must look like
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expected {
    /// The element must not be on the page ("N/A")
    Absent,
    /// Any text, subject to the rule's pattern
    Present,
    Value(String),
    /// Anything but this text; absence also satisfies it
    Not(String),
}

impl Expected {
    /// Interpret a data cell: the literal "N/A" means absent, anything else
    /// (including the empty string) is an expected value.
    pub fn from_cell(cell: &str) -> Self {
        if cell == NOT_APPLICABLE {
            Expected::Absent
        } else {
            Expected::Value(cell.to_string())
        }
    }

    fn describe(&self) -> String {
        match self {
            Expected::Absent => "absent".to_string(),
            Expected::Present => "present".to_string(),
            Expected::Value(value) => format!("'{}'", normalize(value)),
            Expected::Not(value) => format!("anything but '{}'", normalize(value)),
        }
    }
}

/// How observed text is matched against an expected value
#[derive(Debug, Clone, Default)]
pub struct FieldRule {
    pub ignore_case: bool,
    pub contains: bool,
    pub pattern: Option<Regex>,
}

impl FieldRule {
    pub fn exact() -> Self {
        Self::default()
    }

    /// Case-sensitive substring match
    pub fn substring() -> Self {
        Self {
            contains: true,
            ..Self::default()
        }
    }

    /// Case-insensitive substring match
    pub fn contains_ignore_case() -> Self {
        Self {
            ignore_case: true,
            contains: true,
            pattern: None,
        }
    }

    pub fn ignore_case(mut self) -> Self {
        self.ignore_case = true;
        self
    }

    /// Also require the observed text to match a regular expression
    pub fn with_pattern(mut self, pattern: &str) -> E2eResult<Self> {
        self.pattern = Some(Regex::new(pattern)?);
        Ok(self)
    }

    fn matches(&self, expected: &str, actual: &str) -> bool {
        let (expected, actual) = if self.ignore_case {
            (normalize(expected).to_lowercase(), normalize(actual).to_lowercase())
        } else {
            (normalize(expected), normalize(actual))
        };
        if self.contains {
            actual.contains(&expected)
        } else {
            actual == expected
        }
    }

    fn shape_error(&self, actual: &str) -> Option<String> {
        let pattern = self.pattern.as_ref()?;
        if pattern.is_match(&normalize(actual)) {
            None
        } else {
            Some(format!("'{}' does not match /{}/", normalize(actual), pattern))
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldExpectation {
    pub field: String,
    pub expected: Expected,
    pub rule: FieldRule,
}

/// Declared expectations for one test case, in check order
#[derive(Debug, Clone, Default)]
pub struct Expectation {
    fields: Vec<FieldExpectation>,
}

impl Expectation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, field: &str, expected: Expected, rule: FieldRule) -> Self {
        self.push(field, expected, rule);
        self
    }

    pub fn push(&mut self, field: &str, expected: Expected, rule: FieldRule) {
        self.fields.push(FieldExpectation {
            field: field.to_string(),
            expected,
            rule,
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldExpectation> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub ok: bool,
    pub reason: Option<String>,
}

impl ComparisonResult {
    pub fn pass() -> Self {
        Self {
            ok: true,
            reason: None,
        }
    }

    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            reason: Some(reason.into()),
        }
    }
}

/// Check every expected field against the outcome.
///
/// A field the scenario never observed counts as absent.
pub fn compare(expectation: &Expectation, outcome: &Outcome) -> ComparisonResult {
    let mismatches: Vec<String> = expectation
        .iter()
        .filter_map(|fe| {
            let observed = outcome.get(&fe.field).unwrap_or(&Observed::Absent);
            check_field(fe, observed).map(|reason| format!("{}: {}", fe.field, reason))
        })
        .collect();

    if mismatches.is_empty() {
        ComparisonResult::pass()
    } else {
        ComparisonResult::fail(mismatches.join("; "))
    }
}

fn check_field(fe: &FieldExpectation, observed: &Observed) -> Option<String> {
    match (&fe.expected, observed) {
        (Expected::Absent, Observed::Absent) => None,
        (Expected::Absent, Observed::Present(text)) => {
            Some(format!("expected absent but found '{}'", normalize(text)))
        }
        (Expected::Not(_), Observed::Absent) => None,
        (expected, Observed::Absent) => Some(format!(
            "expected {} but element was absent",
            expected.describe()
        )),
        (Expected::Present, Observed::Present(text)) => fe.rule.shape_error(text),
        (Expected::Value(value), Observed::Present(text)) => {
            if !fe.rule.matches(value, text) {
                let wanted = if fe.rule.contains {
                    format!("text containing '{}'", normalize(value))
                } else {
                    format!("'{}'", normalize(value))
                };
                Some(format!("expected {} but got '{}'", wanted, normalize(text)))
            } else {
                fe.rule.shape_error(text)
            }
        }
        (Expected::Not(value), Observed::Present(text)) => {
            if fe.rule.matches(value, text) {
                Some(format!("expected anything but '{}'", normalize(value)))
            } else {
                None
            }
        }
    }
}
