//! Browser steps and the scenarios they are grouped into

use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

use crate::locator::Locator;

/// An ordered list of steps executed in one browser session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scenario {
    /// Test name, used for logs and failure screenshots
    pub name: String,

    /// Steps to execute in order
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    pub fn push(&mut self, step: Step) -> &mut Self {
        self.steps.push(step);
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Record a value read back from the page; `prefix` only aids debugging
    pub fn capture<T>(&mut self, prefix: &str, locator: Locator, read: Read) -> Capture<T> {
        let key = format!("{}#{}", prefix, self.steps.len());
        self.steps.push(Step::Capture {
            key: key.clone(),
            locator,
            read,
        });
        Capture {
            key,
            _value: PhantomData,
        }
    }
}

/// Typed handle to a value a [`Step::Capture`] will report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture<T> {
    key: String,
    _value: PhantomData<fn() -> T>,
}

impl<T> Capture<T> {
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// A single step in a scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Open an absolute URL
    Goto { url: String },

    /// Wait until the page URL matches, then for the given load state
    WaitForUrl {
        pattern: UrlPattern,
        #[serde(default)]
        wait_until: LoadState,
    },

    /// Assert the current URL matches
    ExpectUrl { pattern: UrlPattern },

    /// Wait for an element to reach a state
    WaitFor {
        locator: Locator,
        #[serde(default)]
        state: WaitState,
    },

    /// Fill an input field
    Fill { locator: Locator, value: String },

    /// Click an element
    Click { locator: Locator },

    /// Retrying web-first assertion on an element
    Expect {
        locator: Locator,
        expectation: Expectation,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Read something back without asserting on it
    Capture {
        key: String,
        locator: Locator,
        read: Read,
    },

    /// Log a message (for debugging)
    Log { message: String },
}

impl Step {
    pub fn name(&self) -> String {
        match self {
            Step::Goto { url } => format!("goto:{}", url),
            Step::WaitForUrl { pattern, .. } => format!("wait_for_url:{}", pattern),
            Step::ExpectUrl { pattern } => format!("expect_url:{}", pattern),
            Step::WaitFor { locator, state } => format!("wait_for:{}:{:?}", locator, state),
            Step::Fill { locator, .. } => format!("fill:{}", locator),
            Step::Click { locator } => format!("click:{}", locator),
            Step::Expect {
                locator,
                expectation,
                ..
            } => format!("expect:{}:{}", locator, expectation.describe()),
            Step::Capture { key, .. } => format!("capture:{}", key),
            Step::Log { message } => format!("log:{}", message.chars().take(30).collect::<String>()),
        }
    }
}

/// URL matcher for navigation waits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlPattern {
    /// Playwright glob, e.g. `**/Energy/Buy`
    Glob(String),
    /// JavaScript regular expression source
    Regex(String),
}

impl UrlPattern {
    /// Any URL ending in `fragment`
    pub fn ends_with(fragment: &str) -> Self {
        UrlPattern::Glob(format!("**{}", fragment))
    }

    /// Any URL containing `fragment` literally
    pub fn contains(fragment: &str) -> Self {
        UrlPattern::Regex(regex::escape(fragment))
    }
}

impl std::fmt::Display for UrlPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UrlPattern::Glob(g) => write!(f, "{}", g),
            UrlPattern::Regex(r) => write!(f, "/{}/", r),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadState {
    #[default]
    Load,
    DomContentLoaded,
    NetworkIdle,
}

impl LoadState {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            LoadState::Load => "load",
            LoadState::DomContentLoaded => "domcontentloaded",
            LoadState::NetworkIdle => "networkidle",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitState {
    #[default]
    Visible,
    Hidden,
    Attached,
    Detached,
}

impl WaitState {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            WaitState::Visible => "visible",
            WaitState::Hidden => "hidden",
            WaitState::Attached => "attached",
            WaitState::Detached => "detached",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expectation {
    Visible,
    Hidden,
    Enabled,
    /// Input value equals
    Value(String),
    /// Inner text contains
    ContainsText(String),
}

impl Expectation {
    fn describe(&self) -> String {
        match self {
            Expectation::Visible => "visible".to_string(),
            Expectation::Hidden => "hidden".to_string(),
            Expectation::Enabled => "enabled".to_string(),
            Expectation::Value(v) => format!("value={}", v),
            Expectation::ContainsText(t) => format!("contains={}", t),
        }
    }
}

/// What a capture step reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Read {
    /// `isVisible()`, reported as a boolean
    IsVisible,
    /// `innerText()`, reported as a string
    InnerText,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_keys_are_unique_per_step() {
        let mut scenario = Scenario::new("captures");
        scenario.push(Step::Log {
            message: "start".into(),
        });
        let a: Capture<bool> = scenario.capture("visible", Locator::css("h1"), Read::IsVisible);
        let b: Capture<bool> = scenario.capture("visible", Locator::css("h1"), Read::IsVisible);
        assert_eq!(a.key(), "visible#1");
        assert_eq!(b.key(), "visible#2");
        assert_eq!(scenario.len(), 3);
    }

    #[test]
    fn test_url_patterns() {
        assert_eq!(
            UrlPattern::ends_with("/Energy/Buy"),
            UrlPattern::Glob("**/Energy/Buy".into())
        );
        assert_eq!(
            UrlPattern::contains("/Energy/Sale.Confirmed"),
            UrlPattern::Regex(r"/Energy/Sale\.Confirmed".into())
        );
    }

    #[test]
    fn test_step_names() {
        let step = Step::Expect {
            locator: Locator::css("input"),
            expectation: Expectation::Value("0".into()),
            timeout_ms: Some(10_000),
        };
        assert_eq!(step.name(), "expect:input:value=0");

        let long = Step::Log {
            message: "x".repeat(80),
        };
        assert_eq!(long.name().len(), "log:".len() + 30);
    }

    #[test]
    fn test_steps_serialize_with_action_tag() {
        let step = Step::Click {
            locator: Locator::css("button"),
        };
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["action"], "click");
        let back: Step = serde_json::from_value(json).unwrap();
        assert_eq!(back.name(), "click:button");
    }
}
