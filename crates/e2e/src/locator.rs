//! Semantic element references rendered as Playwright locator expressions
//!
//! A [`Locator`] is a description, not a handle: it is turned into a fresh
//! `page.getByRole(...)` / `page.locator(...)` chain every time a step uses
//! it, so nothing survives a navigation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// ARIA roles the Buy Energy pages are queried by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Heading,
    Button,
    Link,
}

impl Role {
    fn as_str(&self) -> &'static str {
        match self {
            Role::Heading => "heading",
            Role::Button => "button",
            Role::Link => "link",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Locator {
    /// CSS selector
    Css { selector: String },

    /// Element by ARIA role and accessible name
    Role {
        role: Role,
        name: String,
        #[serde(default)]
        exact: bool,
    },

    /// Element by visible text
    Text {
        text: String,
        #[serde(default)]
        exact: bool,
    },

    /// Narrow `base` to elements containing `has_text` somewhere inside
    Filter { base: Box<Locator>, has_text: String },

    /// Resolve `child` inside every match of `parent`
    Within {
        parent: Box<Locator>,
        child: Box<Locator>,
    },

    /// Match either alternative
    Or { first: Box<Locator>, second: Box<Locator> },
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css {
            selector: selector.into(),
        }
    }

    pub fn role(role: Role, name: impl Into<String>) -> Self {
        Locator::Role {
            role,
            name: name.into(),
            exact: false,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Locator::Text {
            text: text.into(),
            exact: false,
        }
    }

    /// Require an exact accessible-name / text match
    pub fn exact(self) -> Self {
        match self {
            Locator::Role { role, name, .. } => Locator::Role {
                role,
                name,
                exact: true,
            },
            Locator::Text { text, .. } => Locator::Text { text, exact: true },
            other => other,
        }
    }

    pub fn has_text(self, text: impl Into<String>) -> Self {
        Locator::Filter {
            base: Box::new(self),
            has_text: text.into(),
        }
    }

    /// Scope `child` to this locator
    pub fn locate(&self, child: Locator) -> Self {
        Locator::Within {
            parent: Box::new(self.clone()),
            child: Box::new(child),
        }
    }

    pub fn or(self, other: Locator) -> Self {
        Locator::Or {
            first: Box::new(self),
            second: Box::new(other),
        }
    }

    /// JavaScript expression resolving this locator from `root`
    /// (`page` or another locator expression).
    pub fn to_js(&self, root: &str) -> String {
        match self {
            Locator::Css { selector } => format!("{}.locator({})", root, js_str(selector)),
            Locator::Role { role, name, exact } => format!(
                "{}.getByRole({}, {{ name: {}, exact: {} }})",
                root,
                js_str(role.as_str()),
                js_str(name),
                exact
            ),
            Locator::Text { text, exact } => {
                format!("{}.getByText({}, {{ exact: {} }})", root, js_str(text), exact)
            }
            Locator::Filter { base, has_text } => {
                format!("{}.filter({{ hasText: {} }})", base.to_js(root), js_str(has_text))
            }
            Locator::Within { parent, child } => child.to_js(&parent.to_js(root)),
            Locator::Or { first, second } => {
                format!("{}.or({})", first.to_js(root), second.to_js(root))
            }
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css { selector } => write!(f, "{}", selector),
            Locator::Role { role, name, exact } => {
                write!(f, "role={}[name=\"{}\"", role.as_str(), name)?;
                if *exact {
                    write!(f, " exact")?;
                }
                write!(f, "]")
            }
            Locator::Text { text, .. } => write!(f, "text=\"{}\"", text),
            Locator::Filter { base, has_text } => write!(f, "{}:has-text(\"{}\")", base, has_text),
            Locator::Within { parent, child } => write!(f, "{} >> {}", parent, child),
            Locator::Or { first, second } => write!(f, "{} | {}", first, second),
        }
    }
}

/// Quote `s` as a JavaScript string literal
pub fn js_str(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_locator_js() {
        let title = Locator::role(Role::Heading, "Buy Energy");
        assert_eq!(
            title.to_js("page"),
            r#"page.getByRole("heading", { name: "Buy Energy", exact: false })"#
        );

        let heading = Locator::role(Role::Heading, "Error").exact();
        assert!(heading.to_js("page").ends_with(r#"exact: true })"#));
    }

    #[test]
    fn test_row_scoped_input_js() {
        let row = Locator::css("tr").has_text("Gas");
        let input = row.locate(Locator::css(r#"input[name="energyType.AmountPurchased"]"#));
        assert_eq!(
            input.to_js("page"),
            r#"page.locator("tr").filter({ hasText: "Gas" }).locator("input[name=\"energyType.AmountPurchased\"]")"#
        );
    }

    #[test]
    fn test_or_locator_roots_both_sides() {
        let msg = Locator::css(".alert-success").or(Locator::text("Thank you for your purchase"));
        assert_eq!(
            msg.to_js("page"),
            r#"page.locator(".alert-success").or(page.getByText("Thank you for your purchase", { exact: false }))"#
        );
    }

    #[test]
    fn test_js_str_escapes_quotes() {
        assert_eq!(js_str("it's \"x\""), r#""it's \"x\"""#);
        assert_eq!(js_str("Buy more »"), "\"Buy more »\"");
    }

    #[test]
    fn test_display_is_readable() {
        let buy = Locator::css("tr")
            .has_text("Oil")
            .locate(Locator::role(Role::Button, "Buy"));
        assert_eq!(buy.to_string(), r#"tr:has-text("Oil") >> role=button[name="Buy"]"#);
    }
}
