//! Element locators
//!
//! A locator is a CSS selector optionally narrowed by visible text, a parent
//! scope and a positional index. It carries no reference to the live page and
//! is re-resolved on every query.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locator {
    pub css: String,
    /// Keep only elements whose text contains this substring
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Pick the n-th match (0-based)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    /// Search inside the element(s) matched by this locator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Box<Locator>>,
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self {
            css: selector.into(),
            text: None,
            index: None,
            scope: None,
        }
    }

    /// Elements matching `selector` whose text contains `text`.
    pub fn contains(selector: impl Into<String>, text: impl Into<String>) -> Self {
        Self::css(selector).with_text(text)
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn first(self) -> Self {
        self.nth(0)
    }

    pub fn nth(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// `selector` searched inside `self`.
    pub fn find(self, selector: impl Into<String>) -> Self {
        Locator::css(selector).within(self)
    }

    pub fn within(mut self, parent: Locator) -> Self {
        self.scope = Some(Box::new(parent));
        self
    }
}

impl From<&str> for Locator {
    fn from(selector: &str) -> Self {
        Locator::css(selector)
    }
}

impl From<String> for Locator {
    fn from(selector: String) -> Self {
        Locator::css(selector)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(scope) = &self.scope {
            write!(f, "{} >> ", scope)?;
        }
        write!(f, "{}", self.css)?;
        if let Some(text) = &self.text {
            write!(f, ":contains(\"{}\")", text)?;
        }
        if let Some(i) = self.index {
            write!(f, ":eq({})", i)?;
        }
        Ok(())
    }
}
