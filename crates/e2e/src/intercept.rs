//! Network stub rules
//!
//! A rule is keyed by HTTP method and URL glob and answers matching requests
//! with a fixed status/body/headers triple. Rules must be installed before the
//! UI action that triggers the request; otherwise the real backend answers.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{E2eError, E2eResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    pub fn matches(&self, method: &str) -> bool {
        self.as_str().eq_ignore_ascii_case(method)
    }
}

/// URL glob: `*` and `**` match any run of characters, `?` exactly one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UrlGlob {
    pattern: String,
    regex: Regex,
}

impl UrlGlob {
    pub fn new(pattern: impl Into<String>) -> E2eResult<Self> {
        let pattern = pattern.into();
        let mut re = String::with_capacity(pattern.len() + 8);
        re.push('^');

        let mut chars = pattern.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '*' => {
                    while chars.peek() == Some(&'*') {
                        chars.next();
                    }
                    re.push_str(".*");
                }
                '?' => re.push('.'),
                other => re.push_str(&regex::escape(other.encode_utf8(&mut [0u8; 4]))),
            }
        }
        re.push('$');

        let regex = Regex::new(&re).map_err(|e| E2eError::InvalidPattern {
            pattern: pattern.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self { pattern, regex })
    }

    pub fn is_match(&self, url: &str) -> bool {
        self.regex.is_match(url)
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// The pattern in DevTools `Fetch.RequestPattern` form, where a single
    /// `*` already spans path separators.
    pub fn to_cdp_pattern(&self) -> String {
        let mut out = String::with_capacity(self.pattern.len());
        for c in self.pattern.chars() {
            if c == '*' && out.ends_with('*') {
                continue;
            }
            out.push(c);
        }
        out
    }
}

impl TryFrom<String> for UrlGlob {
    type Error = E2eError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        UrlGlob::new(value)
    }
}

impl From<UrlGlob> for String {
    fn from(glob: UrlGlob) -> Self {
        glob.pattern
    }
}

impl PartialEq for UrlGlob {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

impl fmt::Display for UrlGlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

/// Canned response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StubResponse {
    #[serde(default = "default_status")]
    pub status: u16,
    #[serde(default)]
    pub body: serde_json::Value,
    #[serde(default)]
    pub headers: Vec<(String, String)>,
}

fn default_status() -> u16 {
    200
}

impl StubResponse {
    /// JSON response with a `content-type` header.
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            body,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
        }
    }

    /// Body bytes as sent on the wire.
    pub fn body_bytes(&self) -> Vec<u8> {
        match &self.body {
            serde_json::Value::Null => Vec::new(),
            serde_json::Value::String(s) => s.as_bytes().to_vec(),
            other => other.to_string().into_bytes(),
        }
    }
}

/// A stub keyed by method and URL glob
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StubRule {
    /// Name used to wait on the stub
    pub alias: String,
    pub method: HttpMethod,
    pub url: UrlGlob,
    pub response: StubResponse,
}

impl StubRule {
    pub fn new(alias: impl Into<String>, method: HttpMethod, url: &str, response: StubResponse) -> E2eResult<Self> {
        Ok(Self {
            alias: alias.into(),
            method,
            url: UrlGlob::new(url)?,
            response,
        })
    }

    pub fn matches(&self, method: &str, url: &str) -> bool {
        self.method.matches(method) && self.url.is_match(url)
    }
}
