//! Page context: where the host page currently is.

use std::sync::RwLock;

use url::Url;

/// Supplies the current page URL.
pub trait PageContext: Send + Sync {
    /// Full URL of the current page, as the host reports it.
    fn location(&self) -> String;
}

/// Page context with a settable URL.
#[derive(Debug)]
pub struct StaticPage {
    location: RwLock<String>,
}

impl StaticPage {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: RwLock::new(location.into()),
        }
    }

    /// Simulate navigating to another URL.
    pub fn navigate(&self, location: impl Into<String>) {
        if let Ok(mut current) = self.location.write() {
            *current = location.into();
        }
    }
}

impl PageContext for StaticPage {
    fn location(&self) -> String {
        self.location
            .read()
            .map(|l| l.clone())
            .unwrap_or_default()
    }
}

/// Parsed query parameters of a page URL.
#[derive(Debug, Clone)]
pub struct QueryParams {
    url: Url,
}

impl QueryParams {
    /// Parse a URL. Returns `None` for anything that is not an absolute URL.
    pub fn parse(location: &str) -> Option<Self> {
        Url::parse(location).ok().map(|url| Self { url })
    }

    /// First value of a parameter.
    pub fn get(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    pub fn has(&self, name: &str) -> bool {
        self.url.query_pairs().any(|(key, _)| key == name)
    }

    /// Whether any occurrence of `name` carries exactly `value`.
    pub fn has_value(&self, name: &str, value: &str) -> bool {
        self.url
            .query_pairs()
            .any(|(key, v)| key == name && v == value)
    }
}
