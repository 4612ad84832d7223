//! In-memory page source for unit tests

use crate::crawler::{FetchError, PageSource};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Serves fixed bodies by URL and counts requests
#[derive(Default)]
pub(crate) struct MapSource {
    pages: HashMap<String, Result<String, FetchError>>,
    delay: Duration,
    hits: Mutex<HashMap<String, usize>>,
}

impl MapSource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn page(mut self, url: &str, body: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), Ok(body.into()));
        self
    }

    pub(crate) fn status(mut self, url: &str, status: u16) -> Self {
        self.pages.insert(
            url.to_string(),
            Err(FetchError::Status {
                url: url.to_string(),
                status,
            }),
        );
        self
    }

    /// Delays every response
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn hits(&self, url: &str) -> usize {
        self.hits.lock().unwrap().get(url).copied().unwrap_or(0)
    }
}

#[async_trait]
impl PageSource for MapSource {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        *self.hits.lock().unwrap().entry(url.to_string()).or_insert(0) += 1;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.pages.get(url).cloned().unwrap_or_else(|| {
            Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
        })
    }
}

/// Wiki-style category page listing `(title, href)` pairs
pub(crate) fn category_page(heading: &str, items: &[(&str, &str)], next: Option<&str>) -> String {
    let items: String = items
        .iter()
        .map(|(title, href)| format!(r#"<li><a href="{}">{}</a></li>"#, href, title))
        .collect();
    let next = next
        .map(|href| format!(r#"<a href="{}">next page</a>"#, href))
        .unwrap_or_default();
    format!(
        r#"<html><body><h1 id="firstHeading">{}</h1>
        <div id="mw-content-text"><div id="mw-pages"><ul>{}</ul>{}</div></div>
        </body></html>"#,
        heading, items, next
    )
}

/// Wiki-style film page with an infobox poster and a lead paragraph
pub(crate) fn film_page(poster: &str, description: &str) -> String {
    format!(
        r#"<html><body><div class="mw-parser-output">
        <table class="infobox"><tr><td><img src="{}" width="200"></td></tr></table>
        <p>{}</p></div></body></html>"#,
        poster, description
    )
}
