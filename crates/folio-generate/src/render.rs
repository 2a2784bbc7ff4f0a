//! Fetching rendered pages.

use std::time::Duration;

use ureq::Agent;

/// Failure to obtain a page's HTML.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Failed to render {url}{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
pub struct RenderFetchError {
    /// Requested route.
    pub url: String,
    /// HTTP status, if a response was received.
    pub status: Option<u16>,
    /// Transport or server message.
    pub message: String,
    /// The request exceeded its time budget.
    pub timed_out: bool,
}

impl RenderFetchError {
    /// Create an error without a status.
    #[must_use]
    pub fn new(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: None,
            message: message.into(),
            timed_out: false,
        }
    }

    /// Attach an HTTP status.
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

/// Produces the HTML for a route.
///
/// Implementations own transport details and per-request timeouts. Called
/// concurrently from the generator's worker pool.
pub trait Renderer: Send + Sync {
    /// Render `url` to HTML.
    fn render(&self, url: &str) -> Result<String, RenderFetchError>;
}

/// Renders pages by fetching them from a running application over HTTP.
pub struct HttpRenderer {
    agent: Agent,
    base_url: String,
}

impl HttpRenderer {
    /// Create a renderer for the application at `base_url`.
    ///
    /// `timeout` bounds each request end to end; a timed-out page is
    /// reported as a failed fetch.
    #[must_use]
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            agent,
            base_url: base_url.into(),
        }
    }

    /// Absolute URL for a route.
    #[must_use]
    pub fn url_for(&self, route: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            route.trim_start_matches('/')
        )
    }
}

impl Renderer for HttpRenderer {
    fn render(&self, url: &str) -> Result<String, RenderFetchError> {
        let target = self.url_for(url);
        let response = self.agent.get(&target).call().map_err(|e| RenderFetchError {
            url: url.to_owned(),
            status: None,
            timed_out: matches!(e, ureq::Error::Timeout(_)),
            message: e.to_string(),
        })?;

        let status = response.status().as_u16();
        let mut body = response.into_body();

        if status >= 400 {
            let message = body
                .read_to_string()
                .ok()
                .filter(|text| !text.trim().is_empty())
                .map_or_else(|| format!("HTTP {status}"), |text| truncate(&text, 200));
            return Err(RenderFetchError::new(url, message).with_status(status));
        }

        body.read_to_string()
            .map_err(|e| RenderFetchError::new(url, e.to_string()).with_status(status))
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => format!("{}...", &text[..index]),
        None => text.to_owned(),
    }
}
