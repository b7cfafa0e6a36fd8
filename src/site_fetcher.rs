use reqwest::Client;
use std::time::Duration;

/// Maximum number of characters of markup passed downstream to the
/// scoring prompt.
pub const MAX_HTML_CHARS: usize = 50_000;

/// Substituted for the body whenever the target site cannot be fetched.
pub const FETCH_FAILED_PLACEHOLDER: &str = "Unable to fetch website content";

const USER_AGENT: &str = "MerchBase Assessment Bot/1.0";
const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Best-effort fetcher for the lead's website markup.
///
/// Fetch failures degrade to a placeholder string instead of failing the
/// caller; the analysis still runs with whatever context is available.
pub struct SiteFetcher {
    client: Client,
}

impl Default for SiteFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteFetcher {
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(FETCH_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");

        Self { client }
    }

    /// Fetches the markup for `url`.
    ///
    /// Absent or empty URLs return an empty string without touching the
    /// network. Any transport error or non-success status returns the
    /// fixed placeholder. Successful bodies are treated as text and
    /// truncated to [`MAX_HTML_CHARS`] characters.
    pub async fn fetch(&self, url: Option<&str>) -> String {
        let Some(url) = url.map(str::trim).filter(|u| !u.is_empty()) else {
            return String::new();
        };

        match self.try_fetch(url).await {
            Ok(body) => truncate_chars(body, MAX_HTML_CHARS),
            Err(e) => {
                tracing::warn!("Error fetching website {}: {}", url, e);
                FETCH_FAILED_PLACEHOLDER.to_string()
            }
        }
    }

    async fn try_fetch(&self, url: &str) -> Result<String, reqwest::Error> {
        let response = self.client.get(url).send().await?;
        let response = response.error_for_status()?;
        response.text().await
    }
}

/// Truncates to `max` characters on a char boundary.
fn truncate_chars(mut s: String, max: usize) -> String {
    if let Some((idx, _)) = s.char_indices().nth(max) {
        s.truncate(idx);
    }
    s
}
