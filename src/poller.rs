use crate::errors::AppError;
use crate::models::{Assessment, SubmitAssessmentRequest, WebsiteAnalysis};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use uuid::Uuid;

/// Default re-read interval for the results view.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
/// Default wall-clock ceiling before the poller gives up.
pub const DEFAULT_POLL_CEILING: Duration = Duration::from_secs(30);

/// Message surfaced when polling hits the ceiling.
pub const POLL_TIMEOUT_MESSAGE: &str =
    "Analysis is taking longer than expected. Please refresh the page.";

/// Timing knobs for [`AssessmentClient::await_results`].
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    pub interval: Duration,
    pub ceiling: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            ceiling: DEFAULT_POLL_CEILING,
        }
    }
}

/// Observable states of the results view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Submitting,
    Polling,
    Ready,
    Error,
}

/// Terminal outcome of a polling run.
#[derive(Debug)]
pub enum PollResult {
    /// The completion flag was observed; the completed record is attached.
    Ready(Box<Assessment>),
    /// The ceiling elapsed without completion. All polling stops here;
    /// no further reads are issued.
    TimedOut,
}

impl PollResult {
    /// The terminal state this outcome corresponds to.
    pub fn state(&self) -> PollState {
        match self {
            PollResult::Ready(_) => PollState::Ready,
            PollResult::TimedOut => PollState::Error,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    #[allow(dead_code)]
    success: bool,
    analysis: WebsiteAnalysis,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Client-side driver for the assessment flow: submit the form, trigger
/// the analysis, then poll the record until it completes.
///
/// Dropping any in-flight future cancels its pending reads and timers,
/// which is the unmount contract of the results view.
pub struct AssessmentClient {
    http: Client,
    base_url: String,
}

impl AssessmentClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, AppError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                AppError::ExternalApiError(format!("Failed to create API client: {}", e))
            })?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Submits the form and synchronously triggers the analysis, mirroring
    /// the submit flow of the assessment page. The caller is in
    /// [`PollState::Submitting`] for the duration of this call.
    pub async fn submit_and_analyze(
        &self,
        request: &SubmitAssessmentRequest,
    ) -> Result<Assessment, AppError> {
        let assessment = self.submit(request).await?;
        self.trigger_analysis(assessment.id).await?;
        Ok(assessment)
    }

    /// Inserts the submission record.
    pub async fn submit(
        &self,
        request: &SubmitAssessmentRequest,
    ) -> Result<Assessment, AppError> {
        let url = format!("{}/api/v1/assessments", self.base_url);
        let response = self.http.post(&url).json(request).send().await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    /// Invokes the analyze operation for an inserted record.
    pub async fn trigger_analysis(&self, id: Uuid) -> Result<WebsiteAnalysis, AppError> {
        let url = format!("{}/api/v1/assessments/analyze", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&json!({ "assessmentId": id.to_string() }))
            .send()
            .await?;
        let response = check_status(response).await?;
        let parsed: AnalyzeResponse = response.json().await?;
        Ok(parsed.analysis)
    }

    /// Reads the record once.
    pub async fn fetch(&self, id: Uuid) -> Result<Assessment, AppError> {
        let url = format!("{}/api/v1/assessments/{}", self.base_url, id);
        let response = self.http.get(&url).send().await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    /// Polls the record until the completion flag is observed.
    ///
    /// Reads once immediately; an error on this first read is surfaced
    /// (the view renders its load-failure state). Afterwards the record
    /// is re-read every `config.interval`, ignoring transient read
    /// errors, until completion or until `config.ceiling` elapses. The
    /// ceiling cancels the interval along with any in-flight read, so no
    /// reads happen after the terminal transition.
    pub async fn await_results(
        &self,
        id: Uuid,
        config: PollConfig,
    ) -> Result<PollResult, AppError> {
        let first = self.fetch(id).await?;
        if first.analysis_complete {
            return Ok(PollResult::Ready(Box::new(first)));
        }

        tracing::debug!("Assessment {} incomplete, polling every {:?}", id, config.interval);

        let poll_loop = async {
            let mut ticker = tokio::time::interval(config.interval);
            // interval fires immediately; the first read already happened
            ticker.tick().await;

            loop {
                ticker.tick().await;
                match self.fetch(id).await {
                    Ok(assessment) if assessment.analysis_complete => {
                        return Box::new(assessment);
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::debug!("Poll read for {} failed: {}", id, e);
                    }
                }
            }
        };

        match tokio::time::timeout(config.ceiling, poll_loop).await {
            Ok(assessment) => Ok(PollResult::Ready(assessment)),
            Err(_) => {
                tracing::warn!("Polling for assessment {} timed out", id);
                Ok(PollResult::TimedOut)
            }
        }
    }
}

/// Maps non-success responses to an error carrying the server's
/// `{"error": msg}` body when present.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, AppError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => format!("API returned status {}", status),
    };

    Err(AppError::ExternalApiError(message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poll_results_map_to_terminal_states() {
        assert_eq!(PollResult::TimedOut.state(), PollState::Error);
    }

    #[test]
    fn default_config_matches_results_view() {
        let config = PollConfig::default();
        assert_eq!(config.interval, Duration::from_secs(2));
        assert_eq!(config.ceiling, Duration::from_secs(30));
    }
}
