use crate::config::Config;
use crate::errors::AppError;
use crate::models::{Assessment, WebsiteAnalysis};
use crate::scoring::{scoring_guidelines, RECOMMENDATION_CATEGORIES};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

/// Function name the model is forced to call.
const ANALYSIS_FUNCTION: &str = "provide_website_analysis";

const SYSTEM_PROMPT: &str = "You are a professional web agency analyst. \
Analyze websites and provide actionable insights with business impact.";

/// Marker inserted into the prompt when the lead has no website.
pub const NO_WEBSITE_MARKER: &str =
    "No website to analyze - provide general recommendations for their industry.";

/// Client for the hosted scoring model behind an OpenAI-compatible
/// chat-completions gateway.
///
/// The response contract is strict: the model must answer through the
/// forced function call, and the parsed arguments must satisfy the rubric.
/// There is no free-text fallback and no retry.
#[derive(Clone)]
pub struct AiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    tool_calls: Vec<ToolCall>,
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    function: FunctionCall,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    /// JSON-encoded arguments matching the analysis schema.
    arguments: String,
}

impl AiClient {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| {
                AppError::ExternalApiError(format!("Failed to create AI client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.ai_gateway_url.clone(),
            api_key: config.ai_api_key.clone(),
            model: config.ai_model.clone(),
        })
    }

    /// Scores the assessment against the fixed rubric.
    ///
    /// `website_html` is whatever the fetcher produced: markup, the fetch
    /// placeholder, or an empty string when no URL was given.
    pub async fn score_website(
        &self,
        assessment: &Assessment,
        website_html: &str,
    ) -> Result<WebsiteAnalysis, AppError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let user_prompt = build_user_prompt(assessment, website_html);

        tracing::info!(
            "Requesting website analysis for assessment {} (model {})",
            assessment.id,
            self.model
        );

        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": user_prompt }
            ],
            "tools": [
                {
                    "type": "function",
                    "function": {
                        "name": ANALYSIS_FUNCTION,
                        "description": "Provide structured website analysis with scores and recommendations",
                        "parameters": analysis_schema()
                    }
                }
            ],
            "tool_choice": { "type": "function", "function": { "name": ANALYSIS_FUNCTION } }
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("AI request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApiError(format!(
                "AI gateway returned {}: {}",
                status, error_text
            )));
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse AI response: {}", e))
        })?;

        let analysis = parse_analysis(completion)?;
        analysis.validate()?;

        tracing::info!(
            "Analysis for assessment {} scored {} overall with {} recommendations",
            assessment.id,
            analysis.overall_score,
            analysis.recommendations.len()
        );

        Ok(analysis)
    }
}

/// Extracts the forced function-call payload from a completion.
fn parse_analysis(completion: ChatCompletionResponse) -> Result<WebsiteAnalysis, AppError> {
    let tool_call = completion
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.tool_calls)
        .unwrap_or_default()
        .into_iter()
        .next()
        .ok_or_else(|| {
            AppError::ExternalApiError("No tool call in AI response".to_string())
        })?;

    serde_json::from_str(&tool_call.function.arguments).map_err(|e| {
        AppError::ExternalApiError(format!("Malformed analysis arguments: {}", e))
    })
}

/// JSON Schema for the analysis function call.
fn analysis_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "overall_score": { "type": "integer", "minimum": 0, "maximum": 100 },
            "performance_score": { "type": "integer", "minimum": 0, "maximum": 100 },
            "design_score": { "type": "integer", "minimum": 0, "maximum": 100 },
            "seo_score": { "type": "integer", "minimum": 0, "maximum": 100 },
            "mobile_score": { "type": "integer", "minimum": 0, "maximum": 100 },
            "analysis_summary": { "type": "string" },
            "recommendations": {
                "type": "array",
                "minItems": 4,
                "maxItems": 8,
                "items": {
                    "type": "object",
                    "properties": {
                        "category": { "type": "string", "enum": RECOMMENDATION_CATEGORIES },
                        "issue": { "type": "string" },
                        "impact": { "type": "string" },
                        "solution": { "type": "string" }
                    },
                    "required": ["category", "issue", "impact", "solution"]
                }
            }
        },
        "required": [
            "overall_score", "performance_score", "design_score", "seo_score",
            "mobile_score", "analysis_summary", "recommendations"
        ]
    })
}

/// Builds the deterministic user prompt from assessment inputs and markup.
fn build_user_prompt(assessment: &Assessment, website_html: &str) -> String {
    let website_block = if website_html.is_empty() {
        NO_WEBSITE_MARKER.to_string()
    } else {
        format!("Website HTML (first 50KB):\n{}", website_html)
    };

    format!(
        "Analyze this website and provide scores and recommendations.\n\
        \n\
        Company: {company}\n\
        Industry: {industry}\n\
        Stated Problems: {problems}\n\
        Primary Goal: {goal}\n\
        Website URL: {url}\n\
        \n\
        {website_block}\n\
        \n\
        Score the website using the {fn_name} function: five integer scores \
        from 0 to 100 plus a 2-3 sentence summary of the biggest issues.\n\
        \n\
        Scoring Guidelines:\n\
        {guidelines}\n\
        \n\
        Provide 4-8 specific, actionable recommendations. Each must use one \
        of the categories {categories:?} and focus on business impact, not \
        just technical details.",
        company = assessment.company_name,
        industry = assessment.industry,
        problems = assessment.frustrations.join(", "),
        goal = assessment.primary_goal,
        url = assessment.website_url.as_deref().unwrap_or("No website provided"),
        website_block = website_block,
        fn_name = ANALYSIS_FUNCTION,
        guidelines = scoring_guidelines(),
        categories = RECOMMENDATION_CATEGORIES,
    )
}
