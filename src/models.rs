use crate::errors::AppError;
use crate::scoring::{
    MAX_RECOMMENDATIONS, MIN_RECOMMENDATIONS, RECOMMENDATION_CATEGORIES, SCORE_MAX, SCORE_MIN,
};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::types::Json as SqlJson;
use sqlx::FromRow;
use uuid::Uuid;

// ============ Database Models ============

/// A website assessment submission and its analysis lifecycle.
///
/// Input attributes are written once at creation. Derived attributes are
/// written once by the analyzer in a single update; `analysis_complete`
/// moves false -> true and never reverts. Notification attributes are
/// claimed at most once by the mailer, and only after completion.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Assessment {
    /// Unique identifier, generated at insert.
    pub id: Uuid,
    /// Company or organization name.
    pub company_name: String,
    /// Industry bucket selected on the form.
    pub industry: String,
    /// Contact email the results are sent to.
    pub email: String,
    /// Website to analyze, absent for leads without one.
    pub website_url: Option<String>,
    /// Age bucket of the current website.
    pub website_age: Option<String>,
    /// Self-reported satisfaction, 1-5.
    pub satisfaction_score: Option<i32>,
    /// Selected frustrations; non-empty at creation.
    pub frustrations: Vec<String>,
    /// Primary goal for the new website.
    pub primary_goal: String,
    /// Whether competitors have better websites.
    pub competitors_better: bool,
    /// Whether business was lost due to the website.
    pub lost_business: bool,
    /// Budget bucket.
    pub budget_range: String,
    /// Timeline bucket.
    pub timeline: String,
    /// Overall score, set by the analyzer.
    pub overall_score: Option<i32>,
    pub performance_score: Option<i32>,
    pub design_score: Option<i32>,
    pub seo_score: Option<i32>,
    pub mobile_score: Option<i32>,
    /// Short free-text overview of the biggest issues.
    pub analysis_summary: Option<String>,
    /// Ordered recommendation entries, stored as jsonb.
    pub recommendations: Option<SqlJson<Vec<Recommendation>>>,
    /// Monotonic completion flag; scores are meaningful only when true.
    pub analysis_complete: bool,
    /// Set when the results email has been claimed for sending.
    pub email_sent: bool,
    pub email_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Assessment {
    /// Recommendation entries, empty until the analysis completes.
    pub fn recommendation_entries(&self) -> &[Recommendation] {
        self.recommendations
            .as_ref()
            .map(|r| r.0.as_slice())
            .unwrap_or(&[])
    }
}

/// A published (or draft) blog post.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: Uuid,
    pub title: String,
    /// URL slug, unique per post.
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub category: String,
    pub tags: Option<Vec<String>>,
    /// Publication state: "draft" or "published".
    pub status: String,
    pub featured: bool,
    pub featured_image_url: Option<String>,
    pub author_name: Option<String>,
    pub author_image_url: Option<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub affiliate_disclosure: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub view_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

// ============ Analysis Payloads ============

/// One actionable recommendation from the analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    /// One of the fixed categories: Design, Performance, SEO, Mobile, Content.
    pub category: String,
    /// Specific problem found.
    pub issue: String,
    /// Why this matters for the business.
    pub impact: String,
    /// What MerchBase would do to fix it.
    pub solution: String,
}

/// The structured payload returned by the scoring model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebsiteAnalysis {
    pub overall_score: i32,
    pub performance_score: i32,
    pub design_score: i32,
    pub seo_score: i32,
    pub mobile_score: i32,
    pub analysis_summary: String,
    pub recommendations: Vec<Recommendation>,
}

impl WebsiteAnalysis {
    /// Validates the payload against the rubric contract: five integer
    /// scores in [0, 100], 4-8 recommendations, every field populated,
    /// categories drawn from the fixed vocabulary. Violations are hard
    /// errors; nothing is persisted from an invalid analysis.
    pub fn validate(&self) -> Result<(), AppError> {
        for (name, value) in [
            ("overall_score", self.overall_score),
            ("performance_score", self.performance_score),
            ("design_score", self.design_score),
            ("seo_score", self.seo_score),
            ("mobile_score", self.mobile_score),
        ] {
            if !(SCORE_MIN..=SCORE_MAX).contains(&value) {
                return Err(AppError::ExternalApiError(format!(
                    "AI returned {} out of range: {}",
                    name, value
                )));
            }
        }

        if self.analysis_summary.trim().is_empty() {
            return Err(AppError::ExternalApiError(
                "AI returned an empty analysis summary".to_string(),
            ));
        }

        let count = self.recommendations.len();
        if !(MIN_RECOMMENDATIONS..=MAX_RECOMMENDATIONS).contains(&count) {
            return Err(AppError::ExternalApiError(format!(
                "AI returned {} recommendations, expected {}-{}",
                count, MIN_RECOMMENDATIONS, MAX_RECOMMENDATIONS
            )));
        }

        for (idx, rec) in self.recommendations.iter().enumerate() {
            if !RECOMMENDATION_CATEGORIES.contains(&rec.category.as_str()) {
                return Err(AppError::ExternalApiError(format!(
                    "Recommendation {} has unknown category '{}'",
                    idx, rec.category
                )));
            }
            if rec.issue.trim().is_empty()
                || rec.impact.trim().is_empty()
                || rec.solution.trim().is_empty()
            {
                return Err(AppError::ExternalApiError(format!(
                    "Recommendation {} has empty fields",
                    idx
                )));
            }
        }

        Ok(())
    }
}

// ============ API Request/Response Models ============

/// Assessment submission payload, field names as the form sends them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAssessmentRequest {
    pub company_name: String,
    pub industry: String,
    pub email: String,
    #[serde(default)]
    pub website_url: Option<String>,
    #[serde(default)]
    pub website_age: Option<String>,
    #[serde(default)]
    pub satisfaction_score: Option<i32>,
    #[serde(default)]
    pub frustrations: Vec<String>,
    pub primary_goal: String,
    /// "yes" / "no" / "unsure"
    pub competitors_better: String,
    /// "yes" / "maybe" / "no"
    pub lost_business: String,
    pub budget_range: String,
    pub timeline: String,
}

impl SubmitAssessmentRequest {
    /// Validates the submission before it is inserted.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.company_name.trim().is_empty() {
            return Err(AppError::BadRequest("Company name is required".to_string()));
        }
        if self.industry.trim().is_empty() {
            return Err(AppError::BadRequest("Industry is required".to_string()));
        }
        if !is_valid_email(&self.email) {
            return Err(AppError::BadRequest("Invalid email address".to_string()));
        }
        if let Some(url) = self.website_url.as_deref().filter(|u| !u.trim().is_empty()) {
            let parsed = url::Url::parse(url)
                .map_err(|_| AppError::BadRequest("Invalid website URL".to_string()))?;
            if parsed.scheme() != "http" && parsed.scheme() != "https" {
                return Err(AppError::BadRequest(
                    "Website URL must be http or https".to_string(),
                ));
            }
        }
        if let Some(score) = self.satisfaction_score {
            if !(1..=5).contains(&score) {
                return Err(AppError::BadRequest(
                    "Satisfaction score must be between 1 and 5".to_string(),
                ));
            }
        }
        if self.frustrations.iter().all(|f| f.trim().is_empty()) {
            return Err(AppError::BadRequest(
                "At least one frustration is required".to_string(),
            ));
        }
        for (field, value) in [
            ("Primary goal", &self.primary_goal),
            ("Competitor comparison", &self.competitors_better),
            ("Lost business answer", &self.lost_business),
            ("Budget range", &self.budget_range),
            ("Timeline", &self.timeline),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::BadRequest(format!("{} is required", field)));
            }
        }
        Ok(())
    }

    /// Website URL with empty strings collapsed to absent.
    pub fn website_url_or_none(&self) -> Option<&str> {
        self.website_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }

    /// "yes" answers map to true, anything else ("no", "unsure") to false.
    pub fn competitors_better_flag(&self) -> bool {
        self.competitors_better.eq_ignore_ascii_case("yes")
    }

    /// "yes" answers map to true, anything else ("no", "maybe") to false.
    pub fn lost_business_flag(&self) -> bool {
        self.lost_business.eq_ignore_ascii_case("yes")
    }
}

/// Body for the analyze and send-email operations.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentIdRequest {
    #[serde(default)]
    pub assessment_id: Option<String>,
}

impl AssessmentIdRequest {
    /// Extracts and parses the identifier, rejecting missing or malformed ids.
    pub fn parsed_id(&self) -> Result<Uuid, AppError> {
        let raw = self
            .assessment_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::BadRequest("Assessment ID is required".to_string()))?;

        Uuid::parse_str(raw)
            .map_err(|_| AppError::BadRequest(format!("Invalid assessment ID: {}", raw)))
    }
}

/// Query parameters for the blog post listing.
#[derive(Debug, Deserialize)]
pub struct PostListQuery {
    pub category: Option<String>,
}

/// A post plus up to three related posts from the same category.
#[derive(Debug, Serialize)]
pub struct BlogPostDetail {
    pub post: BlogPost,
    pub related: Vec<BlogPost>,
}

/// Validates email shape with a simplified RFC 5322 pattern.
pub fn is_valid_email(email: &str) -> bool {
    if email.trim().is_empty() || email.len() < 5 {
        return false;
    }

    // RFC 5322 simplified email regex
    // Matches: local@domain.tld
    let email_regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$",
    )
    .unwrap();

    email_regex.is_match(email)
}
