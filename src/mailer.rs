use crate::config::Config;
use crate::db_storage::AssessmentStore;
use crate::errors::AppError;
use crate::models::Assessment;
use crate::scoring::ScoreBand;
use reqwest::Client;
use serde_json::json;
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

/// Result of a notification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailOutcome {
    /// The email was claimed and sent by this invocation.
    Sent,
    /// Another invocation already claimed this record; nothing was sent.
    AlreadySent,
}

/// Sends the assessment-results email through the Resend HTTP API.
pub struct Mailer {
    client: Client,
    base_url: String,
    api_key: String,
    from: String,
    site_url: String,
    store: AssessmentStore,
}

impl Mailer {
    pub fn new(config: &Config, pool: PgPool) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                AppError::ExternalApiError(format!("Failed to create email client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.resend_base_url.clone(),
            api_key: config.resend_api_key.clone(),
            from: config.email_from.clone(),
            site_url: config.public_site_url.clone(),
            store: AssessmentStore::new(pool),
        })
    }

    /// Renders and sends the results email for a completed assessment.
    ///
    /// The email-sent flag is claimed with an atomic conditional update
    /// before anything is rendered; a second concurrent invocation finds
    /// zero affected rows and returns [`EmailOutcome::AlreadySent`]
    /// without side effects. A send failure after a successful claim is
    /// not retried.
    pub async fn send_results_email(&self, id: Uuid) -> Result<EmailOutcome, AppError> {
        tracing::info!("Processing email for assessment {}", id);

        let assessment = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Assessment not found".to_string()))?;

        // Notification must never precede completion
        if !assessment.analysis_complete {
            return Err(AppError::BadRequest(
                "Assessment analysis is not complete yet".to_string(),
            ));
        }

        if !self.store.mark_email_sent(id).await? {
            tracing::info!("Email already sent for assessment {}", id);
            return Ok(EmailOutcome::AlreadySent);
        }

        let results_url = format!("{}/assessment/results/{}", self.site_url, id);
        let html = render_results_email(&assessment, &results_url);
        let subject = format!(
            "Your Website Assessment Results Are Ready, {}",
            assessment.company_name
        );

        let url = format!("{}/emails", self.base_url);
        let body = json!({
            "from": self.from,
            "to": [assessment.email],
            "subject": subject,
            "html": html,
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("Email send failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApiError(format!(
                "Email API returned {}: {}",
                status, error_text
            )));
        }

        tracing::info!("Results email sent for assessment {}", id);
        Ok(EmailOutcome::Sent)
    }
}

const EMAIL_STYLES: &str = r#"
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Helvetica, Arial, sans-serif; line-height: 1.6; color: #333; margin: 0; padding: 0; background-color: #f4f4f4; }
.container { max-width: 600px; margin: 0 auto; background: white; }
.header { background: linear-gradient(135deg, #1e40af 0%, #3b82f6 100%); color: white; padding: 40px 30px; text-align: center; }
.header h1 { margin: 0; font-size: 28px; font-weight: bold; }
.score-badge { background: rgba(255,255,255,0.2); display: inline-block; padding: 15px 30px; border-radius: 50px; margin-top: 20px; font-size: 18px; font-weight: 600; }
.content { padding: 40px 30px; }
.pain-statement { background: #fef2f2; border-left: 4px solid #dc2626; padding: 20px; margin: 20px 0; border-radius: 4px; }
.pain-statement p { margin: 0; color: #991b1b; font-weight: 500; font-size: 16px; }
.issue { background: #f9fafb; padding: 20px; margin: 15px 0; border-radius: 8px; border: 1px solid #e5e7eb; }
.issue-title { font-weight: 600; color: #1f2937; margin-bottom: 8px; font-size: 16px; }
.issue-desc { color: #6b7280; font-size: 14px; margin: 0; }
.cta-button { display: inline-block; background: #2563eb; color: white; padding: 16px 32px; text-decoration: none; border-radius: 6px; font-weight: 600; margin: 20px 0; }
.footer { background: #f9fafb; padding: 30px; text-align: center; color: #6b7280; font-size: 14px; }
.ps { margin-top: 20px; padding-top: 20px; border-top: 2px solid #e5e7eb; font-style: italic; color: #dc2626; }
"#;

/// Renders the fixed HTML results email.
///
/// Shows the overall score with its email band label, the first three
/// recommendations, the total issue count and the results link.
pub fn render_results_email(assessment: &Assessment, results_url: &str) -> String {
    let overall = assessment.overall_score.unwrap_or(0);
    let score_label = ScoreBand::from_score(overall).email_label();
    let recommendations = assessment.recommendation_entries();

    let issues_html: String = recommendations
        .iter()
        .take(3)
        .map(|rec| {
            format!(
                r#"<div class="issue">
  <div class="issue-title">{}</div>
  <div class="issue-desc">{}</div>
</div>"#,
                rec.issue, rec.impact
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<style>{styles}</style>
</head>
<body>
  <div class="container">
    <div class="header">
      <h1>Your Website Assessment Results Are Ready, {company}</h1>
      <div class="score-badge">Overall Score: {overall}/100 - {score_label}</div>
    </div>

    <div class="content">
      <div class="pain-statement">
        <p>&#9888;&#65039; Your website is losing you business right now. Here's what we found...</p>
      </div>

      <h2 style="color: #1f2937; margin-top: 30px;">What's Costing You Clients:</h2>

      {issues_html}

      <p style="font-size: 16px; margin: 30px 0;">We've identified {issue_count} specific issues that are driving potential clients away from {company}.</p>

      <div style="text-align: center;">
        <a href="{results_url}" class="cta-button">View Your Full Report</a>
      </div>

      <div class="ps">
        <strong>P.S.</strong> These issues are costing you clients every single day. The sooner you fix them, the sooner you stop losing business to competitors who invested in their online presence.
      </div>
    </div>

    <div class="footer">
      <p><strong>MerchBase</strong></p>
      <p>Building websites that attract clients, build trust, and outshine your competition</p>
      <p style="margin-top: 20px; font-size: 12px;">This email was sent because you requested a free website assessment at MerchBase.com</p>
    </div>
  </div>
</body>
</html>"#,
        styles = EMAIL_STYLES,
        company = assessment.company_name,
        overall = overall,
        score_label = score_label,
        issues_html = issues_html,
        issue_count = recommendations.len(),
        results_url = results_url,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Recommendation;
    use chrono::Utc;
    use sqlx::types::Json as SqlJson;

    fn completed_assessment(overall: i32, rec_count: usize) -> Assessment {
        Assessment {
            id: Uuid::new_v4(),
            company_name: "Acme".to_string(),
            industry: "Accounting Firm".to_string(),
            email: "a@b.com".to_string(),
            website_url: Some("https://acme.example".to_string()),
            website_age: None,
            satisfaction_score: Some(2),
            frustrations: vec!["Looks outdated".to_string()],
            primary_goal: "leads".to_string(),
            competitors_better: true,
            lost_business: true,
            budget_range: "10k-20k".to_string(),
            timeline: "asap".to_string(),
            overall_score: Some(overall),
            performance_score: Some(50),
            design_score: Some(50),
            seo_score: Some(50),
            mobile_score: Some(50),
            analysis_summary: Some("Summary".to_string()),
            recommendations: Some(SqlJson(
                (0..rec_count)
                    .map(|i| Recommendation {
                        category: "Design".to_string(),
                        issue: format!("Issue {}", i),
                        impact: format!("Impact {}", i),
                        solution: format!("Solution {}", i),
                    })
                    .collect(),
            )),
            analysis_complete: true,
            email_sent: false,
            email_sent_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn email_renders_band_label_and_link() {
        let assessment = completed_assessment(92, 5);
        let html = render_results_email(&assessment, "https://www.merchbase.com/assessment/results/x");
        assert!(html.contains("Overall Score: 92/100 - Strong Foundation"));
        assert!(html.contains("https://www.merchbase.com/assessment/results/x"));
        assert!(html.contains("Your Website Assessment Results Are Ready, Acme"));
    }

    #[test]
    fn email_shows_top_three_issues_and_total_count() {
        let assessment = completed_assessment(38, 6);
        let html = render_results_email(&assessment, "https://example.com/r/x");
        assert!(html.contains("Issue 0"));
        assert!(html.contains("Issue 2"));
        assert!(!html.contains("Issue 3"));
        assert!(html.contains("identified 6 specific issues"));
        assert!(html.contains("Bleeding Clients Daily"));
    }

    #[test]
    fn email_band_matches_results_surface_thresholds() {
        for (score, label) in [
            (86, "Strong Foundation"),
            (85, "Missing Easy Wins"),
            (41, "Losing Ground to Competitors"),
            (40, "Bleeding Clients Daily"),
        ] {
            let html = render_results_email(&completed_assessment(score, 4), "https://x/r/1");
            assert!(html.contains(label), "score {} should render '{}'", score, label);
        }
    }
}
