use crate::ai_client::AiClient;
use crate::config::Config;
use crate::db_storage::AssessmentStore;
use crate::errors::AppError;
use crate::mailer::Mailer;
use crate::models::WebsiteAnalysis;
use crate::site_fetcher::SiteFetcher;
use sqlx::PgPool;
use uuid::Uuid;

/// Orchestrates the assessment pipeline: load, fetch, score, persist,
/// then trigger the notification email as a detached task.
pub struct AnalysisService {
    config: Config,
    pool: PgPool,
    store: AssessmentStore,
}

impl AnalysisService {
    pub fn new(config: &Config, pool: PgPool) -> Self {
        Self {
            config: config.clone(),
            store: AssessmentStore::new(pool.clone()),
            pool,
        }
    }

    /// Runs the full analysis for one assessment.
    ///
    /// Steps 1-4 are strictly sequential and abort on the first error,
    /// leaving prior writes as-is; a crash between scoring and persist
    /// leaves the record permanently incomplete. The email trigger in
    /// step 5 is fire-and-forget: its failures are logged, never
    /// surfaced, and never retried.
    pub async fn analyze(&self, assessment_id: Uuid) -> Result<WebsiteAnalysis, AppError> {
        // 1. Load the record
        let assessment = self
            .store
            .get(assessment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Assessment not found".to_string()))?;

        tracing::info!(
            "Analyzing assessment {} ({}, website: {})",
            assessment.id,
            assessment.company_name,
            assessment.website_url.as_deref().unwrap_or("none")
        );

        // 2. Fetch the target site, best-effort
        let website_html = SiteFetcher::new()
            .fetch(assessment.website_url.as_deref())
            .await;

        // 3. Score against the rubric; hard failure aborts before any write
        let analysis = AiClient::new(&self.config)?
            .score_website(&assessment, &website_html)
            .await?;

        // 4. Persist scores + summary + recommendations + completion flag
        self.store.save_analysis(assessment_id, &analysis).await?;

        // 5. Trigger the results email without blocking the response
        self.spawn_email_trigger(assessment_id);

        Ok(analysis)
    }

    /// Spawns the detached notification task.
    fn spawn_email_trigger(&self, assessment_id: Uuid) {
        let config = self.config.clone();
        let pool = self.pool.clone();

        tokio::spawn(async move {
            let mailer = match Mailer::new(&config, pool) {
                Ok(mailer) => mailer,
                Err(e) => {
                    tracing::error!("Failed to initialize mailer for {}: {}", assessment_id, e);
                    return;
                }
            };

            match mailer.send_results_email(assessment_id).await {
                Ok(outcome) => {
                    tracing::info!(
                        "Email trigger for assessment {} finished: {:?}",
                        assessment_id,
                        outcome
                    );
                }
                Err(e) => {
                    tracing::error!("Error triggering email for {}: {}", assessment_id, e);
                }
            }
        });
    }
}
