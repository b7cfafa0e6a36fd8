use crate::errors::AppError;
use crate::models::{Assessment, BlogPost, SubmitAssessmentRequest, WebsiteAnalysis};
use sqlx::types::Json as SqlJson;
use sqlx::PgPool;
use uuid::Uuid;

/// Storage operations for assessment records.
pub struct AssessmentStore {
    pool: PgPool,
}

impl AssessmentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a validated submission and returns the created record with
    /// all derived and notification fields unset.
    pub async fn insert(&self, req: &SubmitAssessmentRequest) -> Result<Assessment, AppError> {
        let assessment = sqlx::query_as::<_, Assessment>(
            r#"
            INSERT INTO assessments (
                id, company_name, industry, email, website_url, website_age,
                satisfaction_score, frustrations, primary_goal,
                competitors_better, lost_business, budget_range, timeline,
                analysis_complete, email_sent, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, false, false, now())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(req.company_name.trim())
        .bind(req.industry.trim())
        .bind(req.email.trim())
        .bind(req.website_url_or_none())
        .bind(req.website_age.as_deref())
        .bind(req.satisfaction_score)
        .bind(&req.frustrations)
        .bind(req.primary_goal.trim())
        .bind(req.competitors_better_flag())
        .bind(req.lost_business_flag())
        .bind(req.budget_range.trim())
        .bind(req.timeline.trim())
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("Created assessment {} for {}", assessment.id, assessment.company_name);
        Ok(assessment)
    }

    /// Loads a record by id.
    pub async fn get(&self, id: Uuid) -> Result<Option<Assessment>, AppError> {
        let assessment = sqlx::query_as::<_, Assessment>("SELECT * FROM assessments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(assessment)
    }

    /// Writes the five scores, the summary, the recommendation sequence
    /// and the completion flag in one update. This is the only writer of
    /// derived fields; the flag only ever moves false -> true.
    pub async fn save_analysis(
        &self,
        id: Uuid,
        analysis: &WebsiteAnalysis,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE assessments
            SET overall_score = $2,
                performance_score = $3,
                design_score = $4,
                seo_score = $5,
                mobile_score = $6,
                analysis_summary = $7,
                recommendations = $8,
                analysis_complete = true
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(analysis.overall_score)
        .bind(analysis.performance_score)
        .bind(analysis.design_score)
        .bind(analysis.seo_score)
        .bind(analysis.mobile_score)
        .bind(&analysis.analysis_summary)
        .bind(SqlJson(&analysis.recommendations))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Assessment {} not found for analysis update",
                id
            )));
        }

        Ok(())
    }

    /// Atomically claims the email-sent flag.
    ///
    /// Returns true when this call performed the claim; false when the
    /// flag was already set. Concurrent invocations on an unsent record
    /// therefore resolve to exactly one claimer.
    pub async fn mark_email_sent(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE assessments
            SET email_sent = true, email_sent_at = now()
            WHERE id = $1 AND email_sent = false
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Read-side storage for blog posts.
pub struct BlogStore {
    pool: PgPool,
}

impl BlogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Published posts, newest first, optionally filtered by category.
    pub async fn list_published(
        &self,
        category: Option<&str>,
    ) -> Result<Vec<BlogPost>, AppError> {
        let posts = match category {
            Some(category) => {
                sqlx::query_as::<_, BlogPost>(
                    r#"
                    SELECT * FROM blog_posts
                    WHERE status = 'published' AND category = $1
                    ORDER BY published_at DESC NULLS LAST
                    "#,
                )
                .bind(category)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, BlogPost>(
                    r#"
                    SELECT * FROM blog_posts
                    WHERE status = 'published'
                    ORDER BY published_at DESC NULLS LAST
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(posts)
    }

    /// The featured published post, if one is flagged.
    pub async fn featured(&self) -> Result<Option<BlogPost>, AppError> {
        let post = sqlx::query_as::<_, BlogPost>(
            r#"
            SELECT * FROM blog_posts
            WHERE status = 'published' AND featured = true
            ORDER BY published_at DESC NULLS LAST
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    /// A published post by slug.
    pub async fn get_published_by_slug(&self, slug: &str) -> Result<Option<BlogPost>, AppError> {
        let post = sqlx::query_as::<_, BlogPost>(
            "SELECT * FROM blog_posts WHERE slug = $1 AND status = 'published'",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    /// Up to `limit` published posts sharing a category, excluding `slug`.
    pub async fn related(
        &self,
        category: &str,
        slug: &str,
        limit: i64,
    ) -> Result<Vec<BlogPost>, AppError> {
        let posts = sqlx::query_as::<_, BlogPost>(
            r#"
            SELECT * FROM blog_posts
            WHERE status = 'published' AND category = $1 AND slug <> $2
            ORDER BY published_at DESC NULLS LAST
            LIMIT $3
            "#,
        )
        .bind(category)
        .bind(slug)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    /// Bumps the view counter. Best-effort; the read path ignores failures.
    pub async fn increment_view_count(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE blog_posts SET view_count = view_count + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
