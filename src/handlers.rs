use crate::analysis::AnalysisService;
use crate::config::Config;
use crate::db_storage::{AssessmentStore, BlogStore};
use crate::errors::AppError;
use crate::mailer::Mailer;
use crate::models::{
    Assessment, AssessmentIdRequest, BlogPostDetail, PostListQuery, SubmitAssessmentRequest,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: PgPool,
    /// Application configuration.
    pub config: Config,
}

/// Health check endpoint.
///
/// Returns the service status, version, and health information.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "merchbase-api",
            "version": "0.1.0"
        })),
    )
}

/// POST /api/v1/assessments
///
/// Validates and inserts a questionnaire submission. Derived and
/// notification fields start unset; the caller follows up with the
/// analyze operation.
pub async fn submit_assessment(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SubmitAssessmentRequest>,
) -> Result<(StatusCode, Json<Assessment>), AppError> {
    tracing::info!("POST /assessments - company: {}", payload.company_name);

    payload.validate()?;

    let store = AssessmentStore::new(state.db.clone());
    let assessment = store.insert(&payload).await?;

    Ok((StatusCode::CREATED, Json(assessment)))
}

/// GET /api/v1/assessments/:id
///
/// Single-record read used by the results view poller.
pub async fn get_assessment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Assessment>, AppError> {
    let store = AssessmentStore::new(state.db.clone());
    let assessment = store
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Assessment with id {} not found", id)))?;

    Ok(Json(assessment))
}

/// POST /api/v1/assessments/analyze
///
/// Runs the scoring pipeline for an inserted assessment and returns the
/// structured analysis. The results email is triggered as a detached
/// task and cannot fail this response.
pub async fn analyze_assessment(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AssessmentIdRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let assessment_id = payload.parsed_id()?;
    tracing::info!("POST /assessments/analyze - id: {}", assessment_id);

    let service = AnalysisService::new(&state.config, state.db.clone());
    let analysis = service.analyze(assessment_id).await?;

    Ok(Json(json!({
        "success": true,
        "analysis": analysis,
    })))
}

/// POST /api/v1/assessments/send-email
///
/// Sends the results email for a completed assessment. Replays are safe:
/// an already-sent record is a no-op success.
pub async fn send_assessment_email(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AssessmentIdRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let assessment_id = payload.parsed_id()?;
    tracing::info!("POST /assessments/send-email - id: {}", assessment_id);

    let mailer = Mailer::new(&state.config, state.db.clone())?;
    let outcome = mailer.send_results_email(assessment_id).await?;
    tracing::info!("Email outcome for {}: {:?}", assessment_id, outcome);

    Ok(Json(json!({ "success": true })))
}

/// GET /api/v1/posts
///
/// Published blog posts, newest first, optionally filtered by category.
pub async fn list_posts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PostListQuery>,
) -> Result<Json<Vec<crate::models::BlogPost>>, AppError> {
    let store = BlogStore::new(state.db.clone());
    let category = params
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("all"));

    let posts = store.list_published(category).await?;
    Ok(Json(posts))
}

/// GET /api/v1/posts/featured
///
/// The featured published post.
pub async fn featured_post(
    State(state): State<Arc<AppState>>,
) -> Result<Json<crate::models::BlogPost>, AppError> {
    let store = BlogStore::new(state.db.clone());
    let post = store
        .featured()
        .await?
        .ok_or_else(|| AppError::NotFound("No featured post".to_string()))?;

    Ok(Json(post))
}

/// GET /api/v1/posts/:slug
///
/// A published post by slug, with up to three related posts from the
/// same category. Bumps the view counter; counter failures do not fail
/// the read.
pub async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<BlogPostDetail>, AppError> {
    let store = BlogStore::new(state.db.clone());
    let post = store
        .get_published_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post '{}' not found", slug)))?;

    if let Err(e) = store.increment_view_count(post.id).await {
        tracing::warn!("Failed to bump view count for '{}': {}", slug, e);
    }

    let related = store.related(&post.category, &post.slug, 3).await?;

    Ok(Json(BlogPostDetail { post, related }))
}
