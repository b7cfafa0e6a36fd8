/// Tests for the results-view polling client against a mocked API.
use chrono::Utc;
use merchbase_api::models::{Assessment, Recommendation, SubmitAssessmentRequest};
use merchbase_api::poller::{AssessmentClient, PollConfig, PollResult, PollState};
use sqlx::types::Json as SqlJson;
use std::time::Duration;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn assessment(id: Uuid, complete: bool) -> Assessment {
    Assessment {
        id,
        company_name: "Acme".to_string(),
        industry: "Accounting Firm".to_string(),
        email: "a@b.com".to_string(),
        website_url: None,
        website_age: None,
        satisfaction_score: None,
        frustrations: vec!["Looks outdated".to_string()],
        primary_goal: "leads".to_string(),
        competitors_better: true,
        lost_business: true,
        budget_range: "10k-20k".to_string(),
        timeline: "asap".to_string(),
        overall_score: complete.then_some(58),
        performance_score: complete.then_some(55),
        design_score: complete.then_some(48),
        seo_score: complete.then_some(70),
        mobile_score: complete.then_some(66),
        analysis_summary: complete.then(|| "Dated and slow.".to_string()),
        recommendations: complete.then(|| {
            SqlJson(vec![Recommendation {
                category: "Design".to_string(),
                issue: "Dated layout".to_string(),
                impact: "Visitors bounce".to_string(),
                solution: "Redesign".to_string(),
            }])
        }),
        analysis_complete: complete,
        email_sent: false,
        email_sent_at: None,
        created_at: Utc::now(),
    }
}

fn record_path(id: Uuid) -> String {
    format!("/api/v1/assessments/{}", id)
}

/// Short timings so the tests run in well under a second.
fn fast_config() -> PollConfig {
    PollConfig {
        interval: Duration::from_millis(25),
        ceiling: Duration::from_millis(200),
    }
}

#[tokio::test]
async fn ready_on_first_read_issues_single_request() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path(record_path(id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(assessment(id, true)))
        .expect(1)
        .mount(&server)
        .await;

    let client = AssessmentClient::new(server.uri()).unwrap();
    let result = client.await_results(id, fast_config()).await.unwrap();

    match result {
        PollResult::Ready(record) => assert!(record.analysis_complete),
        PollResult::TimedOut => panic!("expected ready"),
    }
}

#[tokio::test]
async fn polls_until_completion_flag_is_observed() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();

    // Two incomplete reads, then the record completes
    Mock::given(method("GET"))
        .and(path(record_path(id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(assessment(id, false)))
        .up_to_n_times(3)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(record_path(id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(assessment(id, true)))
        .mount(&server)
        .await;

    let client = AssessmentClient::new(server.uri()).unwrap();
    let config = PollConfig {
        interval: Duration::from_millis(25),
        ceiling: Duration::from_secs(5),
    };
    let result = client.await_results(id, config).await.unwrap();

    assert_eq!(result.state(), PollState::Ready);
}

#[tokio::test]
async fn times_out_at_ceiling_and_stops_reading() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();

    // The record never completes
    Mock::given(method("GET"))
        .and(path(record_path(id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(assessment(id, false)))
        .mount(&server)
        .await;

    let client = AssessmentClient::new(server.uri()).unwrap();
    let started = std::time::Instant::now();
    let result = client.await_results(id, fast_config()).await.unwrap();

    assert_eq!(result.state(), PollState::Error);
    // Terminal no later than the ceiling, give or take scheduling slack
    assert!(started.elapsed() < Duration::from_millis(500));

    // No further reads once the poller reached its terminal state
    let reads_at_timeout = server.received_requests().await.unwrap().len();
    tokio::time::sleep(Duration::from_millis(150)).await;
    let reads_after_wait = server.received_requests().await.unwrap().len();
    assert_eq!(reads_at_timeout, reads_after_wait);
}

#[tokio::test]
async fn first_read_failure_is_surfaced() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path(record_path(id)))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(serde_json::json!({"error": "Assessment not found"})),
        )
        .mount(&server)
        .await;

    let client = AssessmentClient::new(server.uri()).unwrap();
    let result = client.await_results(id, fast_config()).await;

    assert!(result.is_err());
}

#[tokio::test]
async fn transient_poll_errors_are_tolerated() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();

    // First read incomplete, one transient server error, then complete
    Mock::given(method("GET"))
        .and(path(record_path(id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(assessment(id, false)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(record_path(id)))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(record_path(id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(assessment(id, true)))
        .mount(&server)
        .await;

    let client = AssessmentClient::new(server.uri()).unwrap();
    let config = PollConfig {
        interval: Duration::from_millis(25),
        ceiling: Duration::from_secs(5),
    };
    let result = client.await_results(id, config).await.unwrap();

    assert_eq!(result.state(), PollState::Ready);
}

#[tokio::test]
async fn submit_flow_inserts_then_triggers_analysis() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/api/v1/assessments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(assessment(id, false)))
        .expect(1)
        .mount(&server)
        .await;

    let analyze_body = serde_json::json!({
        "success": true,
        "analysis": {
            "overall_score": 58,
            "performance_score": 55,
            "design_score": 48,
            "seo_score": 70,
            "mobile_score": 66,
            "analysis_summary": "Dated and slow.",
            "recommendations": [
                {"category": "Design", "issue": "a", "impact": "b", "solution": "c"},
                {"category": "SEO", "issue": "a", "impact": "b", "solution": "c"},
                {"category": "Mobile", "issue": "a", "impact": "b", "solution": "c"},
                {"category": "Content", "issue": "a", "impact": "b", "solution": "c"}
            ]
        }
    });
    Mock::given(method("POST"))
        .and(path("/api/v1/assessments/analyze"))
        .respond_with(ResponseTemplate::new(200).set_body_json(analyze_body))
        .expect(1)
        .mount(&server)
        .await;

    let request = SubmitAssessmentRequest {
        company_name: "Acme".to_string(),
        industry: "Accounting Firm".to_string(),
        email: "a@b.com".to_string(),
        website_url: None,
        website_age: None,
        satisfaction_score: None,
        frustrations: vec!["Looks outdated".to_string()],
        primary_goal: "leads".to_string(),
        competitors_better: "yes".to_string(),
        lost_business: "yes".to_string(),
        budget_range: "10k-20k".to_string(),
        timeline: "asap".to_string(),
    };

    let client = AssessmentClient::new(server.uri()).unwrap();
    let created = client.submit_and_analyze(&request).await.unwrap();

    assert_eq!(created.id, id);
    assert!(!created.analysis_complete);
}

#[tokio::test]
async fn submit_flow_surfaces_analyze_failure() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/api/v1/assessments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(assessment(id, false)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/assessments/analyze"))
        .respond_with(
            ResponseTemplate::new(502).set_body_json(serde_json::json!({"error": "External service error"})),
        )
        .mount(&server)
        .await;

    let request = SubmitAssessmentRequest {
        company_name: "Acme".to_string(),
        industry: "Accounting Firm".to_string(),
        email: "a@b.com".to_string(),
        website_url: None,
        website_age: None,
        satisfaction_score: None,
        frustrations: vec!["Looks outdated".to_string()],
        primary_goal: "leads".to_string(),
        competitors_better: "yes".to_string(),
        lost_business: "yes".to_string(),
        budget_range: "10k-20k".to_string(),
        timeline: "asap".to_string(),
    };

    let client = AssessmentClient::new(server.uri()).unwrap();
    let result = client.submit_and_analyze(&request).await;

    assert!(result.is_err());
}
