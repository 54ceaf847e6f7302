/// Shared helpers for the API tests.
///
/// Builders follow the registry hierarchy:
/// Province → Division → SubDivision → School → Recolte
/// and QuestionTemplate → Question.
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

/// Extract response body as JSON for testing
pub async fn extract_response_body(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    let body: Value = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| json!({"error": "Invalid JSON response"}));
    (status, body)
}

/// Sends an authenticated JSON request and returns the decoded response.
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {token}"));

    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    extract_response_body(app.clone().oneshot(request).await.unwrap()).await
}

/// Ids of a freshly created province/division/sub-division chain.
#[derive(Debug, Clone, Copy)]
pub struct TestGeography {
    pub province_id: i64,
    pub division_id: i64,
    pub sub_division_id: i64,
}

pub async fn create_test_province(app: &Router, token: &str, name: &str) -> i64 {
    let (status, body) = send(
        app,
        "POST",
        "/api/provinces",
        token,
        Some(json!({"name": name, "code": format!("P-{name}")})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "Failed to create province: {body:?}");
    body["id"].as_i64().unwrap()
}

pub async fn create_test_geography(app: &Router, token: &str) -> TestGeography {
    let suffix = &Uuid::new_v4().simple().to_string()[..8];
    let province_id = create_test_province(app, token, &format!("Province {suffix}")).await;

    let (status, division) = send(
        app,
        "POST",
        "/api/divisions",
        token,
        Some(json!({"province_id": province_id, "name": format!("Division {suffix}")})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "Failed to create division: {division:?}");
    let division_id = division["id"].as_i64().unwrap();

    let (status, sub_division) = send(
        app,
        "POST",
        "/api/sub-divisions",
        token,
        Some(json!({
            "division_id": division_id,
            "code": format!("SD-{suffix}"),
            "name": format!("Sous-division {suffix}")
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "Failed to create sub-division: {sub_division:?}");

    TestGeography {
        province_id,
        division_id,
        sub_division_id: sub_division["id"].as_i64().unwrap(),
    }
}

pub async fn create_test_school(
    app: &Router,
    token: &str,
    geography: TestGeography,
    name: &str,
    adm_code: &str,
) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/api/schools",
        token,
        Some(json!({
            "name": name,
            "address": "Avenue de la Paix 12",
            "head_name": "Mbuyi Kalala",
            "head_phone": "+243810000000",
            "adm_code": adm_code,
            "legal_reference": "ARR-2019-001",
            "secope_number": "SEC-001",
            "province_id": geography.province_id,
            "division_id": geography.division_id,
            "sub_division_id": geography.sub_division_id,
            "management_regime": "Catholique",
            "mechanized_status": "mecanise_paye",
            "ownership_status": "proprietaire",
            "environment": "urbain",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "Failed to create school: {body:?}");
    body
}

pub async fn create_test_template(app: &Router, token: &str, level: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/question-templates",
        token,
        Some(json!({"type": level, "name": format!("Questionnaire {level}")})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "Failed to create template: {body:?}");
    body["id"].as_str().unwrap().to_string()
}

pub async fn create_test_recolte(app: &Router, token: &str, school_id: i64) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/api/recoltes",
        token,
        Some(json!({
            "establishment_id": school_id,
            "date": "2025-03-14T09:30:00Z",
            "collector_name": "Agent Kabila",
            "type": "primaire",
            "answers": {"q1": "Oui"}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "Failed to create recolte: {body:?}");
    body
}
