use crate::config::test_helpers::setup_test_app;
use crate::test_helpers::{extract_response_body, send};
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use tower::ServiceExt;

#[tokio::test]
async fn test_healthz_needs_no_credentials() {
    let app = setup_test_app().await;

    let request = Request::builder().uri("/healthz").body(Body::empty()).unwrap();
    let (status, body) = extract_response_body(app.router.oneshot(request).await.unwrap()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_anonymous_api_client_gets_401() {
    let app = setup_test_app().await;

    let request = Request::builder().uri("/api/provinces").body(Body::empty()).unwrap();
    let (status, body) = extract_response_body(app.router.oneshot(request).await.unwrap()).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_anonymous_browser_is_redirected_to_login() {
    let app = setup_test_app().await;

    let request = Request::builder()
        .uri("/api/schools")
        .header(header::ACCEPT, "text/html,application/xhtml+xml")
        .body(Body::empty())
        .unwrap();
    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/users/login");
}

#[tokio::test]
async fn test_garbage_token_is_rejected() {
    let app = setup_test_app().await;

    let (status, _) = send(&app.router, "GET", "/api/provinces", "not-a-jwt", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_cookie_authenticates_api_calls() {
    let app = setup_test_app().await;

    let request = Request::builder()
        .uri("/api/provinces")
        .header(header::COOKIE, format!("access_token={}", app.user_token))
        .body(Body::empty())
        .unwrap();
    let (status, body) = extract_response_body(app.router.oneshot(request).await.unwrap()).await;

    assert_eq!(status, StatusCode::OK, "Cookie auth failed: {body:?}");
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_api_docs_are_served() {
    let app = setup_test_app().await;

    let request = Request::builder().uri("/api/docs").body(Body::empty()).unwrap();
    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
