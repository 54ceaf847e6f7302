use crate::config::test_helpers::setup_test_app;
use crate::test_helpers::{extract_response_body, send};
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

async fn post_json(app: &axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    extract_response_body(app.clone().oneshot(request).await.unwrap()).await
}

#[tokio::test]
async fn test_token_pair_refresh_and_me() {
    let app = setup_test_app().await;

    let (status, body) = post_json(
        &app.router,
        "/api/token",
        json!({"username": "collector", "password": "agent-password"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "Failed to obtain token: {body:?}");
    assert_eq!(body["user"]["username"], "collector");
    assert!(body["user"]["last_login"].is_string());
    assert!(body["user"].get("password_hash").is_none());
    let access = body["access"].as_str().unwrap().to_string();
    let refresh = body["refresh"].as_str().unwrap().to_string();

    let (status, me) = send(&app.router, "GET", "/api/me", &access, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "collector");
    assert_eq!(me["is_staff"], false);

    let (status, body) = post_json(&app.router, "/api/token/refresh", json!({"refresh": refresh})).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["access"].is_string());

    // An access token cannot be used as a refresh token.
    let (status, _) = post_json(&app.router, "/api/token/refresh", json!({"refresh": access})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_with_wrong_password() {
    let app = setup_test_app().await;

    let (status, body) = post_json(
        &app.router,
        "/api/token",
        json!({"username": "collector", "password": "wrong"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_login_form_sets_cookie_and_logout_clears_it() {
    let app = setup_test_app().await;

    let request = Request::builder()
        .method("POST")
        .uri("/users/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("username=collector&password=agent-password"))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response.headers()[header::LOCATION].to_str().unwrap().to_string();
    assert_eq!(location, "/users/profile");
    let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("access_token="));
    assert!(cookie.contains("HttpOnly"));
    let session = cookie.split(';').next().unwrap().to_string();

    // The redirect target exists and accepts the new session.
    let request = Request::builder()
        .method("GET")
        .uri(&location)
        .header(header::COOKIE, &session)
        .body(Body::empty())
        .unwrap();
    let (status, body) = extract_response_body(app.router.clone().oneshot(request).await.unwrap()).await;
    assert_eq!(status, StatusCode::OK, "Failed to follow login redirect: {body:?}");
    assert_eq!(body["username"], "collector");

    let request = Request::builder()
        .method("POST")
        .uri("/users/logout")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/users/login");
    assert!(
        response.headers()[header::SET_COOKIE]
            .to_str()
            .unwrap()
            .contains("Max-Age=0")
    );
}

#[tokio::test]
async fn test_profile_update() {
    let app = setup_test_app().await;
    let token = &app.user_token;

    let (status, body) = send(
        &app.router,
        "PUT",
        "/users/profile",
        token,
        Some(json!({"first_name": "Grace", "last_name": "Mbombo", "email": "grace@example.cd"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "Failed to update profile: {body:?}");
    assert_eq!(body["first_name"], "Grace");

    let (_, body) = send(&app.router, "GET", "/users/profile", token, None).await;
    assert_eq!(body["email"], "grace@example.cd");
    assert_eq!(body["is_staff"], false);
}

#[tokio::test]
async fn test_non_staff_is_redirected_from_admin_pages() {
    let app = setup_test_app().await;

    let request = Request::builder()
        .uri("/users/users")
        .header(header::AUTHORIZATION, format!("Bearer {}", app.user_token))
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/users/access-denied");

    let request = Request::builder()
        .uri("/users/access-denied")
        .body(Body::empty())
        .unwrap();
    let response = app.router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_staff_manages_users_and_groups() {
    let app = setup_test_app().await;
    let token = &app.staff_token;

    let (status, group) = send(
        &app.router,
        "POST",
        "/users/groups",
        token,
        Some(json!({"name": "Enquêteurs"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "Failed to create group: {group:?}");
    let group_id = group["id"].as_i64().unwrap();

    let (status, user) = send(
        &app.router,
        "POST",
        "/users/users",
        token,
        Some(json!({
            "username": "enqueteur1",
            "password": "premier-mot",
            "email": "enqueteur1@example.cd",
            "groups": [group_id]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "Failed to create user: {user:?}");
    assert_eq!(user["groups"], json!([group_id]));
    assert_eq!(user["is_active"], true);
    let user_id = user["id"].as_i64().unwrap();

    let (status, _) = send(
        &app.router,
        "POST",
        "/users/users",
        token,
        Some(json!({"username": "enqueteur1", "password": "autre"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &app.router,
        "PUT",
        &format!("/users/users/{user_id}"),
        token,
        Some(json!({"last_name": "Tshisekedi", "groups": []})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["last_name"], "Tshisekedi");
    assert_eq!(body["groups"], json!([]));

    let (status, body) = send(
        &app.router,
        "POST",
        &format!("/users/users/{user_id}/toggle-active"),
        token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_active"], false);

    // Inactive accounts cannot obtain tokens.
    let (status, _) = post_json(
        &app.router,
        "/api/token",
        json!({"username": "enqueteur1", "password": "premier-mot"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app.router,
        "PUT",
        &format!("/users/groups/{group_id}"),
        token,
        Some(json!({"name": "Superviseurs"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Superviseurs");

    let (_, groups) = send(&app.router, "GET", "/users/groups", token, None).await;
    assert_eq!(groups.as_array().unwrap().len(), 1);

    let (status, _) = send(&app.router, "DELETE", &format!("/users/users/{user_id}"), token, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, users) = send(&app.router, "GET", "/users/users", token, None).await;
    let names: Vec<&str> = users
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["collector", "reviewer"]);
}
