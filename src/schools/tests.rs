use crate::config::test_helpers::setup_test_app;
use crate::test_helpers::{
    create_test_geography, create_test_recolte, create_test_school, send,
};
use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_school_crud_operations() {
    let app = setup_test_app().await;
    let token = &app.staff_token;
    let geography = create_test_geography(&app.router, token).await;

    let school = create_test_school(&app.router, token, geography, "EP Lumumba", "ADM-100").await;
    let id = school["id"].as_i64().unwrap();
    assert!(school["province_name"].as_str().unwrap().starts_with("Province "));
    assert!(school["division_name"].as_str().unwrap().starts_with("Division "));
    assert!(school["sub_division_name"].as_str().unwrap().starts_with("Sous-division "));
    assert!(school["geo_coord"].is_null());

    let (status, body) = send(
        &app.router,
        "PATCH",
        &format!("/api/schools/{id}"),
        token,
        Some(json!({"head_name": "Ilunga Banza", "latitude": "-4.33", "longitude": "15.31"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "Failed to patch school: {body:?}");
    assert_eq!(body["head_name"], "Ilunga Banza");
    assert_eq!(body["name"], "EP Lumumba");
    assert_eq!(body["geo_coord"], json!({"lat": -4.33, "lng": 15.31}));

    let (status, body) = send(
        &app.router,
        "PATCH",
        &format!("/api/schools/{id}"),
        token,
        Some(json!({"geo_coord": null})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["geo_coord"].is_null());

    let (status, body) = send(&app.router, "GET", &format!("/api/schools/{id}"), token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["adm_code"], "ADM-100");
    assert_eq!(body["management_regime"], "Catholique");

    let (status, _) = send(&app.router, "DELETE", &format!("/api/schools/{id}"), token, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app.router, "GET", &format!("/api/schools/{id}"), token, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duplicate_adm_code_is_rejected() {
    let app = setup_test_app().await;
    let token = &app.staff_token;
    let geography = create_test_geography(&app.router, token).await;
    let school = create_test_school(&app.router, token, geography, "EP Uzima", "ADM-DUP").await;

    let mut duplicate = school.clone();
    duplicate["name"] = json!("EP Uzima bis");
    let (status, body) = send(&app.router, "POST", "/api/schools", token, Some(duplicate)).await;

    assert_eq!(status, StatusCode::CONFLICT, "Expected duplicate error: {body:?}");
    assert_eq!(body["error"]["code"], "DUPLICATE_RESOURCE");
}

#[tokio::test]
async fn test_school_full_update_sets_geo_coord_from_coordinates() {
    let app = setup_test_app().await;
    let token = &app.staff_token;
    let geography = create_test_geography(&app.router, token).await;
    let school = create_test_school(&app.router, token, geography, "EP Tumaini", "ADM-200").await;

    let mut replacement = school.clone();
    replacement["latitude"] = json!(-11.66);
    replacement["longitude"] = json!("");
    replacement["village"] = json!("Kasumbalesa");
    let (status, body) = send(
        &app.router,
        "PUT",
        &format!("/api/schools/{}", school["id"]),
        token,
        Some(replacement.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "Failed to update school: {body:?}");
    assert!(body["geo_coord"].is_null());
    assert_eq!(body["village"], "Kasumbalesa");

    replacement["longitude"] = json!(27.48);
    let (_, body) = send(
        &app.router,
        "PUT",
        &format!("/api/schools/{}", school["id"]),
        token,
        Some(replacement),
    )
    .await;
    assert_eq!(body["geo_coord"], json!({"lat": -11.66, "lng": 27.48}));
}

#[tokio::test]
async fn test_school_patch_with_single_coordinate_is_rejected() {
    let app = setup_test_app().await;
    let token = &app.staff_token;
    let geography = create_test_geography(&app.router, token).await;
    let school = create_test_school(&app.router, token, geography, "EP Lisanga", "ADM-300").await;
    let uri = format!("/api/schools/{}", school["id"]);

    let (status, body) = send(&app.router, "PATCH", &uri, token, Some(json!({"latitude": "-4.3"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "Expected validation error: {body:?}");
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, body) = send(
        &app.router,
        "PATCH",
        &uri,
        token,
        Some(json!({"latitude": "-4.3", "longitude": "15.3"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "Failed to patch school: {body:?}");
    assert_eq!(body["geo_coord"], json!({"lat": -4.3, "lng": 15.3}));
}

#[tokio::test]
async fn test_school_list_filters_search_and_pagination() {
    let app = setup_test_app().await;
    let token = &app.staff_token;
    let first = create_test_geography(&app.router, token).await;
    let second = create_test_geography(&app.router, token).await;

    for index in 0..12 {
        create_test_school(
            &app.router,
            token,
            first,
            &format!("EP Mwinda {index:02}"),
            &format!("ADM-A{index:02}"),
        )
        .await;
    }
    create_test_school(&app.router, token, second, "Lycée Bosangani", "ADM-B01").await;

    let (status, body) = send(&app.router, "GET", "/api/schools", token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 13);
    assert_eq!(body["items"].as_array().unwrap().len(), 10);
    assert_eq!(body["pages"], 2);

    let (_, body) = send(&app.router, "GET", "/api/schools?page=2", token, None).await;
    assert_eq!(body["items"].as_array().unwrap().len(), 3);

    let (_, body) = send(
        &app.router,
        "GET",
        &format!("/api/schools?division={}", second.division_id),
        token,
        None,
    )
    .await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["adm_code"], "ADM-B01");

    let (_, body) = send(&app.router, "GET", "/api/schools?search=bosang", token, None).await;
    assert_eq!(body["total"], 1);

    let (_, body) = send(
        &app.router,
        "GET",
        "/api/schools?ordering=-name&page_size=2",
        token,
        None,
    )
    .await;
    assert_eq!(body["items"][0]["name"], "Lycée Bosangani");
    assert_eq!(body["items"][1]["name"], "EP Mwinda 11");

    let (_, body) = send(
        &app.router,
        "GET",
        "/api/schools?mechanized_status=non_mecanise",
        token,
        None,
    )
    .await;
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn test_sync_endpoints() {
    let app = setup_test_app().await;
    let token = &app.staff_token;
    let geography = create_test_geography(&app.router, token).await;
    create_test_school(&app.router, token, geography, "EP Amani", "ADM-S1").await;
    create_test_school(&app.router, token, geography, "EP Bondeko", "ADM-S2").await;

    let (status, body) = send(
        &app.router,
        "POST",
        "/api/schools/sync-by-codes",
        token,
        Some(json!({"codes": []})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (_, body) = send(
        &app.router,
        "POST",
        "/api/schools/sync-by-codes",
        token,
        Some(json!({"codes": ["ADM-S2", "UNKNOWN"]})),
    )
    .await;
    let matches = body.as_array().unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0]["name"], "EP Bondeko");

    let (status, body) = send(&app.router, "GET", "/api/schools-sync", token, None).await;
    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["adm_code"], "ADM-S1");
    assert!(entries[0]["updated_at"].is_string());
}

#[tokio::test]
async fn test_map_lists_only_located_schools() {
    let app = setup_test_app().await;
    let token = &app.staff_token;
    let geography = create_test_geography(&app.router, token).await;
    let located = create_test_school(&app.router, token, geography, "EP Mapendo", "ADM-M1").await;
    create_test_school(&app.router, token, geography, "EP Kivuvu", "ADM-M2").await;

    send(
        &app.router,
        "PATCH",
        &format!("/api/schools/{}", located["id"]),
        token,
        Some(json!({"geo_coord": {"lat": -1.67, "lng": 29.22}})),
    )
    .await;

    let (status, body) = send(&app.router, "GET", "/api/schools/map", token, None).await;
    assert_eq!(status, StatusCode::OK);
    let markers = body.as_array().unwrap();
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0]["adm_code"], "ADM-M1");
    assert_eq!(markers[0]["geo_coord"]["lat"], -1.67);
}

#[tokio::test]
async fn test_deleting_school_removes_its_recoltes() {
    let app = setup_test_app().await;
    let token = &app.staff_token;
    let geography = create_test_geography(&app.router, token).await;
    let school = create_test_school(&app.router, token, geography, "EP Kesho", "ADM-R1").await;
    let school_id = school["id"].as_i64().unwrap();
    let recolte = create_test_recolte(&app.router, token, school_id).await;

    let (status, _) = send(&app.router, "DELETE", &format!("/api/schools/{school_id}"), token, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app.router,
        "GET",
        &format!("/api/recoltes/{}", recolte["id"].as_str().unwrap()),
        token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
