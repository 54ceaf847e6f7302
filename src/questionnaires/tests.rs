use crate::config::test_helpers::setup_test_app;
use crate::test_helpers::{create_test_template, send};
use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_bulk_add_truncates_mismatched_lists() {
    let app = setup_test_app().await;
    let token = &app.staff_token;
    let template_id = create_test_template(&app.router, token, "primaire").await;

    let (status, body) = send(
        &app.router,
        "POST",
        &format!("/api/question-templates/{template_id}/questions"),
        token,
        Some(json!({
            "text": ["Nombre de salles", "Latrines ?", "Observations"],
            "kind": ["number", "choice"],
            "options": ["", "Oui, Non", ""],
            "groupe": ["", "", ""]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "Bulk add failed: {body:?}");
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (_, template) = send(
        &app.router,
        "GET",
        &format!("/api/question-templates/{template_id}"),
        token,
        None,
    )
    .await;
    let questions = template["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 2);
    let choice = questions.iter().find(|q| q["kind"] == "choice").unwrap();
    assert_eq!(choice["options"], json!(["Oui", "Non"]));
}

#[tokio::test]
async fn test_bulk_add_with_only_texts_and_kinds() {
    let app = setup_test_app().await;
    let token = &app.staff_token;
    let template_id = create_test_template(&app.router, token, "primaire").await;

    let (status, body) = send(
        &app.router,
        "POST",
        &format!("/api/question-templates/{template_id}/questions"),
        token,
        Some(json!({
            "text": ["Effectif filles", "Effectif garçons", "Remarques"],
            "kind": ["text", "number"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "Bulk add failed: {body:?}");
    let created = body.as_array().unwrap();
    assert_eq!(created.len(), 2);
    assert!(created.iter().all(|q| q["groupe_id"].is_null()));
    assert!(created.iter().all(|q| q["options"] == json!([])));

    let (_, questions) = send(
        &app.router,
        "GET",
        &format!("/api/questions?template={template_id}"),
        token,
        None,
    )
    .await;
    assert_eq!(questions.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_bulk_add_with_unknown_kind_creates_nothing() {
    let app = setup_test_app().await;
    let token = &app.staff_token;
    let template_id = create_test_template(&app.router, token, "secondaire").await;

    let (status, body) = send(
        &app.router,
        "POST",
        &format!("/api/question-templates/{template_id}/questions"),
        token,
        Some(json!({
            "text": ["Effectif", "Date"],
            "kind": ["number", "date"],
            "options": ["", ""],
            "groupe": ["", ""]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (_, questions) = send(
        &app.router,
        "GET",
        &format!("/api/questions?template={template_id}"),
        token,
        None,
    )
    .await;
    assert_eq!(questions, json!([]));
}

#[tokio::test]
async fn test_bulk_add_to_missing_template_is_not_found() {
    let app = setup_test_app().await;

    let (status, _) = send(
        &app.router,
        "POST",
        &format!("/api/question-templates/{}/questions", uuid::Uuid::new_v4()),
        &app.staff_token,
        Some(json!({"text": ["A"], "kind": ["text"], "options": [""], "groupe": [""]})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleting_template_removes_questions() {
    let app = setup_test_app().await;
    let token = &app.staff_token;
    let template_id = create_test_template(&app.router, token, "pre-scolaire").await;

    let (status, question) = send(
        &app.router,
        "POST",
        "/api/questions",
        token,
        Some(json!({
            "template_id": template_id,
            "text": "Source d'eau",
            "kind": "choice",
            "options": "Robinet, Puits, ,Rivière"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "Failed to create question: {question:?}");
    assert_eq!(question["options"], json!(["Robinet", "Puits", "Rivière"]));

    let (status, _) = send(
        &app.router,
        "DELETE",
        &format!("/api/question-templates/{template_id}"),
        token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app.router,
        "GET",
        &format!("/api/questions/{}", question["id"].as_str().unwrap()),
        token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_template_list_filters_by_type() {
    let app = setup_test_app().await;
    let token = &app.staff_token;
    create_test_template(&app.router, token, "primaire").await;
    create_test_template(&app.router, token, "secondaire").await;

    let (status, body) = send(&app.router, "GET", "/api/question-templates?type=secondaire", token, None).await;
    assert_eq!(status, StatusCode::OK);
    let templates = body.as_array().unwrap();
    assert_eq!(templates.len(), 1);
    assert_eq!(templates[0]["type"], "secondaire");
    assert_eq!(templates[0]["questions"], json!([]));

    let (status, _) = send(
        &app.router,
        "POST",
        "/api/question-templates",
        token,
        Some(json!({"type": "universitaire", "name": "Hors champ"})),
    )
    .await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_question_update_and_non_choice_options() {
    let app = setup_test_app().await;
    let token = &app.staff_token;
    let template_id = create_test_template(&app.router, token, "primaire").await;

    let (_, question) = send(
        &app.router,
        "POST",
        "/api/questions",
        token,
        Some(json!({
            "template_id": template_id,
            "text": "Nombre d'enseignants",
            "kind": "number",
            "options": ["ignored"]
        })),
    )
    .await;
    assert_eq!(question["options"], json!([]));

    let (status, updated) = send(
        &app.router,
        "PUT",
        &format!("/api/questions/{}", question["id"].as_str().unwrap()),
        token,
        Some(json!({
            "template_id": template_id,
            "text": "Enseignants qualifiés ?",
            "kind": "choice",
            "options": ["Oui", "Non"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "Failed to update question: {updated:?}");
    assert_eq!(updated["kind"], "choice");
    assert_eq!(updated["options"], json!(["Oui", "Non"]));
}

#[tokio::test]
async fn test_groupes_ordering_and_delete_ungroups_questions() {
    let app = setup_test_app().await;
    let token = &app.staff_token;
    let template_id = create_test_template(&app.router, token, "primaire").await;

    let (_, infrastructure) = send(
        &app.router,
        "POST",
        "/api/groupes",
        token,
        Some(json!({"name": "Infrastructure", "order": 2})),
    )
    .await;
    let (_, identification) = send(
        &app.router,
        "POST",
        "/api/groupes",
        token,
        Some(json!({"name": "Identification", "description": "Section A", "order": 1})),
    )
    .await;

    let (_, body) = send(&app.router, "GET", "/api/groupes", token, None).await;
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Identification", "Infrastructure"]);

    let groupe_id = infrastructure["id"].as_i64().unwrap();
    let (status, created) = send(
        &app.router,
        "POST",
        &format!("/api/question-templates/{template_id}/questions"),
        token,
        Some(json!({
            "text": ["Toiture en bon état ?"],
            "kind": ["choice"],
            "options": ["Oui,Non"],
            "groupe": [groupe_id]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created[0]["groupe_id"], groupe_id);

    let (_, filtered) = send(
        &app.router,
        "GET",
        &format!("/api/questions?groupe={groupe_id}"),
        token,
        None,
    )
    .await;
    assert_eq!(filtered.as_array().unwrap().len(), 1);

    let (status, _) = send(&app.router, "DELETE", &format!("/api/groupes/{groupe_id}"), token, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, question) = send(
        &app.router,
        "GET",
        &format!("/api/questions/{}", created[0]["id"].as_str().unwrap()),
        token,
        None,
    )
    .await;
    assert!(question["groupe_id"].is_null());

    let (status, renamed) = send(
        &app.router,
        "PUT",
        &format!("/api/groupes/{}", identification["id"]),
        token,
        Some(json!({"name": "Identification de l'école", "order": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(renamed["description"].is_null());
}
