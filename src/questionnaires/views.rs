use super::groupes::{self, Groupe, GroupeCreate};
use super::questions::{self, Question, QuestionCreate, options_for};
use super::services::{self, BulkQuestions};
use super::templates::{self, QuestionTemplate, QuestionTemplateCreate};
use crate::common::errors::{BusinessError, DbErrorExt};
use crate::common::models::EducationLevel;
use crate::common::state::AppState;
use crate::not_found;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use utoipa::IntoParams;
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

pub fn router(state: &AppState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(list_templates, create_template))
        .routes(routes!(get_template, update_template, delete_template))
        .routes(routes!(bulk_add_questions))
        .routes(routes!(list_questions, create_question))
        .routes(routes!(get_question, update_question, delete_question))
        .routes(routes!(list_groupes, create_groupe))
        .routes(routes!(get_groupe, update_groupe, delete_groupe))
        .with_state(state.clone())
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TemplateFilter {
    /// Education level
    pub r#type: Option<EducationLevel>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct QuestionFilter {
    pub template: Option<Uuid>,
    pub groupe: Option<i32>,
}

// Templates

async fn load_template(db: &DatabaseConnection, id: Uuid) -> Result<QuestionTemplate, BusinessError> {
    let template = templates::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| e.to_business_error("question_template"))?
        .ok_or_else(|| not_found!("question template", id))?;

    let questions = questions::Entity::find()
        .filter(questions::Column::TemplateId.eq(id))
        .order_by_asc(questions::Column::CreatedAt)
        .all(db)
        .await
        .map_err(|e| e.to_business_error("question"))?;

    Ok(QuestionTemplate::with_questions(template, questions))
}

#[utoipa::path(
    get,
    path = "/question-templates",
    params(TemplateFilter),
    responses((status = OK, body = Vec<QuestionTemplate>)),
    tag = "questionnaires"
)]
pub async fn list_templates(
    State(state): State<AppState>,
    Query(filter): Query<TemplateFilter>,
) -> Result<Json<Vec<QuestionTemplate>>, BusinessError> {
    let mut select = templates::Entity::find();
    if let Some(level) = filter.r#type {
        select = select.filter(templates::Column::Type.eq(level));
    }

    let rows = select
        .order_by_asc(templates::Column::Name)
        .order_by_asc(templates::Column::Id)
        .find_with_related(questions::Entity)
        .order_by_asc(questions::Column::CreatedAt)
        .all(&state.db)
        .await
        .map_err(|e| e.to_business_error("question_template"))?;

    Ok(Json(
        rows.into_iter()
            .map(|(template, questions)| QuestionTemplate::with_questions(template, questions))
            .collect(),
    ))
}

#[utoipa::path(
    post,
    path = "/question-templates",
    request_body = QuestionTemplateCreate,
    responses((status = CREATED, body = QuestionTemplate)),
    tag = "questionnaires"
)]
pub async fn create_template(
    State(state): State<AppState>,
    Json(payload): Json<QuestionTemplateCreate>,
) -> Result<(StatusCode, Json<QuestionTemplate>), BusinessError> {
    let now = Utc::now();
    let template = templates::ActiveModel {
        id: Set(Uuid::new_v4()),
        r#type: Set(payload.r#type),
        name: Set(payload.name),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await
    .map_err(|e| e.to_business_error("question_template"))?;

    Ok((
        StatusCode::CREATED,
        Json(QuestionTemplate::with_questions(template, Vec::new())),
    ))
}

#[utoipa::path(
    get,
    path = "/question-templates/{id}",
    params(("id" = Uuid, Path, description = "Template id")),
    responses((status = OK, body = QuestionTemplate), (status = NOT_FOUND)),
    tag = "questionnaires"
)]
pub async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<QuestionTemplate>, BusinessError> {
    Ok(Json(load_template(&state.db, id).await?))
}

#[utoipa::path(
    put,
    path = "/question-templates/{id}",
    params(("id" = Uuid, Path, description = "Template id")),
    request_body = QuestionTemplateCreate,
    responses((status = OK, body = QuestionTemplate), (status = NOT_FOUND)),
    tag = "questionnaires"
)]
pub async fn update_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<QuestionTemplateCreate>,
) -> Result<Json<QuestionTemplate>, BusinessError> {
    let existing = templates::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .map_err(|e| e.to_business_error("question_template"))?
        .ok_or_else(|| not_found!("question template", id))?;

    let mut active: templates::ActiveModel = existing.into();
    active.r#type = Set(payload.r#type);
    active.name = Set(payload.name);
    active.updated_at = Set(Utc::now());
    active
        .update(&state.db)
        .await
        .map_err(|e| e.to_business_error("question_template"))?;

    Ok(Json(load_template(&state.db, id).await?))
}

#[utoipa::path(
    delete,
    path = "/question-templates/{id}",
    params(("id" = Uuid, Path, description = "Template id")),
    responses((status = NO_CONTENT, description = "Template and its questions deleted"), (status = NOT_FOUND)),
    tag = "questionnaires"
)]
pub async fn delete_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, BusinessError> {
    services::delete_template(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/question-templates/{id}/questions",
    params(("id" = Uuid, Path, description = "Template id")),
    request_body = BulkQuestions,
    responses(
        (status = CREATED, body = Vec<Question>),
        (status = BAD_REQUEST, description = "Unknown question kind or groupe"),
        (status = NOT_FOUND)
    ),
    tag = "questionnaires"
)]
pub async fn bulk_add_questions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<BulkQuestions>,
) -> Result<(StatusCode, Json<Vec<Question>>), BusinessError> {
    let created = services::bulk_add_questions(&state.db, id, &payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

// Questions

#[utoipa::path(
    get,
    path = "/questions",
    params(QuestionFilter),
    responses((status = OK, body = Vec<Question>)),
    tag = "questionnaires"
)]
pub async fn list_questions(
    State(state): State<AppState>,
    Query(filter): Query<QuestionFilter>,
) -> Result<Json<Vec<Question>>, BusinessError> {
    let mut select = questions::Entity::find();
    if let Some(template) = filter.template {
        select = select.filter(questions::Column::TemplateId.eq(template));
    }
    if let Some(groupe) = filter.groupe {
        select = select.filter(questions::Column::GroupeId.eq(groupe));
    }

    let questions = select
        .order_by_asc(questions::Column::CreatedAt)
        .all(&state.db)
        .await
        .map_err(|e| e.to_business_error("question"))?;

    Ok(Json(questions.into_iter().map(Question::from).collect()))
}

#[utoipa::path(
    post,
    path = "/questions",
    request_body = QuestionCreate,
    responses((status = CREATED, body = Question)),
    tag = "questionnaires"
)]
pub async fn create_question(
    State(state): State<AppState>,
    Json(payload): Json<QuestionCreate>,
) -> Result<(StatusCode, Json<Question>), BusinessError> {
    let now = Utc::now();
    let question = questions::ActiveModel {
        id: Set(Uuid::new_v4()),
        template_id: Set(payload.template_id),
        groupe_id: Set(payload.groupe_id),
        text: Set(payload.text),
        kind: Set(payload.kind),
        options: Set(options_for(payload.kind, payload.options.into_list())),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await
    .map_err(|e| e.to_business_error("question"))?;

    Ok((StatusCode::CREATED, Json(question.into())))
}

async fn find_question(db: &DatabaseConnection, id: Uuid) -> Result<questions::Model, BusinessError> {
    questions::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| e.to_business_error("question"))?
        .ok_or_else(|| not_found!("question", id))
}

#[utoipa::path(
    get,
    path = "/questions/{id}",
    params(("id" = Uuid, Path, description = "Question id")),
    responses((status = OK, body = Question), (status = NOT_FOUND)),
    tag = "questionnaires"
)]
pub async fn get_question(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Question>, BusinessError> {
    Ok(Json(find_question(&state.db, id).await?.into()))
}

#[utoipa::path(
    put,
    path = "/questions/{id}",
    params(("id" = Uuid, Path, description = "Question id")),
    request_body = QuestionCreate,
    responses((status = OK, body = Question), (status = NOT_FOUND)),
    tag = "questionnaires"
)]
pub async fn update_question(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<QuestionCreate>,
) -> Result<Json<Question>, BusinessError> {
    let mut active: questions::ActiveModel = find_question(&state.db, id).await?.into();
    active.template_id = Set(payload.template_id);
    active.groupe_id = Set(payload.groupe_id);
    active.text = Set(payload.text);
    active.kind = Set(payload.kind);
    active.options = Set(options_for(payload.kind, payload.options.into_list()));
    active.updated_at = Set(Utc::now());

    let question = active
        .update(&state.db)
        .await
        .map_err(|e| e.to_business_error("question"))?;

    Ok(Json(question.into()))
}

#[utoipa::path(
    delete,
    path = "/questions/{id}",
    params(("id" = Uuid, Path, description = "Question id")),
    responses((status = NO_CONTENT), (status = NOT_FOUND)),
    tag = "questionnaires"
)]
pub async fn delete_question(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, BusinessError> {
    let result = questions::Entity::delete_by_id(id)
        .exec(&state.db)
        .await
        .map_err(|e| e.to_business_error("question"))?;

    if result.rows_affected == 0 {
        return Err(not_found!("question", id));
    }
    Ok(StatusCode::NO_CONTENT)
}

// Groupes

#[utoipa::path(
    get,
    path = "/groupes",
    responses((status = OK, description = "Groupes in display order", body = Vec<Groupe>)),
    tag = "questionnaires"
)]
pub async fn list_groupes(State(state): State<AppState>) -> Result<Json<Vec<Groupe>>, BusinessError> {
    let groupes = groupes::Entity::find()
        .order_by_asc(groupes::Column::Order)
        .order_by_asc(groupes::Column::Id)
        .all(&state.db)
        .await
        .map_err(|e| e.to_business_error("groupe"))?;

    Ok(Json(groupes.into_iter().map(Groupe::from).collect()))
}

#[utoipa::path(
    post,
    path = "/groupes",
    request_body = GroupeCreate,
    responses((status = CREATED, body = Groupe)),
    tag = "questionnaires"
)]
pub async fn create_groupe(
    State(state): State<AppState>,
    Json(payload): Json<GroupeCreate>,
) -> Result<(StatusCode, Json<Groupe>), BusinessError> {
    let groupe = groupes::ActiveModel {
        name: Set(payload.name),
        description: Set(payload.description),
        order: Set(payload.order),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| e.to_business_error("groupe"))?;

    Ok((StatusCode::CREATED, Json(groupe.into())))
}

async fn find_groupe(db: &DatabaseConnection, id: i32) -> Result<groupes::Model, BusinessError> {
    groupes::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| e.to_business_error("groupe"))?
        .ok_or_else(|| not_found!("groupe", id))
}

#[utoipa::path(
    get,
    path = "/groupes/{id}",
    params(("id" = i32, Path, description = "Groupe id")),
    responses((status = OK, body = Groupe), (status = NOT_FOUND)),
    tag = "questionnaires"
)]
pub async fn get_groupe(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Groupe>, BusinessError> {
    Ok(Json(find_groupe(&state.db, id).await?.into()))
}

#[utoipa::path(
    put,
    path = "/groupes/{id}",
    params(("id" = i32, Path, description = "Groupe id")),
    request_body = GroupeCreate,
    responses((status = OK, body = Groupe), (status = NOT_FOUND)),
    tag = "questionnaires"
)]
pub async fn update_groupe(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<GroupeCreate>,
) -> Result<Json<Groupe>, BusinessError> {
    let mut active: groupes::ActiveModel = find_groupe(&state.db, id).await?.into();
    active.name = Set(payload.name);
    active.description = Set(payload.description);
    active.order = Set(payload.order);

    let groupe = active
        .update(&state.db)
        .await
        .map_err(|e| e.to_business_error("groupe"))?;

    Ok(Json(groupe.into()))
}

#[utoipa::path(
    delete,
    path = "/groupes/{id}",
    params(("id" = i32, Path, description = "Groupe id")),
    responses((status = NO_CONTENT, description = "Groupe deleted, its questions ungrouped"), (status = NOT_FOUND)),
    tag = "questionnaires"
)]
pub async fn delete_groupe(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, BusinessError> {
    services::delete_groupe(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
