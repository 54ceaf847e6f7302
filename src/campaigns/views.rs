use super::models::{self as campaigns, Campaign, CampaignCreate};
use super::services;
use crate::common::errors::{BusinessError, DbErrorExt};
use crate::common::state::AppState;
use crate::not_found;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use sea_orm::{EntityTrait, QueryOrder};
use utoipa_axum::{router::OpenApiRouter, routes};

pub fn router(state: &AppState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(list_campaigns, create_campaign))
        .routes(routes!(get_campaign, update_campaign, delete_campaign))
        .with_state(state.clone())
}

#[utoipa::path(
    get,
    path = "/campaigns",
    responses((status = OK, description = "Campaigns, most recent first", body = Vec<Campaign>)),
    tag = "campaigns"
)]
pub async fn list_campaigns(
    State(state): State<AppState>,
) -> Result<Json<Vec<Campaign>>, BusinessError> {
    let rows = campaigns::Entity::find()
        .order_by_desc(campaigns::Column::StartDate)
        .order_by_asc(campaigns::Column::Id)
        .all(&state.db)
        .await
        .map_err(|e| e.to_business_error("campaign"))?;

    Ok(Json(services::with_details(&state.db, rows).await?))
}

#[utoipa::path(
    post,
    path = "/campaigns",
    request_body = CampaignCreate,
    responses(
        (status = CREATED, body = Campaign),
        (status = BAD_REQUEST, description = "Unknown question template")
    ),
    tag = "campaigns"
)]
pub async fn create_campaign(
    State(state): State<AppState>,
    Json(payload): Json<CampaignCreate>,
) -> Result<(StatusCode, Json<Campaign>), BusinessError> {
    let id = services::save_campaign(&state.db, None, payload).await?;
    tracing::info!(id, "Created campaign");
    Ok((
        StatusCode::CREATED,
        Json(services::load_campaign(&state.db, id).await?),
    ))
}

#[utoipa::path(
    get,
    path = "/campaigns/{id}",
    params(("id" = i32, Path, description = "Campaign id")),
    responses((status = OK, body = Campaign), (status = NOT_FOUND)),
    tag = "campaigns"
)]
pub async fn get_campaign(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Campaign>, BusinessError> {
    Ok(Json(services::load_campaign(&state.db, id).await?))
}

#[utoipa::path(
    put,
    path = "/campaigns/{id}",
    params(("id" = i32, Path, description = "Campaign id")),
    request_body = CampaignCreate,
    responses((status = OK, body = Campaign), (status = NOT_FOUND)),
    tag = "campaigns"
)]
pub async fn update_campaign(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<CampaignCreate>,
) -> Result<Json<Campaign>, BusinessError> {
    let existing = campaigns::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .map_err(|e| e.to_business_error("campaign"))?
        .ok_or_else(|| not_found!("campaign", id))?;

    services::save_campaign(&state.db, Some(existing), payload).await?;
    Ok(Json(services::load_campaign(&state.db, id).await?))
}

#[utoipa::path(
    delete,
    path = "/campaigns/{id}",
    params(("id" = i32, Path, description = "Campaign id")),
    responses((status = NO_CONTENT), (status = NOT_FOUND)),
    tag = "campaigns"
)]
pub async fn delete_campaign(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, BusinessError> {
    services::delete_campaign(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
