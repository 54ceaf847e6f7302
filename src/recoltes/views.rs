use super::models::{self as recoltes, Recolte, RecolteCreate, RecolteStatus};
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
        .routes(routes!(list_recoltes, create_recolte))
        .routes(routes!(get_recolte, update_recolte, delete_recolte))
        .routes(routes!(validate_recolte))
        .routes(routes!(reject_recolte))
        .with_state(state.clone())
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecolteFilter {
    pub r#type: Option<EducationLevel>,
    pub status: Option<RecolteStatus>,
    /// School id
    pub establishment: Option<i32>,
    pub campaign: Option<i32>,
}

async fn find_recolte(db: &DatabaseConnection, id: Uuid) -> Result<recoltes::Model, BusinessError> {
    recoltes::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| e.to_business_error("recolte"))?
        .ok_or_else(|| not_found!("recolte", id))
}

#[utoipa::path(
    get,
    path = "/recoltes",
    params(RecolteFilter),
    responses((status = OK, description = "Recoltes, most recent first", body = Vec<Recolte>)),
    tag = "recoltes"
)]
pub async fn list_recoltes(
    State(state): State<AppState>,
    Query(filter): Query<RecolteFilter>,
) -> Result<Json<Vec<Recolte>>, BusinessError> {
    let mut select = recoltes::Entity::find();
    if let Some(level) = filter.r#type {
        select = select.filter(recoltes::Column::Type.eq(level));
    }
    if let Some(status) = filter.status {
        select = select.filter(recoltes::Column::Status.eq(status));
    }
    if let Some(school) = filter.establishment {
        select = select.filter(recoltes::Column::EstablishmentId.eq(school));
    }
    if let Some(campaign) = filter.campaign {
        select = select.filter(recoltes::Column::CampaignId.eq(campaign));
    }

    let rows = select
        .order_by_desc(recoltes::Column::Date)
        .all(&state.db)
        .await
        .map_err(|e| e.to_business_error("recolte"))?;

    Ok(Json(rows.into_iter().map(Recolte::from).collect()))
}

#[utoipa::path(
    post,
    path = "/recoltes",
    request_body = RecolteCreate,
    responses(
        (status = CREATED, body = Recolte),
        (status = BAD_REQUEST, description = "Unknown school or campaign")
    ),
    tag = "recoltes"
)]
pub async fn create_recolte(
    State(state): State<AppState>,
    Json(payload): Json<RecolteCreate>,
) -> Result<(StatusCode, Json<Recolte>), BusinessError> {
    let now = Utc::now();
    let mut active = payload.apply(recoltes::ActiveModel {
        id: Set(Uuid::new_v4()),
        status: Set(RecolteStatus::default()),
        created_at: Set(now),
        ..Default::default()
    });
    active.updated_at = Set(now);

    let recolte = active
        .insert(&state.db)
        .await
        .map_err(|e| e.to_business_error("recolte"))?;

    tracing::info!(id = %recolte.id, school = recolte.establishment_id, "Recorded recolte");
    Ok((StatusCode::CREATED, Json(recolte.into())))
}

#[utoipa::path(
    get,
    path = "/recoltes/{id}",
    params(("id" = Uuid, Path, description = "Recolte id")),
    responses((status = OK, body = Recolte), (status = NOT_FOUND)),
    tag = "recoltes"
)]
pub async fn get_recolte(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Recolte>, BusinessError> {
    Ok(Json(find_recolte(&state.db, id).await?.into()))
}

#[utoipa::path(
    put,
    path = "/recoltes/{id}",
    params(("id" = Uuid, Path, description = "Recolte id")),
    request_body = RecolteCreate,
    responses((status = OK, body = Recolte), (status = NOT_FOUND)),
    tag = "recoltes"
)]
pub async fn update_recolte(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RecolteCreate>,
) -> Result<Json<Recolte>, BusinessError> {
    let existing = find_recolte(&state.db, id).await?;
    let mut active = payload.apply(existing.into());
    active.updated_at = Set(Utc::now());

    let recolte = active
        .update(&state.db)
        .await
        .map_err(|e| e.to_business_error("recolte"))?;

    Ok(Json(recolte.into()))
}

#[utoipa::path(
    delete,
    path = "/recoltes/{id}",
    params(("id" = Uuid, Path, description = "Recolte id")),
    responses((status = NO_CONTENT), (status = NOT_FOUND)),
    tag = "recoltes"
)]
pub async fn delete_recolte(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, BusinessError> {
    let result = recoltes::Entity::delete_by_id(id)
        .exec(&state.db)
        .await
        .map_err(|e| e.to_business_error("recolte"))?;

    if result.rows_affected == 0 {
        return Err(not_found!("recolte", id));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Any state may move to any other; repeating a transition is a no-op.
async fn set_status(
    db: &DatabaseConnection,
    id: Uuid,
    status: RecolteStatus,
) -> Result<Recolte, BusinessError> {
    let mut active: recoltes::ActiveModel = find_recolte(db, id).await?.into();
    active.status = Set(status);
    active.updated_at = Set(Utc::now());

    let recolte = active
        .update(db)
        .await
        .map_err(|e| e.to_business_error("recolte"))?;

    tracing::info!(%id, status = ?status, "Changed recolte status");
    Ok(recolte.into())
}

#[utoipa::path(
    post,
    path = "/recoltes/{id}/validate",
    params(("id" = Uuid, Path, description = "Recolte id")),
    responses((status = OK, description = "Recolte marked as valide", body = Recolte), (status = NOT_FOUND)),
    tag = "recoltes"
)]
pub async fn validate_recolte(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Recolte>, BusinessError> {
    Ok(Json(set_status(&state.db, id, RecolteStatus::Valide).await?))
}

#[utoipa::path(
    post,
    path = "/recoltes/{id}/reject",
    params(("id" = Uuid, Path, description = "Recolte id")),
    responses((status = OK, description = "Recolte marked as rejete", body = Recolte), (status = NOT_FOUND)),
    tag = "recoltes"
)]
pub async fn reject_recolte(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Recolte>, BusinessError> {
    Ok(Json(set_status(&state.db, id, RecolteStatus::Rejete).await?))
}
