use super::models::{
    self as schools, ManagementRegime, MechanizedStatus, School, SchoolCreate, SchoolMarker,
    SchoolSyncEntry, SchoolUpdate, SyncByCodes,
};
use super::services;
use crate::common::errors::{BusinessError, DbErrorExt};
use crate::common::models::Paginated;
use crate::common::query::{PageParams, fetch_page, parse_ordering, search_condition};
use crate::common::state::AppState;
use crate::not_found;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::Deserialize;
use utoipa::IntoParams;
use utoipa_axum::{router::OpenApiRouter, routes};

pub fn router(state: &AppState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(list_schools, create_school))
        .routes(routes!(school_map))
        .routes(routes!(sync_by_codes))
        .routes(routes!(get_school, update_school, patch_school, delete_school))
        .routes(routes!(schools_sync))
        .with_state(state.clone())
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SchoolFilter {
    pub province: Option<i32>,
    pub division: Option<i32>,
    pub sub_division: Option<i32>,
    pub city: Option<i32>,
    pub territory: Option<i32>,
    pub management_regime: Option<ManagementRegime>,
    pub mechanized_status: Option<MechanizedStatus>,
    /// Matches name, administrative code, head name and village
    pub search: Option<String>,
    /// `name`, `created_at`, prefixed with `-` for descending order
    pub ordering: Option<String>,
}

const ORDERING_FIELDS: [(&str, schools::Column); 2] = [
    ("name", schools::Column::Name),
    ("created_at", schools::Column::CreatedAt),
];

#[utoipa::path(
    get,
    path = "/schools",
    params(SchoolFilter, PageParams),
    responses((status = OK, body = Paginated<School>)),
    tag = "schools"
)]
pub async fn list_schools(
    State(state): State<AppState>,
    Query(filter): Query<SchoolFilter>,
    Query(page): Query<PageParams>,
) -> Result<Json<Paginated<School>>, BusinessError> {
    let mut select = schools::Entity::find();

    if let Some(id) = filter.province {
        select = select.filter(schools::Column::ProvinceId.eq(id));
    }
    if let Some(id) = filter.division {
        select = select.filter(schools::Column::DivisionId.eq(id));
    }
    if let Some(id) = filter.sub_division {
        select = select.filter(schools::Column::SubDivisionId.eq(id));
    }
    if let Some(id) = filter.city {
        select = select.filter(schools::Column::CityId.eq(id));
    }
    if let Some(id) = filter.territory {
        select = select.filter(schools::Column::TerritoryId.eq(id));
    }
    if let Some(regime) = filter.management_regime {
        select = select.filter(schools::Column::ManagementRegime.eq(regime));
    }
    if let Some(status) = filter.mechanized_status {
        select = select.filter(schools::Column::MechanizedStatus.eq(status));
    }
    if let Some(term) = filter.search.as_deref().filter(|term| !term.trim().is_empty()) {
        select = select.filter(search_condition(
            term,
            &[
                schools::Column::Name,
                schools::Column::AdmCode,
                schools::Column::HeadName,
                schools::Column::Village,
            ],
        ));
    }

    select = match parse_ordering(filter.ordering.as_deref(), &ORDERING_FIELDS) {
        Some((column, order)) => select.order_by(column, order),
        None => select,
    }
    .order_by_asc(schools::Column::Id);

    let mut rows: Paginated<schools::Model> = fetch_page(&state.db, select, &page)
        .await
        .map_err(|e| e.to_business_error("school"))?;
    let items = services::with_location_names(&state.db, std::mem::take(&mut rows.items)).await?;

    Ok(Json(rows.with_items(items)))
}

#[utoipa::path(
    post,
    path = "/schools",
    request_body = SchoolCreate,
    responses(
        (status = CREATED, body = School),
        (status = CONFLICT, description = "Administrative code already used")
    ),
    tag = "schools"
)]
pub async fn create_school(
    State(state): State<AppState>,
    Json(payload): Json<SchoolCreate>,
) -> Result<(StatusCode, Json<School>), BusinessError> {
    let now = Utc::now();
    let school = payload
        .apply(schools::ActiveModel {
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        })
        .insert(&state.db)
        .await
        .map_err(|e| e.to_business_error("school"))?;

    tracing::info!(id = school.id, adm_code = %school.adm_code, "Created school");
    Ok((
        StatusCode::CREATED,
        Json(services::load_school(&state.db, school.id).await?),
    ))
}

#[utoipa::path(
    get,
    path = "/schools/{id}",
    params(("id" = i32, Path, description = "School id")),
    responses((status = OK, body = School), (status = NOT_FOUND)),
    tag = "schools"
)]
pub async fn get_school(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<School>, BusinessError> {
    Ok(Json(services::load_school(&state.db, id).await?))
}

async fn find_school(state: &AppState, id: i32) -> Result<schools::Model, BusinessError> {
    schools::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .map_err(|e| e.to_business_error("school"))?
        .ok_or_else(|| not_found!("school", id))
}

#[utoipa::path(
    put,
    path = "/schools/{id}",
    params(("id" = i32, Path, description = "School id")),
    request_body = SchoolCreate,
    responses((status = OK, body = School), (status = NOT_FOUND)),
    tag = "schools"
)]
pub async fn update_school(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<SchoolCreate>,
) -> Result<Json<School>, BusinessError> {
    let existing = find_school(&state, id).await?;
    let mut active = payload.apply(existing.into());
    active.updated_at = Set(Some(Utc::now()));
    active
        .update(&state.db)
        .await
        .map_err(|e| e.to_business_error("school"))?;

    Ok(Json(services::load_school(&state.db, id).await?))
}

#[utoipa::path(
    patch,
    path = "/schools/{id}",
    params(("id" = i32, Path, description = "School id")),
    request_body = SchoolUpdate,
    responses(
        (status = OK, body = School),
        (status = BAD_REQUEST, description = "Only one of latitude and longitude given"),
        (status = NOT_FOUND)
    ),
    tag = "schools"
)]
pub async fn patch_school(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<SchoolUpdate>,
) -> Result<Json<School>, BusinessError> {
    payload.check_coordinates()?;
    let existing = find_school(&state, id).await?;
    let mut active = payload.apply(existing.into());
    active.updated_at = Set(Some(Utc::now()));
    active
        .update(&state.db)
        .await
        .map_err(|e| e.to_business_error("school"))?;

    Ok(Json(services::load_school(&state.db, id).await?))
}

#[utoipa::path(
    delete,
    path = "/schools/{id}",
    params(("id" = i32, Path, description = "School id")),
    responses((status = NO_CONTENT), (status = NOT_FOUND)),
    tag = "schools"
)]
pub async fn delete_school(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, BusinessError> {
    services::delete_school(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/schools/map",
    responses((status = OK, description = "Schools with a known position", body = Vec<SchoolMarker>)),
    tag = "schools"
)]
pub async fn school_map(
    State(state): State<AppState>,
) -> Result<Json<Vec<SchoolMarker>>, BusinessError> {
    let rows = schools::Entity::find()
        .filter(schools::Column::GeoCoord.is_not_null())
        .order_by_asc(schools::Column::Name)
        .all(&state.db)
        .await
        .map_err(|e| e.to_business_error("school"))?;

    Ok(Json(rows.into_iter().map(SchoolMarker::from).collect()))
}

#[utoipa::path(
    post,
    path = "/schools/sync-by-codes",
    request_body = SyncByCodes,
    responses((status = OK, body = Vec<School>)),
    tag = "schools"
)]
pub async fn sync_by_codes(
    State(state): State<AppState>,
    Json(payload): Json<SyncByCodes>,
) -> Result<Json<Vec<School>>, BusinessError> {
    if payload.codes.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let rows = schools::Entity::find()
        .filter(schools::Column::AdmCode.is_in(payload.codes))
        .order_by_asc(schools::Column::Id)
        .all(&state.db)
        .await
        .map_err(|e| e.to_business_error("school"))?;

    Ok(Json(services::with_location_names(&state.db, rows).await?))
}

#[utoipa::path(
    get,
    path = "/schools-sync",
    responses((status = OK, description = "Administrative code and last update of every school", body = Vec<SchoolSyncEntry>)),
    tag = "schools"
)]
pub async fn schools_sync(
    State(state): State<AppState>,
) -> Result<Json<Vec<SchoolSyncEntry>>, BusinessError> {
    let entries = schools::Entity::find()
        .select_only()
        .column(schools::Column::AdmCode)
        .column(schools::Column::UpdatedAt)
        .order_by_asc(schools::Column::AdmCode)
        .into_model::<SchoolSyncEntry>()
        .all(&state.db)
        .await
        .map_err(|e| e.to_business_error("school"))?;

    Ok(Json(entries))
}
