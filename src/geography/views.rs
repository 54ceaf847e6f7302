use super::cities::{self, City, CityCreate};
use super::divisions::{self, Division, DivisionCreate};
use super::provinces::{self, Province, ProvinceCreate};
use super::services;
use super::sub_divisions::{self, SubDivision, SubDivisionCreate};
use super::territories::{self, Territory, TerritoryCreate};
use crate::common::errors::{BusinessError, DbErrorExt};
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

pub fn router(state: &AppState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(list_provinces, create_province))
        .routes(routes!(get_province, update_province, delete_province))
        .routes(routes!(list_divisions, create_division))
        .routes(routes!(get_division, update_division, delete_division))
        .routes(routes!(list_sub_divisions, create_sub_division))
        .routes(routes!(get_sub_division, update_sub_division, delete_sub_division))
        .routes(routes!(list_cities, create_city))
        .routes(routes!(get_city, update_city, delete_city))
        .routes(routes!(list_territories, create_territory))
        .routes(routes!(get_territory, update_territory, delete_territory))
        .with_state(state.clone())
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProvinceFilter {
    /// Only children of this province
    pub province: Option<i32>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DivisionFilter {
    /// Only children of this division
    pub division: Option<i32>,
}

// Provinces

#[utoipa::path(
    get,
    path = "/provinces",
    responses((status = OK, body = Vec<Province>)),
    tag = "geography"
)]
pub async fn list_provinces(
    State(state): State<AppState>,
) -> Result<Json<Vec<Province>>, BusinessError> {
    let provinces = provinces::Entity::find()
        .order_by_asc(provinces::Column::Name)
        .all(&state.db)
        .await
        .map_err(|e| e.to_business_error("province"))?;

    Ok(Json(provinces.into_iter().map(Province::from).collect()))
}

#[utoipa::path(
    post,
    path = "/provinces",
    request_body = ProvinceCreate,
    responses(
        (status = CREATED, body = Province),
        (status = CONFLICT, description = "Name or code already used")
    ),
    tag = "geography"
)]
pub async fn create_province(
    State(state): State<AppState>,
    Json(payload): Json<ProvinceCreate>,
) -> Result<(StatusCode, Json<Province>), BusinessError> {
    let province = payload
        .apply(Default::default())
        .insert(&state.db)
        .await
        .map_err(|e| e.to_business_error("province"))?;

    tracing::info!(id = province.id, "Created province");
    Ok((StatusCode::CREATED, Json(province.into())))
}

#[utoipa::path(
    get,
    path = "/provinces/{id}",
    params(("id" = i32, Path, description = "Province id")),
    responses((status = OK, body = Province), (status = NOT_FOUND)),
    tag = "geography"
)]
pub async fn get_province(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Province>, BusinessError> {
    Ok(Json(find_province(&state.db, id).await?.into()))
}

#[utoipa::path(
    put,
    path = "/provinces/{id}",
    params(("id" = i32, Path, description = "Province id")),
    request_body = ProvinceCreate,
    responses((status = OK, body = Province), (status = NOT_FOUND)),
    tag = "geography"
)]
pub async fn update_province(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<ProvinceCreate>,
) -> Result<Json<Province>, BusinessError> {
    let existing = find_province(&state.db, id).await?;
    let province = payload
        .apply(existing.into())
        .update(&state.db)
        .await
        .map_err(|e| e.to_business_error("province"))?;

    Ok(Json(province.into()))
}

#[utoipa::path(
    delete,
    path = "/provinces/{id}",
    params(("id" = i32, Path, description = "Province id")),
    responses(
        (status = NO_CONTENT),
        (status = NOT_FOUND),
        (status = CONFLICT, description = "Province is still referenced")
    ),
    tag = "geography"
)]
pub async fn delete_province(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, BusinessError> {
    services::delete_province(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn find_province(db: &DatabaseConnection, id: i32) -> Result<provinces::Model, BusinessError> {
    provinces::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| e.to_business_error("province"))?
        .ok_or_else(|| not_found!("province", id))
}

// Divisions

fn division_with_province(model: divisions::Model, province: Option<provinces::Model>) -> Division {
    let mut division = Division::from(model);
    division.province_name = province.and_then(|province| province.name);
    division
}

async fn load_division(db: &DatabaseConnection, id: i32) -> Result<Division, BusinessError> {
    let (division, province) = divisions::Entity::find_by_id(id)
        .find_also_related(provinces::Entity)
        .one(db)
        .await
        .map_err(|e| e.to_business_error("division"))?
        .ok_or_else(|| not_found!("division", id))?;

    Ok(division_with_province(division, province))
}

#[utoipa::path(
    get,
    path = "/divisions",
    params(ProvinceFilter),
    responses((status = OK, body = Vec<Division>)),
    tag = "geography"
)]
pub async fn list_divisions(
    State(state): State<AppState>,
    Query(filter): Query<ProvinceFilter>,
) -> Result<Json<Vec<Division>>, BusinessError> {
    let mut select = divisions::Entity::find();
    if let Some(province) = filter.province {
        select = select.filter(divisions::Column::ProvinceId.eq(province));
    }

    let rows = select
        .find_also_related(provinces::Entity)
        .order_by_asc(divisions::Column::Name)
        .all(&state.db)
        .await
        .map_err(|e| e.to_business_error("division"))?;

    Ok(Json(
        rows.into_iter()
            .map(|(division, province)| division_with_province(division, province))
            .collect(),
    ))
}

#[utoipa::path(
    post,
    path = "/divisions",
    request_body = DivisionCreate,
    responses((status = CREATED, body = Division)),
    tag = "geography"
)]
pub async fn create_division(
    State(state): State<AppState>,
    Json(payload): Json<DivisionCreate>,
) -> Result<(StatusCode, Json<Division>), BusinessError> {
    let now = Utc::now();
    let division = divisions::ActiveModel {
        province_id: Set(payload.province_id),
        code: Set(payload.code),
        name: Set(payload.name),
        created_at: Set(Some(now)),
        updated_at: Set(Some(now)),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| e.to_business_error("division"))?;

    Ok((StatusCode::CREATED, Json(load_division(&state.db, division.id).await?)))
}

#[utoipa::path(
    get,
    path = "/divisions/{id}",
    params(("id" = i32, Path, description = "Division id")),
    responses((status = OK, body = Division), (status = NOT_FOUND)),
    tag = "geography"
)]
pub async fn get_division(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Division>, BusinessError> {
    Ok(Json(load_division(&state.db, id).await?))
}

#[utoipa::path(
    put,
    path = "/divisions/{id}",
    params(("id" = i32, Path, description = "Division id")),
    request_body = DivisionCreate,
    responses((status = OK, body = Division), (status = NOT_FOUND)),
    tag = "geography"
)]
pub async fn update_division(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<DivisionCreate>,
) -> Result<Json<Division>, BusinessError> {
    let existing = divisions::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .map_err(|e| e.to_business_error("division"))?
        .ok_or_else(|| not_found!("division", id))?;

    let mut active: divisions::ActiveModel = existing.into();
    active.province_id = Set(payload.province_id);
    active.code = Set(payload.code);
    active.name = Set(payload.name);
    active.updated_at = Set(Some(Utc::now()));
    active
        .update(&state.db)
        .await
        .map_err(|e| e.to_business_error("division"))?;

    Ok(Json(load_division(&state.db, id).await?))
}

#[utoipa::path(
    delete,
    path = "/divisions/{id}",
    params(("id" = i32, Path, description = "Division id")),
    responses(
        (status = NO_CONTENT),
        (status = NOT_FOUND),
        (status = CONFLICT, description = "Division is still referenced")
    ),
    tag = "geography"
)]
pub async fn delete_division(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, BusinessError> {
    services::delete_division(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Sub-divisions

fn sub_division_with_division(
    model: sub_divisions::Model,
    division: Option<divisions::Model>,
) -> SubDivision {
    let mut sub_division = SubDivision::from(model);
    sub_division.division_name = division.map(|division| division.name);
    sub_division
}

async fn load_sub_division(db: &DatabaseConnection, id: i32) -> Result<SubDivision, BusinessError> {
    let (sub_division, division) = sub_divisions::Entity::find_by_id(id)
        .find_also_related(divisions::Entity)
        .one(db)
        .await
        .map_err(|e| e.to_business_error("sub_division"))?
        .ok_or_else(|| not_found!("sub-division", id))?;

    Ok(sub_division_with_division(sub_division, division))
}

#[utoipa::path(
    get,
    path = "/sub-divisions",
    params(DivisionFilter),
    responses((status = OK, body = Vec<SubDivision>)),
    tag = "geography"
)]
pub async fn list_sub_divisions(
    State(state): State<AppState>,
    Query(filter): Query<DivisionFilter>,
) -> Result<Json<Vec<SubDivision>>, BusinessError> {
    let mut select = sub_divisions::Entity::find();
    if let Some(division) = filter.division {
        select = select.filter(sub_divisions::Column::DivisionId.eq(division));
    }

    let rows = select
        .find_also_related(divisions::Entity)
        .order_by_asc(sub_divisions::Column::Name)
        .all(&state.db)
        .await
        .map_err(|e| e.to_business_error("sub_division"))?;

    Ok(Json(
        rows.into_iter()
            .map(|(sub_division, division)| sub_division_with_division(sub_division, division))
            .collect(),
    ))
}

#[utoipa::path(
    post,
    path = "/sub-divisions",
    request_body = SubDivisionCreate,
    responses((status = CREATED, body = SubDivision)),
    tag = "geography"
)]
pub async fn create_sub_division(
    State(state): State<AppState>,
    Json(payload): Json<SubDivisionCreate>,
) -> Result<(StatusCode, Json<SubDivision>), BusinessError> {
    let now = Utc::now();
    let sub_division = sub_divisions::ActiveModel {
        division_id: Set(payload.division_id),
        code: Set(payload.code),
        name: Set(payload.name),
        created_at: Set(Some(now)),
        updated_at: Set(Some(now)),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| e.to_business_error("sub_division"))?;

    Ok((
        StatusCode::CREATED,
        Json(load_sub_division(&state.db, sub_division.id).await?),
    ))
}

#[utoipa::path(
    get,
    path = "/sub-divisions/{id}",
    params(("id" = i32, Path, description = "Sub-division id")),
    responses((status = OK, body = SubDivision), (status = NOT_FOUND)),
    tag = "geography"
)]
pub async fn get_sub_division(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<SubDivision>, BusinessError> {
    Ok(Json(load_sub_division(&state.db, id).await?))
}

#[utoipa::path(
    put,
    path = "/sub-divisions/{id}",
    params(("id" = i32, Path, description = "Sub-division id")),
    request_body = SubDivisionCreate,
    responses((status = OK, body = SubDivision), (status = NOT_FOUND)),
    tag = "geography"
)]
pub async fn update_sub_division(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<SubDivisionCreate>,
) -> Result<Json<SubDivision>, BusinessError> {
    let existing = sub_divisions::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .map_err(|e| e.to_business_error("sub_division"))?
        .ok_or_else(|| not_found!("sub-division", id))?;

    let mut active: sub_divisions::ActiveModel = existing.into();
    active.division_id = Set(payload.division_id);
    active.code = Set(payload.code);
    active.name = Set(payload.name);
    active.updated_at = Set(Some(Utc::now()));
    active
        .update(&state.db)
        .await
        .map_err(|e| e.to_business_error("sub_division"))?;

    Ok(Json(load_sub_division(&state.db, id).await?))
}

#[utoipa::path(
    delete,
    path = "/sub-divisions/{id}",
    params(("id" = i32, Path, description = "Sub-division id")),
    responses(
        (status = NO_CONTENT),
        (status = NOT_FOUND),
        (status = CONFLICT, description = "Sub-division is still referenced")
    ),
    tag = "geography"
)]
pub async fn delete_sub_division(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, BusinessError> {
    services::delete_sub_division(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Cities

#[utoipa::path(
    get,
    path = "/cities",
    params(ProvinceFilter),
    responses((status = OK, body = Vec<City>)),
    tag = "geography"
)]
pub async fn list_cities(
    State(state): State<AppState>,
    Query(filter): Query<ProvinceFilter>,
) -> Result<Json<Vec<City>>, BusinessError> {
    let mut select = cities::Entity::find();
    if let Some(province) = filter.province {
        select = select.filter(cities::Column::ProvinceId.eq(province));
    }

    let cities = select
        .order_by_asc(cities::Column::Name)
        .all(&state.db)
        .await
        .map_err(|e| e.to_business_error("city"))?;

    Ok(Json(cities.into_iter().map(City::from).collect()))
}

#[utoipa::path(
    post,
    path = "/cities",
    request_body = CityCreate,
    responses((status = CREATED, body = City)),
    tag = "geography"
)]
pub async fn create_city(
    State(state): State<AppState>,
    Json(payload): Json<CityCreate>,
) -> Result<(StatusCode, Json<City>), BusinessError> {
    let now = Utc::now();
    let city = cities::ActiveModel {
        province_id: Set(payload.province_id),
        name: Set(payload.name),
        code: Set(payload.code),
        created_at: Set(Some(now)),
        updated_at: Set(Some(now)),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| e.to_business_error("city"))?;

    Ok((StatusCode::CREATED, Json(city.into())))
}

#[utoipa::path(
    get,
    path = "/cities/{id}",
    params(("id" = i32, Path, description = "City id")),
    responses((status = OK, body = City), (status = NOT_FOUND)),
    tag = "geography"
)]
pub async fn get_city(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<City>, BusinessError> {
    let city = cities::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .map_err(|e| e.to_business_error("city"))?
        .ok_or_else(|| not_found!("city", id))?;

    Ok(Json(city.into()))
}

#[utoipa::path(
    put,
    path = "/cities/{id}",
    params(("id" = i32, Path, description = "City id")),
    request_body = CityCreate,
    responses((status = OK, body = City), (status = NOT_FOUND)),
    tag = "geography"
)]
pub async fn update_city(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<CityCreate>,
) -> Result<Json<City>, BusinessError> {
    let existing = cities::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .map_err(|e| e.to_business_error("city"))?
        .ok_or_else(|| not_found!("city", id))?;

    let mut active: cities::ActiveModel = existing.into();
    active.province_id = Set(payload.province_id);
    active.name = Set(payload.name);
    active.code = Set(payload.code);
    active.updated_at = Set(Some(Utc::now()));
    let city = active
        .update(&state.db)
        .await
        .map_err(|e| e.to_business_error("city"))?;

    Ok(Json(city.into()))
}

#[utoipa::path(
    delete,
    path = "/cities/{id}",
    params(("id" = i32, Path, description = "City id")),
    responses(
        (status = NO_CONTENT),
        (status = NOT_FOUND),
        (status = CONFLICT, description = "City is still referenced")
    ),
    tag = "geography"
)]
pub async fn delete_city(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, BusinessError> {
    services::delete_city(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Territories

#[utoipa::path(
    get,
    path = "/territories",
    params(ProvinceFilter),
    responses((status = OK, body = Vec<Territory>)),
    tag = "geography"
)]
pub async fn list_territories(
    State(state): State<AppState>,
    Query(filter): Query<ProvinceFilter>,
) -> Result<Json<Vec<Territory>>, BusinessError> {
    let mut select = territories::Entity::find();
    if let Some(province) = filter.province {
        select = select.filter(territories::Column::ProvinceId.eq(province));
    }

    let territories = select
        .order_by_asc(territories::Column::Name)
        .all(&state.db)
        .await
        .map_err(|e| e.to_business_error("territory"))?;

    Ok(Json(territories.into_iter().map(Territory::from).collect()))
}

#[utoipa::path(
    post,
    path = "/territories",
    request_body = TerritoryCreate,
    responses((status = CREATED, body = Territory)),
    tag = "geography"
)]
pub async fn create_territory(
    State(state): State<AppState>,
    Json(payload): Json<TerritoryCreate>,
) -> Result<(StatusCode, Json<Territory>), BusinessError> {
    let now = Utc::now();
    let territory = territories::ActiveModel {
        province_id: Set(payload.province_id),
        code: Set(payload.code),
        name: Set(payload.name),
        created_at: Set(Some(now)),
        updated_at: Set(Some(now)),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| e.to_business_error("territory"))?;

    Ok((StatusCode::CREATED, Json(territory.into())))
}

#[utoipa::path(
    get,
    path = "/territories/{id}",
    params(("id" = i32, Path, description = "Territory id")),
    responses((status = OK, body = Territory), (status = NOT_FOUND)),
    tag = "geography"
)]
pub async fn get_territory(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Territory>, BusinessError> {
    let territory = territories::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .map_err(|e| e.to_business_error("territory"))?
        .ok_or_else(|| not_found!("territory", id))?;

    Ok(Json(territory.into()))
}

#[utoipa::path(
    put,
    path = "/territories/{id}",
    params(("id" = i32, Path, description = "Territory id")),
    request_body = TerritoryCreate,
    responses((status = OK, body = Territory), (status = NOT_FOUND)),
    tag = "geography"
)]
pub async fn update_territory(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<TerritoryCreate>,
) -> Result<Json<Territory>, BusinessError> {
    let existing = territories::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .map_err(|e| e.to_business_error("territory"))?
        .ok_or_else(|| not_found!("territory", id))?;

    let mut active: territories::ActiveModel = existing.into();
    active.province_id = Set(payload.province_id);
    active.code = Set(payload.code);
    active.name = Set(payload.name);
    active.updated_at = Set(Some(Utc::now()));
    let territory = active
        .update(&state.db)
        .await
        .map_err(|e| e.to_business_error("territory"))?;

    Ok(Json(territory.into()))
}

#[utoipa::path(
    delete,
    path = "/territories/{id}",
    params(("id" = i32, Path, description = "Territory id")),
    responses(
        (status = NO_CONTENT),
        (status = NOT_FOUND),
        (status = CONFLICT, description = "Territory is still referenced")
    ),
    tag = "geography"
)]
pub async fn delete_territory(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, BusinessError> {
    services::delete_territory(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
