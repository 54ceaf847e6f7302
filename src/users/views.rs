use super::groups::{self, Group, GroupCreate};
use super::models::{
    self as users, AccessToken, Credentials, ProfileUpdate, RefreshRequest, TokenPair, User,
    UserCreate, UserUpdate,
};
use super::services;
use crate::common::auth::{AuthenticatedUser, LOGIN_PATH, PROFILE_PATH, TokenType, session_cookie};
use crate::common::errors::{BusinessError, DbErrorExt};
use crate::common::state::AppState;
use crate::not_found;
use axum::{
    Extension, Form, Json,
    extract::{Path, State},
    http::{StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Redirect},
};
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use serde::Serialize;
use utoipa::ToSchema;
use utoipa_axum::{router::OpenApiRouter, routes};

fn token_error(e: &jsonwebtoken::errors::Error) -> BusinessError {
    BusinessError::InternalError {
        message: format!("Failed to sign token: {e}"),
    }
}

/// `/api/token*`, reachable without credentials.
pub fn token_router(state: &AppState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(obtain_token))
        .routes(routes!(refresh_token))
        .with_state(state.clone())
}

/// `/api/me`
pub fn me_router(state: &AppState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(current_user))
        .with_state(state.clone())
}

/// Browser session endpoints under `/users`, reachable without credentials.
pub fn session_router(state: &AppState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(login))
        .routes(routes!(logout))
        .routes(routes!(access_denied))
        .with_state(state.clone())
}

pub fn profile_router(state: &AppState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(get_profile, update_profile))
        .with_state(state.clone())
}

/// Account administration, staff only.
pub fn admin_router(state: &AppState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(list_users, create_user))
        .routes(routes!(get_user, update_user, delete_user))
        .routes(routes!(toggle_user_active))
        .routes(routes!(list_groups, create_group))
        .routes(routes!(update_group))
        .with_state(state.clone())
}

#[utoipa::path(
    post,
    path = "/token",
    request_body = Credentials,
    responses(
        (status = OK, description = "Access and refresh tokens", body = TokenPair),
        (status = UNAUTHORIZED, description = "Bad credentials or inactive account")
    ),
    security(()),
    tag = "auth"
)]
pub async fn obtain_token(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<TokenPair>, BusinessError> {
    let user = services::authenticate(&state.db, &credentials.username, &credentials.password).await?;

    let access = state.jwt.generate_access_token(&user).map_err(|e| token_error(&e))?;
    let refresh = state.jwt.generate_refresh_token(&user).map_err(|e| token_error(&e))?;

    Ok(Json(TokenPair {
        access,
        refresh,
        user: services::load_user(&state.db, user.id).await?,
    }))
}

#[utoipa::path(
    post,
    path = "/token/refresh",
    request_body = RefreshRequest,
    responses(
        (status = OK, body = AccessToken),
        (status = UNAUTHORIZED, description = "Refresh token invalid, expired or for an inactive account")
    ),
    security(()),
    tag = "auth"
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AccessToken>, BusinessError> {
    let claims = state.jwt.verify_token(&payload.refresh, TokenType::Refresh)?;

    let user = users::Entity::find_by_id(claims.sub)
        .one(&state.db)
        .await
        .map_err(|e| e.to_business_error("user"))?
        .filter(|user| user.is_active)
        .ok_or_else(|| BusinessError::Unauthorized {
            message: "User not found or inactive".to_string(),
        })?;

    let access = state.jwt.generate_access_token(&user).map_err(|e| token_error(&e))?;
    Ok(Json(AccessToken { access }))
}

#[utoipa::path(
    get,
    path = "/me",
    responses((status = OK, description = "The authenticated user", body = User)),
    tag = "auth"
)]
pub async fn current_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<User>, BusinessError> {
    Ok(Json(services::load_user(&state.db, user.id).await?))
}

#[utoipa::path(
    post,
    path = "/login",
    request_body(content = Credentials, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = SEE_OTHER, description = "Session cookie set, redirected to the profile page"),
        (status = UNAUTHORIZED, description = "Bad credentials or inactive account")
    ),
    security(()),
    tag = "session"
)]
pub async fn login(
    State(state): State<AppState>,
    Form(credentials): Form<Credentials>,
) -> Result<impl IntoResponse, BusinessError> {
    let user = services::authenticate(&state.db, &credentials.username, &credentials.password).await?;
    let access = state.jwt.generate_access_token(&user).map_err(|e| token_error(&e))?;

    let cookie = session_cookie(&access, state.config.access_token_minutes * 60);
    Ok(([(SET_COOKIE, cookie.to_string())], Redirect::to(PROFILE_PATH)))
}

#[utoipa::path(
    post,
    path = "/logout",
    responses((status = SEE_OTHER, description = "Session cookie cleared, redirected to the login page")),
    security(()),
    tag = "session"
)]
pub async fn logout() -> impl IntoResponse {
    ([(SET_COOKIE, session_cookie("", 0).to_string())], Redirect::to(LOGIN_PATH))
}

#[derive(ToSchema, Serialize)]
pub struct AccessDenied {
    pub detail: String,
}

#[utoipa::path(
    get,
    path = "/access-denied",
    responses((status = FORBIDDEN, body = AccessDenied)),
    security(()),
    tag = "session"
)]
pub async fn access_denied() -> (StatusCode, Json<AccessDenied>) {
    (
        StatusCode::FORBIDDEN,
        Json(AccessDenied {
            detail: "Staff access is required for this page".to_string(),
        }),
    )
}

#[utoipa::path(
    get,
    path = "/profile",
    responses((status = OK, body = User)),
    tag = "session"
)]
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<User>, BusinessError> {
    Ok(Json(services::load_user(&state.db, user.id).await?))
}

#[utoipa::path(
    put,
    path = "/profile",
    request_body = ProfileUpdate,
    responses((status = OK, body = User)),
    tag = "session"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(payload): Json<ProfileUpdate>,
) -> Result<Json<User>, BusinessError> {
    services::update_user(
        &state.db,
        user.id,
        UserUpdate {
            first_name: Some(payload.first_name),
            last_name: Some(payload.last_name),
            email: Some(payload.email),
            ..Default::default()
        },
    )
    .await?;

    Ok(Json(services::load_user(&state.db, user.id).await?))
}

#[utoipa::path(
    get,
    path = "/users",
    responses((status = OK, body = Vec<User>)),
    tag = "accounts"
)]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, BusinessError> {
    let rows = users::Entity::find()
        .order_by_asc(users::Column::Username)
        .all(&state.db)
        .await
        .map_err(|e| e.to_business_error("user"))?;

    Ok(Json(services::with_groups(&state.db, rows).await?))
}

#[utoipa::path(
    post,
    path = "/users",
    request_body = UserCreate,
    responses(
        (status = CREATED, body = User),
        (status = CONFLICT, description = "Username already taken")
    ),
    tag = "accounts"
)]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<UserCreate>,
) -> Result<(StatusCode, Json<User>), BusinessError> {
    let id = services::create_user(&state.db, payload).await?;
    Ok((StatusCode::CREATED, Json(services::load_user(&state.db, id).await?)))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    params(("id" = i32, Path, description = "User id")),
    responses((status = OK, body = User), (status = NOT_FOUND)),
    tag = "accounts"
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<User>, BusinessError> {
    Ok(Json(services::load_user(&state.db, id).await?))
}

#[utoipa::path(
    put,
    path = "/users/{id}",
    params(("id" = i32, Path, description = "User id")),
    request_body = UserUpdate,
    responses((status = OK, body = User), (status = NOT_FOUND)),
    tag = "accounts"
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UserUpdate>,
) -> Result<Json<User>, BusinessError> {
    services::update_user(&state.db, id, payload).await?;
    Ok(Json(services::load_user(&state.db, id).await?))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(("id" = i32, Path, description = "User id")),
    responses((status = NO_CONTENT), (status = NOT_FOUND)),
    tag = "accounts"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(acting): Extension<AuthenticatedUser>,
    Path(id): Path<i32>,
) -> Result<StatusCode, BusinessError> {
    services::delete_user(&state.db, id, acting.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/users/{id}/toggle-active",
    params(("id" = i32, Path, description = "User id")),
    responses((status = OK, description = "Account enabled or disabled", body = User), (status = NOT_FOUND)),
    tag = "accounts"
)]
pub async fn toggle_user_active(
    State(state): State<AppState>,
    Extension(acting): Extension<AuthenticatedUser>,
    Path(id): Path<i32>,
) -> Result<Json<User>, BusinessError> {
    services::toggle_active(&state.db, id, acting.id).await?;
    Ok(Json(services::load_user(&state.db, id).await?))
}

#[utoipa::path(
    get,
    path = "/groups",
    responses((status = OK, body = Vec<Group>)),
    tag = "accounts"
)]
pub async fn list_groups(State(state): State<AppState>) -> Result<Json<Vec<Group>>, BusinessError> {
    let rows = groups::Entity::find()
        .order_by_asc(groups::Column::Name)
        .all(&state.db)
        .await
        .map_err(|e| e.to_business_error("group"))?;

    Ok(Json(rows.into_iter().map(Group::from).collect()))
}

#[utoipa::path(
    post,
    path = "/groups",
    request_body = GroupCreate,
    responses((status = CREATED, body = Group), (status = CONFLICT)),
    tag = "accounts"
)]
pub async fn create_group(
    State(state): State<AppState>,
    Json(payload): Json<GroupCreate>,
) -> Result<(StatusCode, Json<Group>), BusinessError> {
    let group = groups::ActiveModel {
        name: Set(payload.name),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| e.to_business_error("group"))?;

    Ok((StatusCode::CREATED, Json(group.into())))
}

#[utoipa::path(
    put,
    path = "/groups/{id}",
    params(("id" = i32, Path, description = "Group id")),
    request_body = GroupCreate,
    responses((status = OK, body = Group), (status = NOT_FOUND), (status = CONFLICT)),
    tag = "accounts"
)]
pub async fn update_group(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<GroupCreate>,
) -> Result<Json<Group>, BusinessError> {
    let existing = groups::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .map_err(|e| e.to_business_error("group"))?
        .ok_or_else(|| not_found!("group", id))?;

    let mut active: groups::ActiveModel = existing.into();
    active.name = Set(payload.name);
    let group = active
        .update(&state.db)
        .await
        .map_err(|e| e.to_business_error("group"))?;

    Ok(Json(group.into()))
}
