use crate::common::auth::{require_auth, require_staff};
use crate::common::state::AppState;
use crate::config::Config;
use crate::{campaigns, geography, questionnaires, recoltes, schools, users};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{
        HeaderValue, Method,
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    },
    middleware::{from_fn, from_fn_with_state},
};
use sea_orm::DatabaseConnection;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable};

/// No configured origins means any origin, which is only meant for local work.
fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_allowed_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([ACCEPT, AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true)
}

pub fn build_router(db: &DatabaseConnection, config: &Config) -> Router {
    #[derive(OpenApi)]
    #[openapi(
        modifiers(&SecurityAddon),
        security(
            ("bearerAuth" = [])
        )
    )]
    struct ApiDoc;

    struct SecurityAddon;

    impl utoipa::Modify for SecurityAddon {
        fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
            if let Some(components) = openapi.components.as_mut() {
                components.add_security_scheme(
                    "bearerAuth",
                    utoipa::openapi::security::SecurityScheme::Http(
                        utoipa::openapi::security::HttpBuilder::new()
                            .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                            .bearer_format("JWT")
                            .build(),
                    ),
                );
            }
        }
    }

    let app_state = AppState::new(db.clone(), config.clone());
    let authenticated = from_fn_with_state(app_state.clone(), require_auth);

    let protected_api = OpenApiRouter::new()
        .merge(geography::views::router(&app_state))
        .merge(schools::views::router(&app_state))
        .merge(questionnaires::views::router(&app_state))
        .merge(campaigns::views::router(&app_state))
        .merge(recoltes::views::router(&app_state))
        .merge(users::views::me_router(&app_state))
        .layer(authenticated.clone());

    let staff_only = users::views::admin_router(&app_state)
        .layer(from_fn(require_staff))
        .layer(authenticated.clone());

    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(crate::common::views::router(&app_state)) // Root routes
        .nest(
            "/api",
            users::views::token_router(&app_state).merge(protected_api),
        )
        .nest(
            "/users",
            users::views::session_router(&app_state)
                .merge(users::views::profile_router(&app_state).layer(authenticated))
                .merge(staff_only),
        )
        .split_for_parts();

    router
        .merge(Scalar::with_url("/api/docs", api))
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(config))
}
