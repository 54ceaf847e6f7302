use crate::common::errors::BusinessError;
use crate::common::state::AppState;
use crate::config::Config;
use crate::users::models as users;
use axum::{
    extract::{Request, State},
    http::{
        HeaderMap,
        header::{ACCEPT, AUTHORIZATION, COOKIE},
    },
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use chrono::{Duration, Utc};
use cookie::{Cookie, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};

/// Name of the cookie set by the login form.
pub const AUTH_COOKIE: &str = "access_token";
pub const LOGIN_PATH: &str = "/users/login";
pub const PROFILE_PATH: &str = "/users/profile";
pub const ACCESS_DENIED_PATH: &str = "/users/access-denied";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32, // user id
    pub username: String,
    pub token_type: TokenType,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_lifetime: Duration,
    refresh_lifetime: Duration,
}

impl JwtService {
    pub fn new(secret: &str, access_minutes: i64, refresh_days: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_ref()),
            decoding_key: DecodingKey::from_secret(secret.as_ref()),
            access_lifetime: Duration::minutes(access_minutes),
            refresh_lifetime: Duration::days(refresh_days),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.jwt_secret,
            config.access_token_minutes,
            config.refresh_token_days,
        )
    }

    fn generate(
        &self,
        user_id: i32,
        username: &str,
        token_type: TokenType,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let lifetime = match token_type {
            TokenType::Access => self.access_lifetime,
            TokenType::Refresh => self.refresh_lifetime,
        };

        let claims = Claims {
            sub: user_id,
            username: username.to_string(),
            token_type,
            exp: (now + lifetime).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
    }

    pub fn generate_access_token(
        &self,
        user: &users::Model,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        self.generate(user.id, &user.username, TokenType::Access)
    }

    pub fn generate_refresh_token(
        &self,
        user: &users::Model,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        self.generate(user.id, &user.username, TokenType::Refresh)
    }

    /// Decodes a token and checks that it is of the expected kind.
    pub fn verify_token(
        &self,
        token: &str,
        expected: TokenType,
    ) -> Result<Claims, BusinessError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|e| BusinessError::Unauthorized {
                message: format!("Token is invalid or expired: {e}"),
            })?
            .claims;

        if claims.token_type != expected {
            return Err(BusinessError::Unauthorized {
                message: "Token has wrong type".to_string(),
            });
        }

        Ok(claims)
    }
}

/// Identity resolved from a token, inserted into request extensions.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: i32,
    pub username: String,
    pub is_staff: bool,
}

impl From<&users::Model> for AuthenticatedUser {
    fn from(user: &users::Model) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            is_staff: user.is_staff,
        }
    }
}

/// Bearer header first, then the login cookie.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
    {
        return Some(token.trim().to_string());
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|header| header.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == AUTH_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

/// HttpOnly session cookie carrying an access token. A zero max age clears it.
pub fn session_cookie(token: &str, max_age_seconds: i64) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, token.to_string()))
        .http_only(true)
        .path("/")
        .same_site(SameSite::Lax)
        .max_age(cookie::time::Duration::seconds(max_age_seconds))
        .build()
}

fn wants_html(headers: &HeaderMap) -> bool {
    headers
        .get(ACCEPT)
        .and_then(|header| header.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"))
}

async fn resolve_user(state: &AppState, headers: &HeaderMap) -> Result<users::Model, BusinessError> {
    let token = extract_token(headers).ok_or_else(|| BusinessError::Unauthorized {
        message: "Authentication credentials were not provided".to_string(),
    })?;

    let claims = state.jwt.verify_token(&token, TokenType::Access)?;

    let user = users::Entity::find_by_id(claims.sub)
        .one(&state.db)
        .await
        .map_err(|e| BusinessError::InternalError {
            message: e.to_string(),
        })?
        .ok_or_else(|| BusinessError::Unauthorized {
            message: "User not found".to_string(),
        })?;

    if !user.is_active {
        return Err(BusinessError::Unauthorized {
            message: "User is inactive".to_string(),
        });
    }

    Ok(user)
}

/// Rejects anonymous requests: browsers are redirected to the login page,
/// API clients receive a 401.
pub async fn require_auth(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    match resolve_user(&state, request.headers()).await {
        Ok(user) => {
            request
                .extensions_mut()
                .insert(AuthenticatedUser::from(&user));
            next.run(request).await
        }
        Err(err) => {
            tracing::debug!("Rejected request to {}: {err}", request.uri());
            if wants_html(request.headers()) {
                Redirect::to(LOGIN_PATH).into_response()
            } else {
                err.into_response()
            }
        }
    }
}

/// Must run after [`require_auth`]. Non-staff users are redirected.
pub async fn require_staff(request: Request, next: Next) -> Response {
    let is_staff = request
        .extensions()
        .get::<AuthenticatedUser>()
        .is_some_and(|user| user.is_staff);

    if is_staff {
        next.run(request).await
    } else {
        Redirect::to(ACCESS_DENIED_PATH).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn user(id: i32) -> users::Model {
        users::Model {
            id,
            username: "agent".to_string(),
            password_hash: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            is_active: true,
            is_staff: false,
            is_superuser: false,
            date_joined: Utc::now(),
            last_login: None,
        }
    }

    #[test]
    fn test_access_token_round_trip() {
        let jwt = JwtService::new("secret", 5, 1);
        let token = jwt.generate_access_token(&user(7)).unwrap();
        let claims = jwt.verify_token(&token, TokenType::Access).unwrap();
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.username, "agent");
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let jwt = JwtService::new("secret", 5, 1);
        let refresh = jwt.generate_refresh_token(&user(7)).unwrap();
        assert!(jwt.verify_token(&refresh, TokenType::Access).is_err());
        assert!(jwt.verify_token(&refresh, TokenType::Refresh).is_ok());
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let issuer = JwtService::new("one", 5, 1);
        let verifier = JwtService::new("two", 5, 1);
        let token = issuer.generate_access_token(&user(1)).unwrap();
        assert!(verifier.verify_token(&token, TokenType::Access).is_err());
    }

    #[test]
    fn test_extract_token_prefers_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(COOKIE, HeaderValue::from_static("access_token=def"));
        assert_eq!(extract_token(&headers).as_deref(), Some("abc"));
    }

    #[test]
    fn test_extract_token_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; access_token=def; lang=fr"),
        );
        assert_eq!(extract_token(&headers).as_deref(), Some("def"));

        let mut cleared = HeaderMap::new();
        cleared.insert(COOKIE, HeaderValue::from_static("access_token="));
        assert_eq!(extract_token(&cleared), None);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("abc", 900).to_string();
        assert!(cookie.starts_with("access_token=abc"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=900"));

        let cleared = session_cookie("", 0).to_string();
        assert!(cleared.starts_with("access_token=;"));
        assert!(cleared.contains("Max-Age=0"));

        let mut headers = HeaderMap::new();
        let pair = format!("lang=fr; {}", session_cookie("xyz", 60).stripped());
        headers.insert(COOKIE, HeaderValue::from_str(&pair).unwrap());
        assert_eq!(extract_token(&headers).as_deref(), Some("xyz"));
    }
}
