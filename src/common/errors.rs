use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{DbErr, SqlErr};
use serde_json::json;
use std::fmt;

/// Error type returned by every handler, rendered as a JSON envelope.
#[derive(Debug, Clone)]
pub enum BusinessError {
    /// Validation errors for user input (400 Bad Request)
    ValidationError { field: String, message: String },
    /// Resource not found (404 Not Found)
    NotFound { resource: String, id: String },
    /// Duplicate resource (409 Conflict)
    Duplicate { resource: String, field: String },
    /// Delete blocked by rows that still reference the resource (409 Conflict)
    Protected { resource: String, message: String },
    /// Missing or invalid credentials (401 Unauthorized)
    Unauthorized { message: String },
    /// Permission denied (403 Forbidden)
    Forbidden { action: String, resource: String },
    /// Generic application error (500 Internal Server Error)
    InternalError { message: String },
}

impl BusinessError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            BusinessError::ValidationError { field, message } => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                format!("Validation failed for field '{field}': {message}"),
            ),
            BusinessError::NotFound { resource, id } => (
                StatusCode::NOT_FOUND,
                "RESOURCE_NOT_FOUND",
                format!("{resource} with id '{id}' not found"),
            ),
            BusinessError::Duplicate { resource, field } => (
                StatusCode::CONFLICT,
                "DUPLICATE_RESOURCE",
                format!("{resource} with this {field} already exists"),
            ),
            BusinessError::Protected { resource, message } => (
                StatusCode::CONFLICT,
                "PROTECTED_RESOURCE",
                format!("Cannot delete {resource}: {message}"),
            ),
            BusinessError::Unauthorized { message } => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                message.clone(),
            ),
            BusinessError::Forbidden { action, resource } => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                format!("Not authorized to {action} {resource}"),
            ),
            BusinessError::InternalError { message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                format!("Internal error: {message}"),
            ),
        }
    }
}

impl fmt::Display for BusinessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.parts().2)
    }
}

impl std::error::Error for BusinessError {}

impl IntoResponse for BusinessError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = self.parts();

        if status.is_server_error() {
            tracing::error!(code = error_code, "{message}");
        }

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
                "type": format!("{self:?}").split(' ').next().unwrap_or("Unknown")
            }
        }));

        (status, body).into_response()
    }
}

/// Maps database errors onto business errors with the resource as context.
pub struct ErrorMapper;

impl ErrorMapper {
    pub fn map_db_error(err: DbErr, context: &str) -> BusinessError {
        let resource = Self::extract_resource_from_context(context);

        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg)) => {
                return BusinessError::Duplicate {
                    resource,
                    field: Self::extract_field_from_constraint(&msg),
                };
            }
            // Deletes go through `map_delete_error`, so a foreign key
            // failure here is a write pointing at a missing row.
            Some(SqlErr::ForeignKeyConstraintViolation(msg)) => {
                return BusinessError::ValidationError {
                    field: resource,
                    message: format!("references a row that does not exist ({msg})"),
                };
            }
            _ => {}
        }

        match err {
            DbErr::RecordNotFound(msg) => BusinessError::NotFound {
                resource,
                id: Self::extract_id_from_message(&msg),
            },
            DbErr::Custom(msg) if msg.starts_with("Validation failed:") => {
                let field = Self::extract_field_from_validation(&msg);
                let message = msg.replace("Validation failed:", "").trim().to_string();
                BusinessError::ValidationError { field, message }
            }
            _ => BusinessError::InternalError {
                message: err.to_string(),
            },
        }
    }

    /// Like [`Self::map_db_error`], but a foreign key failure means rows
    /// still reference the deleted one.
    pub fn map_delete_error(err: DbErr, context: &str) -> BusinessError {
        if let Some(SqlErr::ForeignKeyConstraintViolation(_)) = err.sql_err() {
            return BusinessError::Protected {
                resource: Self::extract_resource_from_context(context),
                message: "still referenced by other records".to_string(),
            };
        }
        Self::map_db_error(err, context)
    }

    fn extract_resource_from_context(context: &str) -> String {
        context.replace('_', " ")
    }

    /// Looks for `id 'value'` first, then any integer or UUID-looking token.
    fn extract_id_from_message(msg: &str) -> String {
        if let Some(start_pos) = msg.find(" id '") {
            let after_id = &msg[start_pos + 5..];
            if let Some(end_pos) = after_id.find('\'') {
                return after_id[..end_pos].to_string();
            }
        }

        msg.split_whitespace()
            .find_map(|word| {
                let cleaned = word.trim_matches('\'').trim_matches('"');
                if (cleaned.len() == 36 && cleaned.matches('-').count() == 4)
                    || cleaned.parse::<i64>().is_ok()
                {
                    Some(cleaned.to_string())
                } else {
                    None
                }
            })
            .unwrap_or_else(|| "unknown".to_string())
    }

    fn extract_field_from_validation(msg: &str) -> String {
        msg.split(':')
            .nth(1)
            .and_then(|part| part.split_whitespace().next())
            .unwrap_or("unknown")
            .to_string()
    }

    /// `UNIQUE constraint failed: schools.adm_code` (SQLite) or
    /// `... unique constraint "schools_adm_code_key"` (Postgres).
    fn extract_field_from_constraint(msg: &str) -> String {
        if let Some((_, columns)) = msg.split_once("failed:") {
            return columns
                .split(',')
                .map(|column| column.trim().rsplit('.').next().unwrap_or(column).trim())
                .collect::<Vec<_>>()
                .join(", ");
        }

        if let Some(start) = msg.find("constraint \"") {
            let rest = &msg[start + 12..];
            if let Some(end) = rest.find('"') {
                return rest[..end].trim_end_matches("_key").to_string();
            }
        }

        "field".to_string()
    }
}

#[macro_export]
macro_rules! validation_error {
    ($field:expr, $message:expr) => {
        $crate::common::errors::BusinessError::ValidationError {
            field: $field.to_string(),
            message: $message.to_string(),
        }
    };
}

#[macro_export]
macro_rules! not_found {
    ($resource:expr, $id:expr) => {
        $crate::common::errors::BusinessError::NotFound {
            resource: $resource.to_string(),
            id: $id.to_string(),
        }
    };
}

#[macro_export]
macro_rules! protected_resource {
    ($resource:expr, $message:expr) => {
        $crate::common::errors::BusinessError::Protected {
            resource: $resource.to_string(),
            message: $message.to_string(),
        }
    };
}

/// Extension trait to add business error conversion to `DbErr`
pub trait DbErrorExt {
    fn to_business_error(self, context: &str) -> BusinessError;
    /// For errors raised by a DELETE.
    fn to_delete_error(self, context: &str) -> BusinessError;
}

impl DbErrorExt for DbErr {
    fn to_business_error(self, context: &str) -> BusinessError {
        ErrorMapper::map_db_error(self, context)
    }

    fn to_delete_error(self, context: &str) -> BusinessError {
        ErrorMapper::map_delete_error(self, context)
    }
}

/// Result type alias for business operations
pub type BusinessResult<T> = Result<T, BusinessError>;
