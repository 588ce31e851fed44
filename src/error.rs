use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::{payments::PaymentError, response::ApiResponse};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{message}")]
    BadRequestWithErrors { message: String, errors: Vec<String> },

    #[error("Validation failed")]
    Validation(#[from] ValidationErrors),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Payment gateway error")]
    Payment(#[from] PaymentError),

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("Database error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn not_found(what: &str) -> Self {
        AppError::NotFound(format!("{what} not found"))
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_)
            | AppError::BadRequestWithErrors { .. }
            | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Payment(_) => StatusCode::BAD_GATEWAY,
            AppError::DbError(_) | AppError::OrmError(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn errors(&self) -> Vec<String> {
        match self {
            AppError::BadRequestWithErrors { errors, .. } => errors.clone(),
            AppError::Validation(errors) => {
                let mut out = Vec::new();
                flatten_validation_errors("", errors, &mut out);
                out.sort();
                out
            }
            AppError::Payment(err) => vec![err.to_string()],
            AppError::DbError(err) => vec![err.to_string()],
            AppError::OrmError(err) => vec![err.to_string()],
            AppError::Internal(err) => vec![format!("{err:#}")],
            _ => Vec::new(),
        }
    }
}

fn flatten_validation_errors(prefix: &str, errors: &ValidationErrors, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                for error in list {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("failed '{}' check", error.code));
                    out.push(format!("{path}: {message}"));
                }
            }
            ValidationErrorsKind::Struct(inner) => flatten_validation_errors(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    flatten_validation_errors(&format!("{path}[{index}]"), inner, out);
                }
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }

        let body: ApiResponse<serde_json::Value> =
            ApiResponse::failure(self.to_string(), self.errors());

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Line {
        #[validate(range(min = 1, message = "must be at least 1"))]
        quantity: i32,
    }

    #[derive(Validate)]
    struct Payload {
        #[validate(email(message = "must be a valid email"))]
        email: String,
        #[validate]
        items: Vec<Line>,
    }

    #[test]
    fn validation_errors_are_flattened_per_field() {
        let payload = Payload {
            email: "nope".into(),
            items: vec![Line { quantity: 1 }, Line { quantity: 0 }],
        };
        let err = AppError::from(payload.validate().unwrap_err());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.errors(),
            vec![
                "email: must be a valid email".to_string(),
                "items[1].quantity: must be at least 1".to_string(),
            ]
        );
    }

    #[test]
    fn server_errors_carry_detail() {
        let err = AppError::Internal(anyhow::anyhow!("disk on fire"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.errors(), vec!["disk on fire".to_string()]);
    }
}
