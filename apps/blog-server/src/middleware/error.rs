//! Error handling - maps handler failures onto HTML error pages.

use actix_web::http::StatusCode;
use actix_web::http::header::ContentType;
use actix_web::{HttpResponse, ResponseError};
use blog_core::error::{ControllerError, PersistenceError};

/// Application-level error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn title(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "Not Found",
            AppError::Internal(_) => "Internal Server Error",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let AppError::Internal(detail) = self {
            tracing::error!("Internal error: {}", detail);
        }

        let status = self.status_code();
        let body = format!(
            "<!DOCTYPE html>\n<html><head><title>{title}</title></head>\
             <body><h1>{code} {title}</h1><p><a href=\"/post\">Back to posts</a></p></body></html>\n",
            title = self.title(),
            code = status.as_u16(),
        );

        HttpResponse::build(status)
            .content_type(ContentType::html())
            .body(body)
    }
}

impl From<ControllerError> for AppError {
    fn from(err: ControllerError) -> Self {
        match err {
            ControllerError::NotFound { entity_type, id } => {
                AppError::NotFound(format!("{} with id {} not found", entity_type, id))
            }
            ControllerError::Persistence(err) => err.into(),
        }
    }
}

impl From<PersistenceError> for AppError {
    fn from(err: PersistenceError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<tera::Error> for AppError {
    fn from(err: tera::Error) -> Self {
        AppError::Internal(format!("Template error: {err:?}"))
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use blog_core::domain::PostId;

    #[test]
    fn not_found_maps_to_404() {
        let err: AppError = ControllerError::post_not_found(PostId::new(3)).into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Not found: Post with id 3 not found");
    }

    #[test]
    fn persistence_failure_maps_to_500() {
        let err: AppError =
            ControllerError::Persistence(PersistenceError::Constraint("unique".into())).into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[actix_web::test]
    async fn connection_failure_is_logged_with_detail_but_not_shown() {
        let err: AppError = PersistenceError::Connection("pool timed out".into()).into();
        assert!(matches!(&err, AppError::Internal(detail) if detail.contains("pool timed out")));

        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("500 Internal Server Error"));
        assert!(!body.contains("pool timed out"));
    }
}
