use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use log::{debug, error};
use serde_json::json;
use thiserror::Error;

use crate::utils::response::service_name;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CustomError {
    #[error("Unauthorized: {0}")]
    UnauthorizedError(String),
    #[error("Bad Request: {0}")]
    BadRequestError(String),
    #[error("Internal Server Error: {0}")]
    InternalServerError(String),
    #[error("Not Found: {0}")]
    NotFoundError(String),
    #[error("Validation Error: {0}")]
    ValidationError(String),
}

impl CustomError {
    /// The message without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            CustomError::UnauthorizedError(msg)
            | CustomError::BadRequestError(msg)
            | CustomError::InternalServerError(msg)
            | CustomError::NotFoundError(msg)
            | CustomError::ValidationError(msg) => msg,
        }
    }

    /// Prefix the message with the action that failed, keeping the variant.
    ///
    /// `NotFoundError("Thread not found").context("Error fetching thread")`
    /// becomes `NotFoundError("Error fetching thread: Thread not found")`.
    pub fn context(self, action: &str) -> Self {
        let wrap = |msg: String| format!("{}: {}", action, msg);
        match self {
            CustomError::UnauthorizedError(msg) => CustomError::UnauthorizedError(wrap(msg)),
            CustomError::BadRequestError(msg) => CustomError::BadRequestError(wrap(msg)),
            CustomError::InternalServerError(msg) => CustomError::InternalServerError(wrap(msg)),
            CustomError::NotFoundError(msg) => CustomError::NotFoundError(wrap(msg)),
            CustomError::ValidationError(msg) => CustomError::ValidationError(wrap(msg)),
        }
    }

    fn error_code(&self) -> &'static str {
        match *self {
            CustomError::UnauthorizedError(..) => "UNAUTHORIZED_ERROR",
            CustomError::BadRequestError(..) => "BAD_REQUEST_ERROR",
            CustomError::InternalServerError(..) => "INTERNAL_SERVER_ERROR",
            CustomError::NotFoundError(..) => "NOT_FOUND_ERROR",
            CustomError::ValidationError(..) => "VALIDATION_ERROR",
        }
    }
}

/// Map-err adapter for actions: adds the action description and logs the failure.
pub fn action_failed(action: &'static str) -> impl FnOnce(CustomError) -> CustomError {
    move |err| {
        let err = err.context(action);
        match err {
            CustomError::InternalServerError(_) => error!("{}", err),
            _ => debug!("{}", err),
        }
        err
    }
}

impl From<mongodb::error::Error> for CustomError {
    fn from(err: mongodb::error::Error) -> Self {
        CustomError::InternalServerError(err.to_string())
    }
}

impl From<mongodb::bson::oid::Error> for CustomError {
    fn from(err: mongodb::bson::oid::Error) -> Self {
        CustomError::BadRequestError(format!("Invalid id: {}", err))
    }
}

impl From<redis::RedisError> for CustomError {
    fn from(err: redis::RedisError) -> Self {
        CustomError::InternalServerError(err.to_string())
    }
}

impl ResponseError for CustomError {
    fn status_code(&self) -> StatusCode {
        match *self {
            CustomError::UnauthorizedError(..) => StatusCode::UNAUTHORIZED,
            CustomError::BadRequestError(..) => StatusCode::BAD_REQUEST,
            CustomError::InternalServerError(..) => StatusCode::INTERNAL_SERVER_ERROR,
            CustomError::NotFoundError(..) => StatusCode::NOT_FOUND,
            CustomError::ValidationError(..) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error_message = json!({
            "success": false,
            "message": self.message(),
            "httpStatusCode": self.status_code().as_u16(),
            "error": self.error_code(),
            "service": service_name(),
        });

        HttpResponse::build(self.status_code()).json(error_message)
    }
}
