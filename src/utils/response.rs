use actix_web::{HttpResponse, http::StatusCode};
use serde::Serialize;
use serde_json::json;

pub fn service_name() -> String {
    std::env::var("SERVICE_NAME").unwrap_or_else(|_| "threads-backend".to_string())
}

/// Standard success envelope shared by every controller.
pub fn envelope<T: Serialize>(status: StatusCode, message: &str, data: T) -> HttpResponse {
    HttpResponse::build(status).json(json!({
        "success": true,
        "message": message,
        "httpStatusCode": status.as_u16(),
        "service": service_name(),
        "data": data,
    }))
}

pub fn ok<T: Serialize>(message: &str, data: T) -> HttpResponse {
    envelope(StatusCode::OK, message, data)
}

pub fn created<T: Serialize>(message: &str, data: T) -> HttpResponse {
    envelope(StatusCode::CREATED, message, data)
}
