use actix_web::{Error, HttpMessage, HttpRequest, dev::ServiceRequest, web};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::utils::error::CustomError;

/// Identity issued by the authentication provider.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// External user id.
    pub id: String,
    pub exp: usize,
}

pub fn decode_claims(token: &str, secret: &str) -> Result<Claims, CustomError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| CustomError::UnauthorizedError("Invalid token".to_string()))
}

/// Verify the bearer JWT and expose its claims to handlers.
pub async fn verify_token(
    req: ServiceRequest,
    credentials: BearerAuth,
) -> Result<ServiceRequest, (Error, ServiceRequest)> {
    let secret = match req.app_data::<web::Data<AppConfig>>() {
        Some(config) => config.jwt_secret.clone(),
        None => {
            let err = CustomError::InternalServerError("Auth is not configured".to_string());
            return Err((err.into(), req));
        }
    };

    match decode_claims(credentials.token(), &secret) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            Ok(req)
        }
        Err(err) => Err((err.into(), req)),
    }
}

/// Claims placed by [`verify_token`]; use inside authenticated scopes.
pub fn caller_claims(req: &HttpRequest) -> Result<Claims, CustomError> {
    req.extensions()
        .get::<Claims>()
        .cloned()
        .ok_or_else(|| CustomError::UnauthorizedError("Not authenticated".to_string()))
}

#[cfg(test)]
pub fn issue_token(user_id: &str, secret: &str) -> String {
    let claims = Claims {
        id: user_id.to_owned(),
        exp: (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp() as usize,
    };

    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}
