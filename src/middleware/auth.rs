//! Middleware de alcance por empresa
//!
//! Cada request se resuelve a una empresa. Con `JWT_SECRET` configurado y
//! un header `Authorization: Bearer <jwt>`, la empresa sale del claim
//! `business_id`; sin header se usa `DEFAULT_BUSINESS_ID`.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{state::AppState, utils::errors::AppError};

/// Claims del JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: Option<String>,
    pub business_id: String,
    pub exp: usize,
}

/// Empresa de la request, inyectada en las extensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessScope {
    pub business_id: Uuid,
}

pub async fn business_scope_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let bearer = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    let business_id = match (bearer, state.config.jwt_secret.as_deref()) {
        (Some(token), Some(secret)) => business_from_token(token, secret)?,
        _ => state.config.default_business_id,
    };

    request.extensions_mut().insert(BusinessScope { business_id });
    Ok(next.run(request).await)
}

/// Valida un HS256 y devuelve su `business_id`
pub fn business_from_token(token: &str, secret: &str) -> Result<Uuid, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        log::warn!("🔒 Token rechazado: {}", e);
        AppError::Unauthorized("Token inválido".to_string())
    })?;

    Uuid::parse_str(&token_data.claims.business_id)
        .map_err(|_| AppError::Unauthorized("ID de empresa inválido".to_string()))
}
