use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use bigwing_core::identity::{AuthUser, TokenVerifier};
use bigwing_core::{CoreError, CoreResult};
use bigwing_shared::Masked;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// JWT Claims
// ============================================================================

/// Access token claims as issued by the Supabase auth service.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SupabaseClaims {
    pub sub: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: String,
    pub exp: usize,
}

impl From<SupabaseClaims> for AuthUser {
    fn from(claims: SupabaseClaims) -> Self {
        AuthUser {
            id: claims.sub,
            email: claims.email,
            role: claims.role,
        }
    }
}

// ============================================================================
// Local HS256 verification
// ============================================================================

pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &Masked<String>, audience: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[audience]);
        Self {
            key: DecodingKey::from_secret(secret.expose().as_bytes()),
            validation,
        }
    }
}

#[async_trait]
impl TokenVerifier for JwtVerifier {
    async fn verify(&self, token: &str) -> CoreResult<AuthUser> {
        let data = decode::<SupabaseClaims>(token, &self.key, &self.validation)
            .map_err(|e| CoreError::IdentityError(e.to_string()))?;
        Ok(data.claims.into())
    }
}

// ============================================================================
// Authentication Middleware
// ============================================================================

pub const INVALID_TOKEN: &str = "Invalid or expired token";

/// Verifies `token` and turns any failure into a 401.
pub async fn authenticate(state: &AppState, token: &Masked<String>) -> Result<AuthUser, AppError> {
    state.verifier.verify(token.expose()).await.map_err(|e| {
        debug!("Rejected token {}: {}", token, e);
        AppError::AuthenticationError(INVALID_TOKEN.to_string())
    })
}

/// Requires `Authorization: Bearer <token>` and makes the caller available to
/// handlers as `Extension<AuthUser>`.
pub async fn require_user(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let bearer = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or_else(|| AppError::AuthenticationError("Missing bearer token".to_string()))?;

    let token = Masked(bearer.token().to_string());
    let user = authenticate(&state, &token).await?;

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}
