use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::CoreResult;

/// The caller behind a verified access token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
    pub role: String,
}

#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Verify a bearer token and resolve the user it was issued to.
    ///
    /// Fails with `CoreError::IdentityError` when the token is malformed, expired,
    /// signed with another key or issued for another audience.
    async fn verify(&self, token: &str) -> CoreResult<AuthUser>;
}
