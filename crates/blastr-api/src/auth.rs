//! API-key authentication

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use blastr_common::types::TenantId;
use blastr_core::CampaignService;
use blastr_storage::repository::ApiKeyRepository;
use blastr_storage::DatabasePool;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{error, warn};
use uuid::Uuid;

/// Application state shared across handlers
pub struct AppState {
    pub db_pool: DatabasePool,
    pub campaigns: Arc<CampaignService>,
}

/// Authenticated context extracted from an API key
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// The tenant this API key belongs to
    pub tenant_id: TenantId,
    /// API key ID for audit logging
    pub api_key_id: Uuid,
}

impl AuthContext {
    /// Check whether the request is authorized for the given tenant
    pub fn is_authorized_for_tenant(&self, tenant_id: TenantId) -> bool {
        self.tenant_id == tenant_id
    }
}

/// Reject requests that address another tenant's resources
pub fn require_tenant_access(auth: &AuthContext, tenant_id: TenantId) -> Result<(), StatusCode> {
    if auth.is_authorized_for_tenant(tenant_id) {
        Ok(())
    } else {
        Err(StatusCode::FORBIDDEN)
    }
}

/// Extract the API key from the Authorization or X-API-Key header
fn extract_api_key(req: &Request) -> Option<&str> {
    if let Some(auth) = req.headers().get("authorization") {
        if let Ok(auth_str) = auth.to_str() {
            if let Some(key) = auth_str.strip_prefix("Bearer ") {
                return Some(key);
            }
        }
    }

    if let Some(key) = req.headers().get("x-api-key") {
        if let Ok(key_str) = key.to_str() {
            return Some(key_str);
        }
    }

    None
}

/// Hash an API key for comparison against legacy hashes
fn hash_api_key(api_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(api_key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Verify an API key against a stored hash.
///
/// Supports Argon2 hashes (`$argon2...`) and legacy SHA-256 hex hashes.
fn verify_api_key(api_key: &str, stored_hash: &str) -> bool {
    if stored_hash.starts_with("$argon2") {
        return PasswordHash::new(stored_hash)
            .ok()
            .map(|parsed| {
                Argon2::default()
                    .verify_password(api_key.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false);
    }

    hash_api_key(api_key) == stored_hash
}

/// Authentication middleware: resolves the API key to an `AuthContext`
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let api_key = extract_api_key(&req).ok_or(StatusCode::UNAUTHORIZED)?;

    if api_key.len() < 8 {
        warn!("API key too short");
        return Err(StatusCode::UNAUTHORIZED);
    }
    let prefix = &api_key[..8];

    let repo = ApiKeyRepository::new(state.db_pool.pool().clone());

    let candidates = repo.find_by_prefix(prefix).await.map_err(|e| {
        error!("Database error while looking up API key: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let matched = candidates
        .into_iter()
        .find(|candidate| verify_api_key(api_key, &candidate.key_hash))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if let Err(e) = repo.touch(matched.id).await {
        warn!("Failed to record API key usage: {}", e);
    }

    req.extensions_mut().insert(AuthContext {
        tenant_id: matched.tenant_id,
        api_key_id: matched.id,
    });

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_key_verification() {
        let key = "blastr_k_0123456789abcdef";
        let hash = hash_api_key(key);
        assert!(verify_api_key(key, &hash));
        assert!(!verify_api_key("blastr_k_wrong", &hash));
    }

    #[test]
    fn test_malformed_argon2_hash_is_rejected() {
        assert!(!verify_api_key("anything", "$argon2id$not-a-real-hash"));
    }
}
