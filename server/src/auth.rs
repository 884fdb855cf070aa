//! Bearer-token auth. Tokens are HS256 JWTs carrying the principal's id and
//! kind; resolution verifies the signature and expiry, then confirms the id
//! still exists in the one store named by the kind claim. Ids are never
//! probed against other principal stores, so an id shared between
//! collections cannot resolve to the wrong kind.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{config::Config, error::AppError, state::AppState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalKind {
    Admin,
    User,
    #[serde(rename = "voice")]
    VoiceOwner,
}

/// The authenticated identity attached to a request after token resolution.
#[derive(Debug, Clone)]
pub enum Principal {
    Admin(String),
    User(String),
    VoiceOwner(String),
}

impl Principal {
    pub fn admin_id(&self) -> Result<&str, AppError> {
        match self {
            Principal::Admin(id) => Ok(id),
            _ => Err(AppError::Forbidden("Admin access required")),
        }
    }

    pub fn user_id(&self) -> Result<&str, AppError> {
        match self {
            Principal::User(id) => Ok(id),
            _ => Err(AppError::Forbidden("User access required")),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    kind: PrincipalKind,
    exp: i64,
}

pub fn issue_token(config: &Config, kind: PrincipalKind, id: &str) -> Result<String, AppError> {
    let claims = Claims {
        sub: id.to_string(),
        kind,
        exp: (Utc::now() + Duration::days(config.token_ttl_days)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(e.to_string()))
}

pub async fn resolve_token(state: &AppState, token: &str) -> Result<Principal, AppError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.config.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized("Not authorized, token failed"))?;

    let id = data.claims.sub;
    let principal = match data.claims.kind {
        PrincipalKind::Admin => state
            .store
            .admin_by_id(&id)
            .await?
            .map(|_| Principal::Admin(id)),
        PrincipalKind::User => state
            .store
            .user_by_id(&id)
            .await?
            .map(|_| Principal::User(id)),
        PrincipalKind::VoiceOwner => state
            .store
            .voice_by_id(&id)
            .await?
            .map(|_| Principal::VoiceOwner(id)),
    };

    principal.ok_or(AppError::Unauthorized("Not authorized, invalid user"))
}

/// Route layer for protected routes: resolves the bearer token and attaches
/// the [`Principal`] as a request extension.
pub async fn require_principal(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::Unauthorized("Not authorized, no token"))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or(AppError::Unauthorized("Not authorized, no token"))?;

    let principal = resolve_token(&state, token).await?;
    req.extensions_mut().insert(principal);

    Ok(next.run(req).await)
}

pub fn hash_password(raw: &str) -> Result<String, AppError> {
    Ok(bcrypt::hash(raw, bcrypt::DEFAULT_COST)?)
}

pub fn verify_password(raw: &str, hash: &str) -> bool {
    bcrypt::verify(raw, hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use crate::state::AppState;
    use crate::store::MemoryStore;
    use crate::store::Store;

    async fn state_with_user() -> (Arc<AppState>, String) {
        let store = MemoryStore::default();
        let user = User::new(
            "Asha".into(),
            "asha@example.com".into(),
            "9999999999".into(),
            "irrelevant".into(),
        );
        store.insert_user(&user).await.unwrap();

        (
            AppState::for_tests(Arc::new(store)),
            user.id,
        )
    }

    #[tokio::test]
    async fn token_roundtrip_resolves_user_principal() {
        let (state, user_id) = state_with_user().await;
        let token = issue_token(&state.config, PrincipalKind::User, &user_id).unwrap();

        let principal = resolve_token(&state, &token).await.unwrap();
        assert_eq!(principal.user_id().unwrap(), user_id);
    }

    #[tokio::test]
    async fn user_principal_is_rejected_on_admin_guard() {
        let (state, user_id) = state_with_user().await;
        let token = issue_token(&state.config, PrincipalKind::User, &user_id).unwrap();

        let principal = resolve_token(&state, &token).await.unwrap();
        assert!(matches!(
            principal.admin_id(),
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn token_for_unknown_id_is_unauthorized() {
        let (state, _) = state_with_user().await;
        let token =
            issue_token(&state.config, PrincipalKind::User, &crate::models::new_id()).unwrap();

        assert!(matches!(
            resolve_token(&state, &token).await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn expired_token_is_unauthorized() {
        let (state, user_id) = state_with_user().await;

        let claims = Claims {
            sub: user_id,
            kind: PrincipalKind::User,
            exp: (Utc::now() - Duration::hours(2)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(state.config.jwt_secret.as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            resolve_token(&state, &token).await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn garbage_token_is_unauthorized() {
        let (state, _) = state_with_user().await;

        assert!(matches!(
            resolve_token(&state, "not-a-jwt").await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn password_hash_roundtrip() {
        let hash = bcrypt::hash("hunter2", 4).unwrap();
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
    }
}
