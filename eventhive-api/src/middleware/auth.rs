use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use chrono::{Duration, Utc};
use eventhive_shared::{User, UserRole};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::{AppState, AuthConfig};

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    pub sub: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub exp: usize,
}

impl SessionClaims {
    pub fn for_user(user: &User, auth: &AuthConfig) -> Self {
        Self {
            sub: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            exp: (Utc::now() + Duration::seconds(auth.expiration as i64)).timestamp() as usize,
        }
    }

    pub fn is_organizer(&self) -> bool {
        self.role == UserRole::Organizer
    }
}

pub fn issue_token(claims: &SessionClaims, auth: &AuthConfig) -> Result<String, jsonwebtoken::errors::Error> {
    encode(&Header::default(), claims, &EncodingKey::from_secret(auth.secret.as_bytes()))
}

/// Who is making the request, if anyone. Always present in request
/// extensions once [`session_middleware`] has run.
#[derive(Debug, Clone, Default)]
pub struct Session(pub Option<SessionClaims>);

// ============================================================================
// Session Middleware
// ============================================================================

/// Decodes an optional bearer token. Missing or invalid tokens leave the
/// request anonymous; handlers decide whether that is acceptable.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let claims = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .and_then(|header| {
            decode::<SessionClaims>(
                header.token(),
                &DecodingKey::from_secret(state.auth.secret.as_bytes()),
                &Validation::default(),
            )
            .map_err(|e| tracing::debug!("Ignoring bearer token: {}", e))
            .ok()
        })
        .map(|data| data.claims);

    req.extensions_mut().insert(Session(claims));
    next.run(req).await
}

// ============================================================================
// Organizer Guard
// ============================================================================

pub async fn organizer_middleware(req: Request, next: Next) -> Result<Response, StatusCode> {
    let session = req
        .extensions()
        .get::<Session>()
        .and_then(|s| s.0.as_ref())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if !session.is_organizer() {
        return Err(StatusCode::FORBIDDEN);
    }

    Ok(next.run(req).await)
}
