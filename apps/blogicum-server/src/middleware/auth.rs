//! Authentication extractors.

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};
use futures::future::LocalBoxFuture;
use uuid::Uuid;

use blogicum_core::policy::{self, Requester};
use blogicum_core::ports::{AuthError, TokenClaims};

use crate::middleware::error::AppError;
use crate::state::AppState;

/// Authenticated user identity extractor.
///
/// Requests without a valid, unrevoked bearer token are redirected to the
/// login page:
/// ```ignore
/// async fn protected_route(identity: Identity) -> impl Responder {
///     format!("Hello, {}!", identity.user_id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: Uuid,
    pub claims: TokenClaims,
}

impl Identity {
    pub fn requester(&self) -> Requester {
        Requester::User(self.user_id)
    }
}

impl From<TokenClaims> for Identity {
    fn from(claims: TokenClaims) -> Self {
        Self {
            user_id: claims.user_id,
            claims,
        }
    }
}

/// Pull the token out of `Authorization: Bearer <token>`.
fn bearer_token(req: &HttpRequest) -> Result<String, AuthError> {
    let value = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuth)?;

    let value = value
        .to_str()
        .map_err(|_| AuthError::InvalidToken("Invalid authorization header".to_string()))?;

    value
        .strip_prefix("Bearer ")
        .map(str::to_string)
        .ok_or_else(|| AuthError::InvalidToken("Expected Bearer token".to_string()))
}

impl FromRequest for Identity {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let token = bearer_token(req);
        let next = req.path().to_string();

        Box::pin(async move {
            let Some(state) = state else {
                tracing::error!("AppState not found in app data");
                return Err(AppError::Internal("Server configuration error".to_string()));
            };

            let claims = match token {
                Ok(token) => match state.accounts.authenticate(&token).await {
                    Ok(claims) => Some(claims),
                    Err(AuthError::Store(msg)) => {
                        return Err(AppError::Internal(format!("Session store error: {msg}")));
                    }
                    Err(e) => {
                        tracing::debug!(error = %e, path = %next, "Rejected bearer token");
                        None
                    }
                },
                Err(e) => {
                    tracing::debug!(error = %e, path = %next, "Anonymous request to protected route");
                    None
                }
            };

            let requester = Requester::from(claims.as_ref().map(|c| c.user_id));
            match (policy::require_authenticated(&requester), claims) {
                (Ok(_), Some(claims)) => Ok(Identity::from(claims)),
                _ => Err(AppError::login_required(&next)),
            }
        })
    }
}

/// Optional identity extractor - doesn't fail if not authenticated.
pub struct OptionalIdentity(pub Option<Identity>);

impl OptionalIdentity {
    pub fn requester(&self) -> Requester {
        self.0
            .as_ref()
            .map_or(Requester::Anonymous, Identity::requester)
    }
}

impl FromRequest for OptionalIdentity {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let identity = Identity::from_request(req, payload);

        Box::pin(async move {
            match identity.await {
                Ok(identity) => Ok(OptionalIdentity(Some(identity))),
                Err(err @ AppError::Internal(_)) => Err(err.into()),
                Err(_) => Ok(OptionalIdentity(None)),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test};
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};

    use blogicum_core::admin::AdminRegistry;
    use blogicum_core::ports::{TokenRevocationStore, TokenService};
    use blogicum_core::services::{AccountService, BlogService};
    use blogicum_infra::{
        Argon2PasswordService, InMemoryBlogStore, JwtConfig, JwtTokenService, SystemClock,
    };

    use super::*;

    struct UnreachableStore;

    #[async_trait]
    impl TokenRevocationStore for UnreachableStore {
        async fn revoke(&self, _jti: Uuid, _until: DateTime<Utc>) -> Result<(), AuthError> {
            Err(AuthError::Store("connection refused".to_string()))
        }

        async fn is_revoked(&self, _jti: Uuid) -> Result<bool, AuthError> {
            Err(AuthError::Store("connection refused".to_string()))
        }
    }

    async fn whoami(identity: Identity) -> HttpResponse {
        HttpResponse::Ok().body(identity.user_id.to_string())
    }

    fn state_with(tokens: Arc<JwtTokenService>) -> AppState {
        let repos = Arc::new(InMemoryBlogStore::new()).repositories();
        let clock = Arc::new(SystemClock);
        let accounts = AccountService::new(
            repos.users.clone(),
            Arc::new(Argon2PasswordService::fast()),
            tokens,
            Arc::new(UnreachableStore),
            clock.clone(),
        );

        AppState {
            blog: Arc::new(BlogService::new(repos, clock)),
            accounts: Arc::new(accounts),
            admin: Arc::new(AdminRegistry::blog().unwrap()),
            db: None,
        }
    }

    #[actix_web::test]
    async fn test_session_store_failure_is_internal_error() {
        let tokens = Arc::new(JwtTokenService::new(JwtConfig {
            secret: "extractor-test-secret".to_string(),
            ..JwtConfig::default()
        }));
        let token = tokens.generate_token(Uuid::new_v4(), "writer").unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state_with(tokens)))
                .route("/", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/")
            .insert_header((header::AUTHORIZATION, format!("Bearer {token}")))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let req = test::TestRequest::get().uri("/").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::FOUND);
    }
}
