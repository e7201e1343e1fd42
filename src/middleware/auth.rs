use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{Error, Result},
    models::user::Role,
    utils::jwt::decode_token,
    AppState,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub role: String,
    pub jti: String,
    pub iat: usize,
    pub exp: usize,
    pub iss: String,
    pub aud: String,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| Error::unauthorized("INVALID_TOKEN", "Token subject is not a user id"))
    }

    pub fn role(&self) -> Option<Role> {
        self.role.parse().ok()
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role() == Some(role)
    }
}

fn authenticate(state: &AppState, req: &Request) -> Result<Claims> {
    let Some(auth_header) = req.headers().get(axum::http::header::AUTHORIZATION) else {
        return Err(Error::unauthorized(
            "MISSING_AUTHORIZATION",
            "Authorization header is required",
        ));
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return Err(Error::unauthorized(
            "BAD_AUTHORIZATION",
            "Authorization header is malformed",
        ));
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return Err(Error::unauthorized(
            "UNSUPPORTED_SCHEME",
            "Only Bearer tokens are accepted",
        ));
    };

    decode_token(&state.config, token.trim()).map_err(|err| {
        tracing::warn!(error = %err, "rejected bearer token");
        Error::unauthorized("INVALID_TOKEN", "Token is invalid or expired")
    })
}

/// Decodes the bearer token, checks the role allow-list (empty allows any role)
/// and stores the claims in the request extensions.
pub async fn require_roles(state: &AppState, mut req: Request, next: Next, allowed: &[Role]) -> Response {
    let claims = match authenticate(state, &req) {
        Ok(claims) => claims,
        Err(err) => return err.into_response(),
    };
    if !allowed.is_empty() && !allowed.iter().any(|role| claims.has_role(*role)) {
        return Error::forbidden("FORBIDDEN", "You do not have access to this resource")
            .into_response();
    }
    req.extensions_mut().insert(claims);
    next.run(req).await
}

pub async fn require_auth(State(state): State<AppState>, req: Request, next: Next) -> Response {
    require_roles(&state, req, next, &[]).await
}

pub async fn require_admin(State(state): State<AppState>, req: Request, next: Next) -> Response {
    require_roles(&state, req, next, &[Role::Admin]).await
}

pub async fn require_candidate(State(state): State<AppState>, req: Request, next: Next) -> Response {
    require_roles(&state, req, next, &[Role::Candidate]).await
}

pub async fn require_employer(State(state): State<AppState>, req: Request, next: Next) -> Response {
    require_roles(&state, req, next, &[Role::Employer]).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::CurrentUser;
    use crate::utils::jwt::{issue_token, tests::{sample_user, test_config}};
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request as HttpRequest, StatusCode},
        middleware::from_fn_with_state,
        routing::get,
        Router,
    };
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    fn state() -> AppState {
        let config = test_config();
        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .unwrap();
        AppState::new(pool, config)
    }

    async fn whoami(user: CurrentUser) -> String {
        user.id.to_string()
    }

    fn app(state: AppState) -> Router {
        Router::new()
            .route("/admin", get(whoami))
            .route_layer(from_fn_with_state(state.clone(), require_admin))
            .with_state(state)
    }

    async fn error_code(resp: Response) -> String {
        let bytes = to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        body["errorCode"].as_str().unwrap_or_default().to_string()
    }

    fn get_with(auth: Option<&str>) -> HttpRequest<Body> {
        let mut req = HttpRequest::get("/admin");
        if let Some(auth) = auth {
            req = req.header(header::AUTHORIZATION, auth);
        }
        req.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        let resp = app(state()).oneshot(get_with(None)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(error_code(resp).await, "MISSING_AUTHORIZATION");
    }

    #[tokio::test]
    async fn non_bearer_scheme_is_rejected() {
        let resp = app(state())
            .oneshot(get_with(Some("Basic dXNlcjpwYXNz")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(error_code(resp).await, "UNSUPPORTED_SCHEME");
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let resp = app(state())
            .oneshot(get_with(Some("Bearer not-a-jwt")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(error_code(resp).await, "INVALID_TOKEN");
    }

    #[tokio::test]
    async fn wrong_role_is_forbidden() {
        let state = state();
        let token = issue_token(&state.config, &sample_user("Candidate")).unwrap();
        let auth = format!("Bearer {}", token.token);
        let resp = app(state).oneshot(get_with(Some(&auth))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert_eq!(error_code(resp).await, "FORBIDDEN");
    }

    #[tokio::test]
    async fn matching_role_reaches_handler_with_claims() {
        let state = state();
        let admin = sample_user("Admin");
        let token = issue_token(&state.config, &admin).unwrap();
        let auth = format!("Bearer {}", token.token);
        let resp = app(state).oneshot(get_with(Some(&auth))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = to_bytes(resp.into_body(), 1024).await.unwrap();
        assert_eq!(std::str::from_utf8(&bytes).unwrap(), admin.id.to_string());
    }

    #[test]
    fn claims_role_parsing() {
        let config = test_config();
        let token = issue_token(&config, &sample_user("Employer")).unwrap();
        let claims = decode_token(&config, &token.token).unwrap();
        assert!(claims.has_role(Role::Employer));
        assert!(!claims.has_role(Role::Admin));
        assert!(claims.user_id().is_ok());
    }
}
