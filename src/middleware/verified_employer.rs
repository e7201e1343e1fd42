use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{
    error::{Error, Result},
    middleware::auth::Claims,
    models::employer::VerificationStatus,
    repositories::employer_repository::verification_status_of,
    AppState,
};

pub fn ensure_verified(status: VerificationStatus) -> Result<()> {
    if status == VerificationStatus::Verified {
        return Ok(());
    }
    Err(Error::NotVerified {
        verification_status: status.as_str().to_string(),
    })
}

async fn check(state: &AppState, claims: Option<Claims>) -> Result<()> {
    let Some(claims) = claims else {
        return Err(Error::unauthorized(
            "MISSING_AUTHORIZATION",
            "Authentication is required",
        ));
    };
    let employer_id = claims.user_id()?;
    let status = verification_status_of(&state.pool, employer_id).await?;
    ensure_verified(status).inspect_err(|_| {
        tracing::warn!(employer_id = %employer_id, status = %status, "unverified employer blocked");
    })
}

/// Lets only Verified employers through; runs after the role middleware has stored the claims.
pub async fn require_verified_employer(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let claims = req.extensions().get::<Claims>().cloned();
    match check(&state, claims).await {
        Ok(()) => next.run(req).await,
        Err(err) => err.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_verified_passes() {
        assert!(ensure_verified(VerificationStatus::Verified).is_ok());
        for status in [VerificationStatus::Pending, VerificationStatus::Rejected] {
            let err = ensure_verified(status).unwrap_err();
            assert_eq!(err.code(), "NOT_VERIFIED");
            assert_eq!(err.status(), axum::http::StatusCode::FORBIDDEN);
        }
    }

    #[tokio::test]
    async fn requires_claims_before_any_lookup() {
        use crate::utils::jwt::tests::test_config;
        use axum::{body::Body, http::StatusCode, middleware::from_fn_with_state, routing::get, Router};
        use sqlx::postgres::PgPoolOptions;
        use tower::ServiceExt;

        let config = test_config();
        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .unwrap();
        let state = AppState::new(pool, config);
        let app = Router::new()
            .route("/jobs", get(|| async { "created" }))
            .route_layer(from_fn_with_state(state.clone(), require_verified_employer))
            .with_state(state);

        let resp = app
            .oneshot(axum::http::Request::get("/jobs").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
