use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::{AuthorizationGate, GateDecision, VerifierRejection, invalid_token};

/// Runs the [`AuthorizationGate`] ahead of the routes.
///
/// ```no_run
/// # fn demo(router: paperframe::Router) -> paperframe::Result<()> {
/// use axum::middleware;
/// use paperframe::guard::authorization;
///
/// let app = router
///     .routes()?
///     .layer(middleware::from_fn_with_state(router.authorization_gate()?, authorization));
/// # Ok(())
/// # }
/// ```
pub async fn authorization(State(gate): State<AuthorizationGate>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();

    match gate.admit(&mut parts).await {
        Ok(decision) => {
            if let GateDecision::Unprotected { resource, action } = &decision {
                tracing::debug!(%resource, %action, "route is public");
            }
            next.run(Request::from_parts(parts, body)).await
        }
        Err(err) => {
            tracing::debug!(status = %err.status, error = %err, "verifier rejected request");
            err.into_response()
        }
    }
}

/// Rewrites `401` verifier rejections into the invalid-token envelope.
/// Other responses, including other rejections, pass through untouched.
pub async fn authorization_errors(request: Request, next: Next) -> Response {
    let response = next.run(request).await;

    let unauthorized = response
        .extensions()
        .get::<VerifierRejection>()
        .is_some_and(|rejection| rejection.0 == StatusCode::UNAUTHORIZED);

    if unauthorized {
        invalid_token().into_response()
    } else {
        response
    }
}
