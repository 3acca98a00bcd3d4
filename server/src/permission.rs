use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use platform_api::ApiError;
use platform_authz::{AccessGrant, PolicyDeclaration, Principal, grant};

/// Route guard: resolves the request's principal against `policy` and stores
/// the resulting [`AccessGrant`] for the handler.
pub async fn enforce(
    State(policy): State<Arc<PolicyDeclaration>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = req
        .extensions_mut()
        .remove::<Principal>()
        .ok_or_else(|| ApiError::unauthorized("unauthorized"))?;
    let principal_id = principal.id;

    let access = grant(principal, &policy).map_err(|denial| {
        tracing::info!(
            principal = %principal_id,
            method = %req.method(),
            path = %req.uri().path(),
            reason = denial.code(),
            detail = %denial,
            "access denied"
        );
        ApiError::from(denial)
    })?;
    tracing::debug!(
        principal = %principal_id,
        scope = %access.scope,
        path = %req.uri().path(),
        "access granted"
    );

    req.extensions_mut().insert::<AccessGrant>(access);
    Ok(next.run(req).await)
}
