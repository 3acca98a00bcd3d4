mod departments;
mod login;
mod roles;
mod users;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::State,
    handler::Handler,
    http::{HeaderName, HeaderValue, Method, header},
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{get, post},
};
use platform_api::ApiError;
use platform_authz::PolicyDeclaration;
use platform_db::DbPool;
use products_hr::HrError;
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::{auth, config::AppConfig, permission, policies::RoutePolicies};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Arc<AppConfig>,
    pub policies: Arc<RoutePolicies>,
}

#[derive(Clone, Debug)]
pub struct ServeConfig {
    addr: SocketAddr,
}

impl ServeConfig {
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr }
    }
}

pub async fn serve(config: ServeConfig, state: AppState) -> anyhow::Result<()> {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    info!(%config.addr, "hr server listening");
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;
    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();
    let allow_origin = if allowed.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(allowed)
    };
    CorsLayer::new()
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_origin(allow_origin)
}

pub fn build_router(state: AppState) -> Router {
    let policies = state.policies.clone();
    let guard = |policy: &PolicyDeclaration| {
        from_fn_with_state(Arc::new(policy.clone()), permission::enforce)
    };

    let api = Router::new()
        .route("/auth/login", post(login::login))
        .route(
            "/users",
            get(users::list.layer(guard(&policies.list_users)))
                .post(users::create.layer(guard(&policies.create_user))),
        )
        .route(
            "/users/me",
            get(users::me.layer(guard(&policies.current_user))),
        )
        .route(
            "/users/{id}",
            get(users::get.layer(guard(&policies.get_user)))
                .patch(users::update.layer(guard(&policies.update_user)))
                .delete(users::delete.layer(guard(&policies.delete_user))),
        )
        .route(
            "/roles",
            get(roles::list.layer(guard(&policies.read_roles)))
                .post(roles::create.layer(guard(&policies.create_role))),
        )
        .route(
            "/roles/{id}",
            get(roles::get.layer(guard(&policies.read_roles))),
        )
        .route(
            "/departments",
            get(departments::list.layer(guard(&policies.read_departments)))
                .post(departments::create.layer(guard(&policies.create_department))),
        )
        .route(
            "/departments/{id}",
            get(departments::get.layer(guard(&policies.read_departments))),
        )
        .layer(from_fn_with_state(state.clone(), auth::authenticate));

    let request_id = MakeRequestUuid;
    let header_name = HeaderName::from_static("x-request-id");
    Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(header_name.clone(), request_id))
                .layer(PropagateRequestIdLayer::new(header_name))
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config.cors_allowed_origins)),
        )
        .with_state(state)
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let db_ok = platform_db::ping(&state.pool).await;
    Json(HealthResponse {
        ok: db_ok,
        db_ok,
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    db_ok: bool,
    version: &'static str,
}

pub(crate) fn hr_error(err: HrError) -> ApiError {
    match err {
        HrError::NotFound(entity) => ApiError::not_found(format!("{entity} not found")),
        HrError::Conflict(message) => ApiError::conflict(message),
        HrError::Validation(message) => ApiError::invalid(message),
        other => ApiError::internal(other.into()),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install CTRL+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    ctrl_c.await;

    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    };
    info!("shutdown signal received");
}
