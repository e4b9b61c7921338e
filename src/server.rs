use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::TokenService;
use crate::config::AppConfig;
use crate::database::AccountStore;
use crate::error::{apply_error_status_policy, ErrorStatusPolicy};
use crate::handlers::{self, method_not_allowed};
use crate::middleware::{require_account_token, TOKEN_HEADER};

/// Shared per-process state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AccountStore>,
    pub tokens: Arc<TokenService>,
}

impl AppState {
    pub fn new(store: Arc<dyn AccountStore>, tokens: TokenService) -> Self {
        Self {
            store,
            tokens: Arc::new(tokens),
        }
    }
}

/// Route table only, without the transport layers
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/account",
            get(handlers::list_accounts)
                .post(handlers::create_account)
                // get() would otherwise also answer HEAD
                .head(method_not_allowed)
                .fallback(method_not_allowed),
        )
        .route(
            "/account/:id",
            get(handlers::get_account)
                .delete(handlers::delete_account)
                .head(method_not_allowed)
                .fallback(method_not_allowed)
                .layer(middleware::from_fn_with_state(state.clone(), require_account_token)),
        )
        .route("/transfer", post(handlers::transfer).fallback(method_not_allowed))
        .fallback(handlers::route_not_found)
        .with_state(state)
}

/// Full application: routes plus error status policy, CORS and tracing
pub fn app(state: AppState, config: &AppConfig) -> Router {
    let mut router = routes(state).layer(middleware::from_fn_with_state(
        config.api.error_status,
        apply_error_status_policy,
    ));

    if config.security.enable_cors {
        router = router.layer(cors_layer(config));
    }

    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router
}

/// App with only the status policy applied; what tests mostly need
pub fn app_with_policy(state: AppState, policy: ErrorStatusPolicy) -> Router {
    routes(state).layer(middleware::from_fn_with_state(policy, apply_error_status_policy))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    if config.is_development() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(TOKEN_HEADER)])
}

/// Bind and serve until ctrl-c
pub async fn serve(router: Router, port: u16) -> anyhow::Result<()> {
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", bind_addr, e))?;

    tracing::info!("Bank API listening on http://{}", bind_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
