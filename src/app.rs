use std::net::SocketAddr;

use axum::{
    extract::Request,
    middleware::{self, Next},
    routing::get,
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    addresses,
    auth::{
        self,
        middleware::{require_auth, role_gate, ADMIN_ONLY},
    },
    carts, catalog, orders, payments, reviews,
    state::AppState,
    users,
};

/// `/api` holds public and authenticated routes, `/api/admin` is admin-only.
pub fn build_app(state: AppState) -> Router {
    let public = Router::new()
        .merge(auth::public_router())
        .merge(catalog::routes())
        .route("/health", get(|| async { "ok" }));

    let protected = Router::new()
        .merge(auth::router())
        .merge(carts::routes())
        .merge(orders::routes())
        .merge(payments::routes())
        .merge(reviews::routes())
        .merge(addresses::routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let admin = Router::new()
        .merge(catalog::admin_routes())
        .merge(orders::admin_routes())
        .merge(users::admin_routes())
        .route_layer(middleware::from_fn(|req: Request, next: Next| {
            role_gate(ADMIN_ONLY, req, next)
        }))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .nest("/api", public.merge(protected))
        .nest("/api/admin", admin)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, ?latency, "response");
                        } else {
                            tracing::info!(%status, ?latency, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let addr: SocketAddr = state.config.bind_addr()?;
    let app = build_app(state);

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
