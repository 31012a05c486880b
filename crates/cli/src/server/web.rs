use axum::Router;
use sentinel_api::{create_api_routes, AppState};
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Mounts the admin HTTP surface (spec §6) under `/api` and serves it
/// until the process shuts down. The SPA frontend itself is an external
/// collaborator (spec §1 "Non-goals"); this binary exposes the JSON
/// contract only.
pub async fn start_web_server(bind_addr: SocketAddr, state: AppState, cors_allowed_origins: Vec<String>) -> anyhow::Result<()> {
    let cors = build_cors(&cors_allowed_origins);

    let app = Router::new()
        .nest("/api", create_api_routes(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    info!(bind_address = %bind_addr, "starting admin HTTP surface");
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_cors(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let parsed: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
        .max_age(Duration::from_secs(3600))
}
