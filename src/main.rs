use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use spinwheel::{abuse, api, auth, config::AppConfig, headers, sim, state::AppState};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spinwheel=debug,tower_http=debug,axum=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Spinwheel...");

    let config = AppConfig::from_env();
    let admin_auth = Arc::new(auth::AdminAuth::from_env(config.environment));
    let addr = SocketAddr::from((config.host, config.port));
    let rate = config.rate;
    let window = Duration::from_secs(rate.window_secs);

    let state = Arc::new(AppState::new(config));
    let incidents = state.incidents.clone();

    let wheel_limit = abuse::RouteLimit::new("wheel", rate.wheel, window, incidents.clone());
    let spin_limit = abuse::RouteLimit::new("spin", rate.spin, window, incidents.clone());
    let analytics_limit =
        abuse::RouteLimit::new("analytics", rate.analytics, window, incidents.clone());
    let blockchain_limit =
        abuse::RouteLimit::new("blockchain", rate.blockchain, window, incidents.clone());
    let collaboration_limit =
        abuse::RouteLimit::new("collaboration", rate.collaboration, window, incidents.clone());
    let report_limit = abuse::RouteLimit::new("report", rate.report, window, incidents);

    abuse::spawn_cleanup(vec![
        wheel_limit.limiter.clone(),
        spin_limit.limiter.clone(),
        analytics_limit.limiter.clone(),
        blockchain_limit.limiter.clone(),
        collaboration_limit.limiter.clone(),
        report_limit.limiter.clone(),
    ]);

    let wheel_routes = Router::new()
        .route("/api/wheel", post(api::create_wheel))
        .route("/wheel", post(api::create_wheel_form))
        .layer(middleware::from_fn_with_state(
            wheel_limit,
            abuse::rate_limit_middleware,
        ));

    let spin_routes = Router::new()
        .route("/api/spin", post(api::spin))
        .layer(middleware::from_fn_with_state(
            spin_limit,
            abuse::rate_limit_middleware,
        ));

    let analytics_routes = Router::new()
        .route("/api/analytics", post(sim::analytics))
        .layer(middleware::from_fn_with_state(
            analytics_limit,
            abuse::rate_limit_middleware,
        ));

    let blockchain_routes = Router::new()
        .route("/api/blockchain-verify", post(sim::blockchain_verify))
        .layer(middleware::from_fn_with_state(
            blockchain_limit,
            abuse::rate_limit_middleware,
        ));

    let collaboration_routes = Router::new()
        .route("/api/collaboration", post(sim::collaboration))
        .layer(middleware::from_fn_with_state(
            collaboration_limit,
            abuse::rate_limit_middleware,
        ));

    // Auth inside the rate limit so unauthenticated probing is throttled too
    let report_routes = Router::new()
        .route("/api/security-report", get(api::security_report))
        .layer(middleware::from_fn_with_state(
            admin_auth,
            auth::admin_auth_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            report_limit,
            abuse::rate_limit_middleware,
        ));

    let app = Router::new()
        .merge(wheel_routes)
        .merge(spin_routes)
        .merge(analytics_routes)
        .merge(blockchain_routes)
        .merge(collaboration_routes)
        .merge(report_routes)
        .route("/health", get(api::health))
        .fallback_service(ServeDir::new("static"))
        .layer(middleware::from_fn(headers::security_headers))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
