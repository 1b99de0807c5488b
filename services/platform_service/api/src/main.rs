use std::net::SocketAddr;

use platform_service_api::{build_router, build_state};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .init();

    tracing::info!("platform service starting");

    let config = shared_config::Config::from_env().expect("failed to load configuration");
    tracing::info!(environment = %config.environment, "configuration loaded");

    let db_pool = shared_db::init_pool(&config.database_url)
        .await
        .expect("failed to connect to database");
    tracing::info!("database connected");

    sqlx::migrate!("../../../migrations")
        .run(&db_pool)
        .await
        .expect("failed to run migrations");
    tracing::info!("migrations applied");

    let host = config.host.clone();
    let port = config.port;

    let state = build_state(config, db_pool).expect("failed to wire services");
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .expect("invalid HOST/PORT");
    tracing::info!(%addr, "platform service listening");
    tracing::info!("swagger ui available at /docs");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind listener");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("server error");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install signal handler");
    tracing::info!("shutdown signal received");
}
