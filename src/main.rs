use normality_check::{config::ServerConfig, web};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = ServerConfig::from_env().expect("invalid STATS_ADDR");
    let addr = config.addr;
    let app = web::router(config);

    info!("normality check listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind STATS_ADDR");
    axum::serve(listener, app).await.expect("server error");
}
