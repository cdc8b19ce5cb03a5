use anyhow::Result;
use axum::{routing::get, Router};
use axum_prometheus::PrometheusMetricLayer;
use sam2_viz::{
    config::ServerConfig,
    server::{router, AppState},
    VisualizationConfig,
};
use tracing::{info, Level};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = ServerConfig::from_env()?;
    info!(
        "config: body_limit={} bytes, max_concurrent_renders={}, static_dir={}",
        config.body_limit,
        config.max_concurrent_renders,
        config.static_dir.display()
    );

    let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();

    let state = AppState::new(VisualizationConfig::default(), config.max_concurrent_renders);

    let app = Router::new()
        .route("/metrics", get(move || async move { metric_handle.render() }))
        .merge(router(state, &config))
        .layer(prometheus_layer);

    info!("server listening on http://{}", config.addr);
    axum::serve(tokio::net::TcpListener::bind(config.addr).await?, app).await?;
    Ok(())
}
