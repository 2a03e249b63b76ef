use anyhow::{Context, Result};
use parley::{
    create_router, AppState, CallSettings, Config, MediaConstraints, NatsGateway, SimulatedDevices,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cfg = Config::load("config/parley")?;

    info!("{} v0.1.0", cfg.service.name);
    info!("Gateway: {}", cfg.gateway.url);
    info!("Guest mode: {}", cfg.session.guest);

    let gateway = Arc::new(
        NatsGateway::connect(&cfg.gateway.url)
            .await
            .context("Failed to connect to the remote data gateway")?,
    );

    let devices = Arc::new(SimulatedDevices::new(MediaConstraints::default()));

    let call_settings = CallSettings {
        stun_servers: cfg.call.stun_servers.clone(),
        connect_delay: Duration::from_millis(cfg.call.connect_delay_ms),
    };

    let state = AppState::new(gateway, devices, cfg.session.guest, call_settings);
    let app = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    axum::serve(listener, app).await.context("HTTP server failed")?;

    Ok(())
}
