use {
    payment_poller::{AppState, adapters::routes::router, config::Settings},
    std::process,
    tokio::signal,
    tower::ServiceBuilder,
    tower_http::timeout::TimeoutLayer,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            process::exit(1);
        }
    };
    let bind_addr = settings.bind_addr;
    let request_timeout = settings.request_timeout;

    let state = match AppState::new(settings) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!(error = %e, "failed to build http client");
            process::exit(1);
        }
    };

    let app = router(state).layer(ServiceBuilder::new().layer(TimeoutLayer::new(request_timeout)));

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .expect("failed to bind listener");
    tracing::info!("listening on {bind_addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to listen for ctrl+c");
    };

    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to listen for SIGTERM")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => tracing::info!("received ctrl+c, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
