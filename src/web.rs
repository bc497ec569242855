use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{Router, extract::DefaultBodyLimit};
use tokio::signal::ctrl_c;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::{self, AppState};
use crate::config::HouseSearchConfig;
use crate::location_resolver::IpApiClient;
use crate::routing::OsrmClient;

/// Wire the production upstream clients into the handler state
pub fn build_state(config: &HouseSearchConfig) -> Result<AppState> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.upstream.timeout_seconds.into()))
        .user_agent(config.upstream.user_agent.as_str())
        .build()
        .with_context(|| "Failed to create HTTP client")?;

    Ok(AppState {
        ip_locations: Arc::new(IpApiClient::new(client.clone(), &config.upstream)),
        routes: Arc::new(OsrmClient::new(client, &config.upstream)),
        listings: config.listings.clone(),
    })
}

/// Full application: API under the configured prefix, CORS, tracing and limits
pub fn app(config: &HouseSearchConfig, state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = api::router(state);
    let mut app = match config.server.api_prefix.trim_end_matches('/') {
        "" => Router::new().merge(api),
        prefix => Router::new().nest(prefix, api),
    };

    if let Some(dir) = &config.server.static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    // Oversized bodies surface as a JSON 413 from the extractor, see `HouseSearchError`
    app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .layer(DefaultBodyLimit::max(config.server.body_limit_bytes)),
    )
}

pub async fn run(config: HouseSearchConfig) -> Result<()> {
    let state = build_state(&config)?;
    let app = app(&config, state);

    let host: IpAddr = config
        .server
        .host
        .parse()
        .with_context(|| format!("Invalid server host: {}", config.server.host))?;
    let addr = SocketAddr::new(host, config.server.port);

    if let (Some(cert), Some(key)) = (&config.server.tls_cert_path, &config.server.tls_key_path) {
        return serve_tls(app, addr, cert, key).await;
    }

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(
        "Web server running at http://{}{}",
        listener.local_addr()?,
        config.server.api_prefix
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .with_context(|| "Server error")?;

    info!("Server shut down");
    Ok(())
}

#[cfg(feature = "tls")]
async fn serve_tls(app: Router, addr: SocketAddr, cert: &str, key: &str) -> Result<()> {
    use axum_server::{Handle, tls_rustls::RustlsConfig};

    let tls = RustlsConfig::from_pem_file(cert, key)
        .await
        .with_context(|| format!("Failed to load TLS certificate {cert} / key {key}"))?;

    let handle = Handle::new();
    let shutdown = handle.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.graceful_shutdown(Some(Duration::from_secs(10)));
    });

    info!("Web server running at https://{addr}");
    axum_server::bind_rustls(addr, tls)
        .handle(handle)
        .serve(app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .with_context(|| "Server error")?;

    info!("Server shut down");
    Ok(())
}

#[cfg(not(feature = "tls"))]
async fn serve_tls(_app: Router, _addr: SocketAddr, _cert: &str, _key: &str) -> Result<()> {
    anyhow::bail!("HTTPS is configured but the binary was built without the `tls` feature")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
