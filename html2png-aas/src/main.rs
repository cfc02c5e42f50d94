use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Context;
use html2png_aas_lib::{
    config::Html2PngConfiguration,
    routes::{router, Html2PngState},
    setup_tracing, Html2PngTracing,
};
use html2png_rendering::{
    chrome::ChromeRenderer, limit::ConcurrencyLimitedRenderer, HtmlRenderer,
};
use tokio::net::TcpListener;
use tracing::info;
use twelf::Layer;

const CONFIG_PATH_VARIABLE: &str = "HTML2PNG_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config.toml";
const ENV_PREFIX: &str = "HTML2PNG_";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_configuration()?;

    setup_tracing(config.tracing.as_ref())?;

    let chrome_options = config.rendering.chrome_options();
    let chrome = tokio::task::spawn_blocking(move || ChromeRenderer::launch(chrome_options))
        .await?
        .context("Unable to start the browser")?;

    let renderer: Arc<dyn HtmlRenderer> = Arc::new(ConcurrencyLimitedRenderer::new(
        chrome,
        config.rendering.max_concurrent_renders,
    ));

    let app = router(Html2PngState::new(renderer, &config), &config)
        .layer(Html2PngTracing::new_trace_layer());

    let addr: SocketAddr = format!("{}:{}", config.server.address, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Unable to bind to {addr}"))?;

    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped");

    Ok(())
}

fn load_configuration() -> anyhow::Result<Html2PngConfiguration> {
    let config_path = std::env::var(CONFIG_PATH_VARIABLE)
        .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);

    let mut layers = vec![Layer::DefaultTrait];

    if config_path.exists() {
        layers.push(Layer::Toml(config_path));
    }

    layers.push(Layer::Env(Some(ENV_PREFIX.to_owned())));

    Html2PngConfiguration::with_layers(&layers).context("Unable to load configuration")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Unable to listen for ctrl-c: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Unable to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutting down");
}
