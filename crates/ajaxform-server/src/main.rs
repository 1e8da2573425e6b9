use ajaxform::Config;
use ajaxform_server::app_with_config;
use anyhow::Context;
use tracing::info;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_PKG_DIR: &str = "crates/ajaxform-wasm/pkg";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let host = std::env::var("AJAXFORM_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
    let port = std::env::var("AJAXFORM_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT);
    let pkg_dir = std::env::var("AJAXFORM_PKG_DIR").unwrap_or_else(|_| DEFAULT_PKG_DIR.to_string());

    let config = Config::load_default().context("Failed to load ajaxform config")?;

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(%addr, pkg_dir = %pkg_dir, "ajaxform demo server running");
    axum::serve(listener, app_with_config(pkg_dir, config))
        .await
        .context("Server error")?;
    Ok(())
}
