use tracing_subscriber::EnvFilter;

use stardrift_server::build_app;
use stardrift_server::config::ServerConfig;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut config = ServerConfig::load();

    // `stardrift-server [web_root]` overrides the configured asset dir.
    if let Some(root) = std::env::args().nth(1) {
        config.web_root = root;
    }

    config.validate();

    if !std::path::Path::new(&config.web_root).is_dir() {
        tracing::error!(web_root = %config.web_root, "web root is not a directory");
        std::process::exit(1);
    }

    let addr = config.listen_addr.clone();
    let (app, _state) = build_app(config);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind to {addr}: {e}"));

    tracing::info!("Stardrift server listening on {addr}");

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
