use tokio::net::TcpListener;

use relayserver::config::Config;
use relayserver::state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relayserver=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env();
    print_banner(&config);

    let db = relayserver::db::create_pool(&config.database_url)
        .await
        .expect("failed to create database pool");

    if let Err(e) = tokio::fs::create_dir_all(config.storage_path.join("avatars")).await {
        tracing::error!("failed to create storage directory {:?}: {:?}", config.storage_path, e);
    }

    let state = AppState::new(db, &config);
    let app = relayserver::routes::router(state);

    let listener = TcpListener::bind(("0.0.0.0", config.port))
        .await
        .expect("failed to bind");

    let actual_port = listener
        .local_addr()
        .expect("failed to get local address")
        .port();
    eprintln!("  \x1b[32m→ listening on 0.0.0.0:{actual_port}\x1b[0m");
    eprintln!();

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

fn print_banner(config: &Config) {
    let version = env!("CARGO_PKG_VERSION");

    eprintln!();
    eprintln!("  \x1b[1;36mrelay\x1b[0m \x1b[2mv{version}\x1b[0m");
    eprintln!();
    eprintln!("  \x1b[2mport\x1b[0m         {}", config.port);
    eprintln!("  \x1b[2mdatabase\x1b[0m     {}", config.database_url);
    eprintln!("  \x1b[2mstorage\x1b[0m      {}", config.storage_path.display());
    eprintln!(
        "  \x1b[2mheartbeat\x1b[0m    {}s (timeout {}s)",
        config.heartbeat_interval.as_secs(),
        config.heartbeat_timeout.as_secs()
    );
    eprintln!("  \x1b[2mbuffer\x1b[0m       {} events/connection", config.outbound_buffer);
    eprintln!();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
