use job_board_backend::{config::Config, database::pool::{create_pool, run_migrations}, routes, AppState};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env()?;
    let pool = create_pool(&config).await?;
    run_migrations(&pool).await?;

    tokio::fs::create_dir_all(&config.uploads_dir).await?;
    let addr: SocketAddr = config.server_address.parse()?;

    let state = AppState::new(pool, config);
    if state.auth_repository.ensure_bootstrap_admin().await? {
        info!("bootstrap administrator created");
    }

    let app = routes::app(state);
    let listener = TcpListener::bind(addr).await?;
    info!("listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
