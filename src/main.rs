use admin_console::app::{create_app, AppState};
use admin_console::config::AppConfig;
use admin_console::{db, docs, events};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_env();
    init_tracing();

    let config = AppConfig::from_env()?;
    let port = config.port;

    let pool = match config.database_url.as_deref() {
        Some(url) => Some(db::init(url)?),
        None => {
            tracing::warn!("DATABASE_URL not set; health check will report the database as down");
            None
        }
    };

    let state = AppState::from_config(config, pool);
    tokio::spawn(events::start_audit_listener(state.event_bus.subscribe()));

    let doc = docs::build_openapi(port)?;
    let app = create_app(state).merge(docs::swagger_routes(doc)?);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

fn load_env() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    let crate_env = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    let _ = dotenvy::from_path(crate_env);
}

fn init_tracing() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false);

    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
