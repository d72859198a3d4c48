use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use goaltrack::cache::SqliteSnapshotCache;
use goaltrack::config::AppConfig;
use goaltrack::connectivity::{ConnectivityProbe, NetworkMonitor};
use goaltrack::db;
use goaltrack::identity::Session;
use goaltrack::remote::{FirestoreHttpClient, InMemoryRemoteStore, RemoteStore};
use goaltrack::routes::router;
use goaltrack::services::{GoalStore, LogNotifier, ReminderRequest, ReminderScheduler};
use goaltrack::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "goaltrack=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    let pool = db::connect(&config.database_url).await?;

    let remote: Arc<dyn RemoteStore> = match config.firestore.clone() {
        Some(firestore) => {
            info!("Using Firestore project {}", firestore.project_id);
            Arc::new(FirestoreHttpClient::new(firestore)?)
        }
        None => {
            warn!("FIRESTORE_PROJECT_ID not set, goals are kept in memory only");
            Arc::new(InMemoryRemoteStore::new())
        }
    };
    let cache = Arc::new(SqliteSnapshotCache::new(pool.clone()));
    let session = Arc::new(Session::new());
    let store = Arc::new(GoalStore::new(remote, cache, session.clone()));

    tokio::spawn(store.clone().run_session_watcher());

    let network = NetworkMonitor::new(true);
    let probe = ConnectivityProbe::new(
        network.clone(),
        config.probe_url.clone(),
        config.probe_interval_secs,
    )?;
    tokio::spawn(probe.start());

    let reminder = ReminderScheduler::new(
        store.clone(),
        Arc::new(LogNotifier),
        ReminderRequest::daily(config.reminder_hour, config.reminder_minute)?,
    );
    tokio::spawn(reminder.start());

    let state = AppState {
        db: pool.clone(),
        store,
        session,
        network,
    };

    let app = router(state);

    info!("listening on http://{}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
