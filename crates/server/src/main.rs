use std::sync::Arc;

use db::DBService;
use server::{AppState, app_router};
use services::services::{
    config::Config,
    messaging::LineClient,
    notification::NotificationService,
    transition_queue::{DEFAULT_DEBOUNCE_WINDOW, TransitionQueue},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Arc::new(Config::from_env());

    let db = DBService::new(&config.database_url).await?;
    tracing::info!("database ready at {}", config.database_url);

    let pusher = LineClient::new(config.line_channel_access_token.clone())?;
    let notifications = NotificationService::new(Arc::new(pusher), config.liff_url.clone());

    let (transitions, _worker) = TransitionQueue::spawn(
        db.clone(),
        notifications.clone(),
        DEFAULT_DEBOUNCE_WINDOW,
    );

    let state = AppState {
        db,
        notifications,
        transitions,
        config: config.clone(),
    };

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("listening on {}", addr);

    axum::serve(listener, app_router(state)).await?;
    Ok(())
}
