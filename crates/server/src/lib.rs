use std::sync::Arc;

use axum::Router;
use db::DBService;
use services::services::{
    config::Config, notification::NotificationService, transition_queue::TransitionQueueHandle,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod error;
pub mod routes;

#[derive(Clone)]
pub struct AppState {
    pub db: DBService,
    pub notifications: NotificationService,
    pub transitions: TransitionQueueHandle,
    pub config: Arc<Config>,
}

pub fn app_router(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::tasks::router())
        .merge(routes::projects::router())
        .merge(routes::users::router())
        .merge(routes::groups::router())
        .merge(routes::reports::router());

    Router::new()
        .merge(routes::health::router())
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
