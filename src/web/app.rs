use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use log::info;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::engine::tracker::Tracker;
use crate::web::handlers;

#[derive(Clone)]
pub struct AppState {
    pub tracker: Arc<Tracker>,
}

impl AppState {
    pub fn new(tracker: Tracker) -> Self {
        Self { tracker: Arc::new(tracker) }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index_handler))
        .route("/select", get(handlers::select_page_handler).post(handlers::select_handler))
        .route("/tracker", get(handlers::tracker_page_handler).post(handlers::tracker_action_handler))
        .route("/set_current", post(handlers::set_current_handler))
        .route("/set_title_size", post(handlers::set_title_size_handler))
        .route("/display", get(handlers::display_page_handler))
        .route("/current_index", get(handlers::current_index_handler))
        .route("/games/:generation", get(handlers::games_handler))
        .route("/static/:file", get(handlers::static_handler))
        .with_state(state)
}

pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    let addr = listener.local_addr()?;
    info!("Tracker: http://{}/tracker", addr);
    info!("Display: http://{}/display", addr);
    axum::serve(listener, build_router(state))
        .await
        .context("http server stopped")?;
    Ok(())
}
