use crate::classifier::Classifier;
use crate::sensor::sim::SimulationDriver;
use crate::state::AppState;
use axum::Router;
use axum::routing::{get, post};
use std::sync::{Arc, Mutex, RwLock};

pub mod handlers;
pub mod responses;

/// Shared context handed to every handler.
#[derive(Clone)]
pub struct ApiContext {
    pub state: Arc<RwLock<AppState>>,
    pub classifier: Arc<dyn Classifier>,
    pub driver: Arc<Mutex<SimulationDriver>>,
}

pub fn router(ctx: ApiContext) -> Router {
    Router::new()
        .route(
            "/api/reading",
            get(handlers::get_reading).patch(handlers::patch_reading),
        )
        .route("/api/assessment", get(handlers::get_assessment))
        .route("/api/history", get(handlers::get_history))
        .route("/api/status", get(handlers::get_status))
        .route("/api/assess", post(handlers::post_assess))
        .route("/api/simulation", post(handlers::post_simulation))
        .with_state(ctx)
}
