use axum::Router;

use crate::state::AppState;

pub mod client;
pub mod dto;
pub mod handlers;
pub mod metering;
pub mod models;
pub mod prompt;

pub use client::{GenerationClient, OpenAiClient};
pub use models::Model;

pub fn router() -> Router<AppState> {
    handlers::router()
}
