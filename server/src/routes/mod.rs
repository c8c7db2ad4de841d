use axum::Router;

use crate::app_state::SharedState;

pub mod download;
pub mod streams;

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .merge(streams::router())
        .merge(download::router())
}
