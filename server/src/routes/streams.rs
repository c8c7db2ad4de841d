use axum::{
    extract::rejection::FormRejection,
    extract::State,
    routing::post,
    Form, Json, Router,
};
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;

use grabtube_core::{catalog, youtube};

use crate::{
    app_state::SharedState,
    http_error::{ApiError, ApiResult},
    schema::StreamsResponse,
};

pub fn router() -> Router<SharedState> {
    Router::new().route("/get_streams", post(post_get_streams))
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct StreamsQuery {
    pub url: String,
}

#[utoipa::path(post, path = "/get_streams",
request_body(content = StreamsQuery, content_type = "application/x-www-form-urlencoded"),
responses(
    (status = 200, body = StreamsResponse, description = "Stream catalog, or the uniform error body"),
))]
#[tracing::instrument(skip(app_state, query))]
pub async fn post_get_streams(
    State(app_state): State<SharedState>,
    query: Result<Form<StreamsQuery>, FormRejection>,
) -> ApiResult<Json<StreamsResponse>> {
    let Form(query) = query.map_err(|rejection| ApiError::message(rejection.body_text()))?;
    let url = query.url.trim();
    if !youtube::is_watch_url(url) {
        return Err(ApiError::message("Invalid YouTube URL"));
    }
    let url = youtube::canonicalize_watch_url(url);
    info!("resolving streams for {}", url);
    let metadata = app_state.ytdlp.probe(&url).await?;
    let catalog = catalog::build_catalog(&metadata.formats);
    Ok(Json(StreamsResponse::new(metadata, catalog)))
}
