use std::str::FromStr;

use axum::{
    extract::rejection::FormRejection,
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    routing::post,
    Form, Router,
};
use axum_extra::body::AsyncReadBody;
use eyre::Context;
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;

use grabtube_core::{catalog::Container, extract};

use crate::{
    app_state::SharedState,
    http_error::{ApiError, ApiResult},
    mime_type::guess_mime_type_path,
};

pub fn router() -> Router<SharedState> {
    Router::new().route("/download", post(post_download))
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DownloadQuery {
    pub url: String,
    /// Format id picked from the catalog.
    pub itag: String,
    /// `"mp3"` for the audio entry, anything else means video as mp4.
    #[serde(default)]
    pub ext: Option<String>,
}

#[utoipa::path(post, path = "/download",
request_body(content = DownloadQuery, content_type = "application/x-www-form-urlencoded"),
responses(
    (status = 200, body = String, content_type = "application/octet",
        description = "The file as an attachment, or the uniform error body"),
))]
#[tracing::instrument(skip(app_state, query))]
pub async fn post_download(
    State(app_state): State<SharedState>,
    query: Result<Form<DownloadQuery>, FormRejection>,
) -> ApiResult<Response> {
    let Form(query) = query.map_err(|rejection| ApiError::message(rejection.body_text()))?;
    let container = query
        .ext
        .as_deref()
        .and_then(|ext| Container::from_str(ext).ok())
        .unwrap_or(Container::Mp4);
    info!(itag = %query.itag, %container, "downloading {}", query.url);
    let path = extract::dispatch_download(
        &app_state.ytdlp,
        &app_state.download_dir,
        &query.url,
        &query.itag,
        container,
    )
    .await?;

    let file = tokio::fs::File::open(&path).await?;
    let mut headers = HeaderMap::new();
    if let Some(file_name) = path.file_name() {
        let disposition = format!("attachment; filename=\"{}\"", file_name);
        headers.insert(
            header::CONTENT_DISPOSITION,
            HeaderValue::from_bytes(disposition.as_bytes())
                .wrap_err("error setting content-disposition header")?,
        );
    }
    if let Some(content_type) = guess_mime_type_path(&path) {
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_str(&content_type)
                .wrap_err("error setting content-type header")?,
        );
    }
    let body = AsyncReadBody::new(file);
    Ok((headers, body).into_response())
}
