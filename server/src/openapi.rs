use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::streams::post_get_streams,
        crate::routes::download::post_download,
    ),
    components(schemas(
        crate::routes::streams::StreamsQuery,
        crate::routes::download::DownloadQuery,
        crate::schema::StreamsResponse,
        crate::schema::StreamBuckets,
        crate::schema::VideoStream,
        crate::schema::AudioStream,
    )),
    tags((name = "grabtube"))
)]
pub struct ApiDoc;
