pub mod app_state;
pub mod http_error;
pub mod mime_type;
pub mod openapi;
pub mod routes;
pub mod schema;
pub mod static_pages;
