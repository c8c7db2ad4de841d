use utoipa::OpenApi;

use grabtube::openapi;

fn main() {
    let oapi: utoipa::openapi::OpenApi = openapi::ApiDoc::openapi();
    println!("{}", oapi.to_pretty_json().expect("document serializes"));
}
