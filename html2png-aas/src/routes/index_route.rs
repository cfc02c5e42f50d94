use axum::{response::Html, Json};
use utoipa::OpenApi;

use super::openapi::ApiDoc;

pub const INDEX_HTML: &str = include_str!("static/index.html");
pub const OPENAPI_PATH: &str = "/openapi.json";

pub(crate) async fn index() -> Html<String> {
    Html(
        INDEX_HTML
            .replace("{{version}}", env!("CARGO_PKG_VERSION"))
            .replace("{{openapi}}", OPENAPI_PATH),
    )
}

pub(crate) async fn openapi_document() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
