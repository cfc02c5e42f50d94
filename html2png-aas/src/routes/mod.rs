pub mod extractors;
pub mod index_route;
pub mod openapi;
pub mod render;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use derive_more::Debug;
use html2png_rendering::HtmlRenderer;

pub use render::render;

use crate::config::Html2PngConfiguration;

use self::index_route::{index, openapi_document, OPENAPI_PATH};

/// Shared, read-only state of the service.
#[derive(Clone, Debug)]
pub struct Html2PngState {
    #[debug(skip)]
    pub renderer: Arc<dyn HtmlRenderer>,
    pub cache_control: Arc<str>,
}

impl Html2PngState {
    pub fn new(renderer: Arc<dyn HtmlRenderer>, config: &Html2PngConfiguration) -> Self {
        Self {
            renderer,
            cache_control: config.rendering.cache_control.as_str().into(),
        }
    }
}

/// Builds the service routes: the documentation page, the OpenAPI document
/// and the render endpoint.
pub fn router(state: Html2PngState, config: &Html2PngConfiguration) -> Router {
    Router::new()
        .route("/", get(index))
        .route(OPENAPI_PATH, get(openapi_document))
        .route("/api/render", post(render))
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        .with_state(state)
}
