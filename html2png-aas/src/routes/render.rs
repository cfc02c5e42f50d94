use axum::{
    extract::State,
    http::{
        header::{CACHE_CONTROL, CONTENT_TYPE, ETAG},
        HeaderValue,
    },
    response::{IntoResponse, Response},
};
use tracing::{debug, instrument};
use xxhash_rust::xxh3::xxh3_64;

use super::Html2PngState;
use crate::{
    error::Result,
    model::{
        request::{RenderRequest, RenderRequestJsonBody, RenderRequestQueryParams},
        resolver::{resolve_params, ResolvedRenderParams},
    },
};

const IMAGE_PNG_MIME: &str = "image/png";

/// Render HTML to PNG
///
/// Send `application/json` with `html` (or just a `title`), or any other
/// content type with the raw HTML as the body. Without usable HTML a title
/// card is rendered. Bodies that cannot be read or parsed never fail the
/// request; they render the title card too.
#[utoipa::path(
    post,
    path = "/api/render",
    tag = "Render",
    params(RenderRequestQueryParams),
    request_body(
        content = RenderRequestJsonBody,
        content_type = "application/json",
        description = "Render options. Non-JSON bodies are rendered as raw HTML."
    ),
    responses(
        (status = 200, description = "Returns a PNG image", content_type = "image/png", body = Vec<u8>),
        (status = 400, description = "The query string could not be parsed"),
        (status = 500, description = "The renderer failed"),
    )
)]
#[axum::debug_handler]
#[instrument(skip_all, fields(width, height, html.len))]
pub async fn render(State(state): State<Html2PngState>, request: RenderRequest) -> Result<Response> {
    let params = resolve_params(&request);

    let span = tracing::Span::current();
    span.record("width", params.width);
    span.record("height", params.height);
    span.record("html.len", params.html.len());

    let image = state.renderer.render(&params.html, params.size()).await?;

    debug!("Rendered {} bytes", image.len());

    Ok(create_image_response(image, &state, &params))
}

fn create_image_response<T>(image: T, state: &Html2PngState, params: &ResolvedRenderParams) -> Response
where
    T: IntoResponse,
{
    let mut response = image.into_response();
    let headers = response.headers_mut();

    headers.insert(CONTENT_TYPE, HeaderValue::from_static(IMAGE_PNG_MIME));

    if let Ok(cache_ctrl) = HeaderValue::from_str(&state.cache_control) {
        headers.insert(CACHE_CONTROL, cache_ctrl);
    }

    let hash = xxh3_64(format!("{params:?}").as_bytes());

    if let Ok(etag_value) = HeaderValue::from_str(&format!("\"{hash:x}\"")) {
        headers.insert(ETAG, etag_value);
    }

    response
}
