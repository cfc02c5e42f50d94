use html2png_rendering::Size;
use askama::Template;
use tracing::debug;

use crate::{
    error::{RenderRequestBodyError, RenderRequestBodyResult},
    model::request::{
        dimension::{dimension_from_json, dimension_from_str, DEFAULT_HEIGHT, DEFAULT_WIDTH},
        RenderRequest, RenderRequestBody, RenderRequestJsonBody,
    },
};

pub const DEFAULT_TITLE: &str = "Lorem ipsum";

/// The final input handed to the renderer.
///
/// `html` is never empty and both dimensions are at least one pixel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedRenderParams {
    pub html: String,
    pub width: u32,
    pub height: u32,
}

impl ResolvedRenderParams {
    #[must_use]
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

enum ParsedRenderRequestBody {
    Json(RenderRequestJsonBody),
    Text(String),
}

/// Resolves the html, width and height of a render request.
///
/// - JSON bodies: `html` wins when non-empty, otherwise the title card is
///   used with the title taken from the body, then the query, then
///   [`DEFAULT_TITLE`].
/// - Any other body: non-blank text is the html, otherwise the title card with
///   the query title.
/// - Unreadable or malformed bodies: the title card with the query title.
///
/// Width and height are taken from the body (JSON only), then the query, then
/// the defaults. Invalid candidates are skipped.
#[must_use]
pub fn resolve_params(request: &RenderRequest) -> ResolvedRenderParams {
    let query = &request.query;

    let (html, body_width, body_height) = match parse_body(request) {
        Ok(ParsedRenderRequestBody::Json(body)) => {
            let html = match body.html {
                Some(html) if !html.is_empty() => html,
                _ => fallback_fragment(
                    body.title
                        .as_deref()
                        .or(query.title.as_deref())
                        .unwrap_or(DEFAULT_TITLE),
                ),
            };

            (
                html,
                body.width.as_ref().and_then(dimension_from_json),
                body.height.as_ref().and_then(dimension_from_json),
            )
        }
        Ok(ParsedRenderRequestBody::Text(text)) if !text.trim().is_empty() => (text, None, None),
        Ok(ParsedRenderRequestBody::Text(_)) => (query_title_fragment(request), None, None),
        Err(err) => {
            debug!("Falling back to the title card: {err}");

            (query_title_fragment(request), None, None)
        }
    };

    let width = body_width
        .or_else(|| query.width.as_deref().and_then(dimension_from_str))
        .unwrap_or(DEFAULT_WIDTH);

    let height = body_height
        .or_else(|| query.height.as_deref().and_then(dimension_from_str))
        .unwrap_or(DEFAULT_HEIGHT);

    ResolvedRenderParams {
        html,
        width,
        height,
    }
}

fn parse_body(request: &RenderRequest) -> RenderRequestBodyResult<ParsedRenderRequestBody> {
    let bytes = match &request.body {
        RenderRequestBody::Received(bytes) => bytes,
        RenderRequestBody::Unreadable(reason) => {
            return Err(RenderRequestBodyError::Unreadable(reason.clone()))
        }
    };

    if request.is_json() {
        Ok(ParsedRenderRequestBody::Json(serde_json::from_slice(bytes)?))
    } else {
        Ok(ParsedRenderRequestBody::Text(
            String::from_utf8_lossy(bytes).into_owned(),
        ))
    }
}

fn query_title_fragment(request: &RenderRequest) -> String {
    fallback_fragment(request.query.title.as_deref().unwrap_or(DEFAULT_TITLE))
}

/// The title card rendered when no usable html was supplied.
///
/// The title is HTML-escaped by the template.
#[derive(Template)]
#[template(path = "title_card.html")]
struct TitleCard<'a> {
    title: &'a str,
}

#[must_use]
pub fn fallback_fragment(title: &str) -> String {
    TitleCard { title }.to_string()
}
