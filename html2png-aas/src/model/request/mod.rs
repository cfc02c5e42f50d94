use axum::body::Bytes;
use serde::Deserialize;
use serde_json::Value;
use utoipa::ToSchema;

pub mod dimension;
pub mod query;

pub use query::RenderRequestQueryParams;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Everything a render request carries, detached from the HTTP framework.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderRequest {
    /// The declared `Content-Type` of the body, or an empty string.
    pub content_type: String,
    pub query: RenderRequestQueryParams,
    pub body: RenderRequestBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderRequestBody {
    Received(Bytes),
    /// The body stream failed (client went away, size limit exceeded, ...).
    Unreadable(String),
}

impl Default for RenderRequestBody {
    fn default() -> Self {
        Self::Received(Bytes::new())
    }
}

/// JSON payload accepted by `POST /api/render`.
///
/// Dimensions are kept as raw JSON values so that bad numbers fall back to
/// the next source instead of failing the whole body.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, ToSchema)]
pub struct RenderRequestJsonBody {
    /// HTML document to render. When missing or empty a title card is rendered instead.
    pub html: Option<String>,
    /// Image width in pixels.
    #[schema(value_type = Option<u32>, minimum = 1)]
    pub width: Option<Value>,
    /// Image height in pixels.
    #[schema(value_type = Option<u32>, minimum = 1)]
    pub height: Option<Value>,
    /// Title shown on the title card.
    pub title: Option<String>,
}

impl RenderRequest {
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.content_type
            .to_ascii_lowercase()
            .contains(JSON_CONTENT_TYPE)
    }
}
