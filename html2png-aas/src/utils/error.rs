use std::sync::Arc;

use axum::response::IntoResponse;
use html2png_rendering::errors::HtmlRenderingError;
use http::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Html2PngError {
    #[error("Invalid render request: {0}")]
    RenderRequestError(#[from] RenderRequestError),
    #[error("Render error: {0}")]
    RenderError(#[from] HtmlRenderingError),
}

#[derive(Error, Debug)]
pub enum RenderRequestError {
    #[error("Query Rejection Error: {0}")]
    QueryRejection(#[from] axum::extract::rejection::QueryRejection),
}

/// Reasons a request body could not be used. These never reach the caller;
/// the request degrades to the title card instead.
#[derive(Error, Debug)]
pub enum RenderRequestBodyError {
    #[error("Unable to read request body: {0}")]
    Unreadable(String),
    #[error("Unable to parse request body as json: {0}")]
    MalformedJson(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Html2PngError>;
pub(crate) type RenderRequestBodyResult<T> = std::result::Result<T, RenderRequestBodyError>;

impl Html2PngError {
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::RenderRequestError(_) => StatusCode::BAD_REQUEST,
            Self::RenderError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Carries the error that produced a response, for the tracing layer.
#[derive(Clone, Debug)]
pub struct Html2PngErrorExtension(pub Arc<Html2PngError>);

impl IntoResponse for Html2PngError {
    fn into_response(self) -> axum::response::Response {
        let mut res = axum::response::IntoResponse::into_response(self.to_string());
        *res.status_mut() = self.status_code();

        res.extensions_mut().insert(Html2PngErrorExtension(Arc::new(self)));

        res
    }
}
