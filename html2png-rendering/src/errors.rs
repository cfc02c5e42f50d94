use thiserror::Error;
use tokio::task::JoinError;

use crate::Size;

#[derive(Debug, Error)]
pub enum HtmlRenderingError {
    #[error("Unable to build browser launch options: {0}")]
    LaunchOptionsError(String),
    #[error("Unable to launch browser: {0}")]
    BrowserLaunchError(String),
    #[error("Browser error while {0}: {1}")]
    BrowserError(&'static str, String),
    #[error("Render task failed to complete: {0}")]
    RenderTaskError(#[from] JoinError),
    #[error("Renderer returned {0} bytes that are not a PNG image")]
    InvalidPngOutput(usize),
    #[error("Renderer is shutting down")]
    RendererClosed,
    #[error("Unable to render an image of size {0}")]
    InvalidSize(Size),
}

pub type Result<T> = std::result::Result<T, HtmlRenderingError>;
