#[cfg(feature = "chrome")]
pub mod chrome;
pub mod errors;
pub mod limit;
pub mod png;

use async_trait::async_trait;
use derive_more::Display;

use crate::errors::Result;

/// Output size of a render, in CSS pixels.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
#[display("{width}x{height}")]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Turns an HTML document into PNG image bytes.
///
/// Implementations own everything past the markup itself: parsing, layout,
/// fonts and image encoding. A successful render always yields data that
/// starts with the PNG signature.
#[async_trait]
pub trait HtmlRenderer: Send + Sync {
    async fn render(&self, html: &str, size: Size) -> Result<Vec<u8>>;
}
