use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tracing::{instrument, trace};

use crate::{
    errors::{HtmlRenderingError, Result},
    HtmlRenderer, Size,
};

/// Caps how many renders the wrapped renderer runs at once.
///
/// Callers over the limit wait for a slot; nothing is rejected.
pub struct ConcurrencyLimitedRenderer<R> {
    inner: R,
    permits: Arc<Semaphore>,
}

impl<R: HtmlRenderer> ConcurrencyLimitedRenderer<R> {
    pub fn new(inner: R, max_concurrent_renders: usize) -> Self {
        Self {
            inner,
            permits: Arc::new(Semaphore::new(max_concurrent_renders.max(1))),
        }
    }

    #[must_use]
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }
}

#[async_trait]
impl<R: HtmlRenderer> HtmlRenderer for ConcurrencyLimitedRenderer<R> {
    #[instrument(level = "trace", skip_all)]
    async fn render(&self, html: &str, size: Size) -> Result<Vec<u8>> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| HtmlRenderingError::RendererClosed)?;

        trace!("Acquired render permit");

        self.inner.render(html, size).await
    }
}
