//! Headless Chromium backend, driven over the DevTools protocol.

use std::{fmt::Display, path::PathBuf, sync::Arc, time::Duration};

use async_trait::async_trait;
use derive_more::Debug;
use headless_chrome::{
    browser::tab::Tab,
    protocol::cdp::{Emulation, Page},
    Browser, LaunchOptions,
};
use serde_json::json;
use tracing::{instrument, trace_span, warn, Span};

use crate::{
    errors::{HtmlRenderingError, Result},
    png::ensure_png_data,
    HtmlRenderer, Size,
};

const BLANK_PAGE: &str = "about:blank";
const FONTS_READY: &str = "document.fonts.ready.then(() => true)";

#[derive(Debug, Clone)]
pub struct ChromeRendererOptions {
    /// Path to the Chromium executable. Auto-detected when unset.
    pub executable: Option<PathBuf>,
    /// Whether to keep Chromium's sandbox enabled.
    pub sandbox: bool,
    /// How long the browser connection may stay silent before it is dropped.
    pub idle_browser_timeout: Duration,
}

impl Default for ChromeRendererOptions {
    fn default() -> Self {
        Self {
            executable: None,
            sandbox: true,
            idle_browser_timeout: Duration::from_secs(60 * 60 * 24 * 365),
        }
    }
}

/// Renders HTML by screenshotting it in a headless Chromium.
///
/// One browser process is shared; every render opens and closes its own tab.
#[derive(Debug)]
pub struct ChromeRenderer {
    #[debug(skip)]
    browser: Arc<Browser>,
}

impl ChromeRenderer {
    #[instrument(level = "debug")]
    pub fn launch(options: ChromeRendererOptions) -> Result<Self> {
        let launch_options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(options.sandbox)
            .path(options.executable)
            .idle_browser_timeout(options.idle_browser_timeout)
            .build()
            .map_err(|e| HtmlRenderingError::LaunchOptionsError(e.to_string()))?;

        let browser = Browser::new(launch_options)
            .map_err(|e| HtmlRenderingError::BrowserLaunchError(format!("{e:#}")))?;

        Ok(Self {
            browser: Arc::new(browser),
        })
    }

    fn render_blocking(browser: &Browser, html: &str, size: Size) -> Result<Vec<u8>> {
        let tab = browser
            .new_tab()
            .map_err(browser_error("opening a tab"))?;

        let result = Self::capture(&tab, html, size);

        if let Err(err) = tab.close(true) {
            warn!("Unable to close render tab: {err:#}");
        }

        ensure_png_data(result?)
    }

    fn capture(tab: &Tab, html: &str, size: Size) -> Result<Vec<u8>> {
        trace_span!("resize_viewport").in_scope(|| {
            tab.call_method(viewport_metrics(size)?)
                .map_err(browser_error("resizing the viewport"))
        })?;

        trace_span!("load_document").in_scope(|| -> Result<()> {
            tab.navigate_to(BLANK_PAGE)
                .and_then(Tab::wait_until_navigated)
                .map_err(browser_error("opening a blank page"))?;

            let frame_id = tab
                .call_method(Page::GetFrameTree(None))
                .map_err(browser_error("looking up the main frame"))?
                .frame_tree
                .frame
                .id;

            tab.call_method(document_content(frame_id, html))
                .map_err(browser_error("loading the document"))?;

            tab.evaluate(FONTS_READY, true)
                .map_err(browser_error("waiting for fonts"))?;

            Ok(())
        })?;

        let clip = Page::Viewport {
            x: 0.0,
            y: 0.0,
            width: f64::from(size.width),
            height: f64::from(size.height),
            scale: 1.0,
        };

        trace_span!("capture_screenshot").in_scope(|| {
            tab.capture_screenshot(
                Page::CaptureScreenshotFormatOption::Png,
                None,
                Some(clip),
                true,
            )
            .map_err(browser_error("taking a screenshot"))
        })
    }
}

#[async_trait]
impl HtmlRenderer for ChromeRenderer {
    #[instrument(level = "debug", skip(self, html), fields(html.len = html.len()))]
    async fn render(&self, html: &str, size: Size) -> Result<Vec<u8>> {
        if size.is_empty() {
            return Err(HtmlRenderingError::InvalidSize(size));
        }

        let browser = Arc::clone(&self.browser);
        let html = html.to_owned();
        let span = Span::current();

        tokio::task::spawn_blocking(move || {
            span.in_scope(|| Self::render_blocking(&browser, &html, size))
        })
        .await?
    }
}

fn browser_error<E: Display>(action: &'static str) -> impl FnOnce(E) -> HtmlRenderingError {
    move |err| HtmlRenderingError::BrowserError(action, format!("{err:#}"))
}

/// Per-tab viewport override. Unlike window bounds this is not shared with
/// other tabs of the same browser window.
fn viewport_metrics(size: Size) -> Result<Emulation::SetDeviceMetricsOverride> {
    serde_json::from_value(json!({
        "width": size.width,
        "height": size.height,
        "deviceScaleFactor": 1.0,
        "mobile": false,
    }))
    .map_err(|err| HtmlRenderingError::BrowserError("preparing the viewport", err.to_string()))
}

/// The markup is handed to the frame directly, so its size is not bound by
/// URL length limits.
fn document_content(frame_id: String, html: &str) -> Page::SetDocumentContent {
    Page::SetDocumentContent {
        frame_id,
        html: html.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::png::is_png_data;

    #[test]
    fn viewport_matches_requested_size() {
        let metrics = viewport_metrics(Size::new(300, 200)).expect("Invalid device metrics");

        assert_eq!(metrics.width, 300);
        assert_eq!(metrics.height, 200);
        assert!((metrics.device_scale_factor - 1.0).abs() < f64::EPSILON);
        assert!(!metrics.mobile);
        assert_eq!(metrics.scale, None);
    }

    #[test]
    fn large_documents_are_not_sent_through_a_url() {
        let html = format!("<p>{}</p>", "x".repeat(1_600_000));

        let command = document_content("main".to_owned(), &html);

        assert_eq!(command.frame_id, "main");
        assert_eq!(command.html, html);
        assert_eq!(BLANK_PAGE, "about:blank");
    }

    #[tokio::test]
    #[ignore = "requires a local Chromium installation"]
    async fn renders_png_with_chromium() {
        let renderer = ChromeRenderer::launch(ChromeRendererOptions {
            sandbox: false,
            ..Default::default()
        })
        .expect("Failed to launch Chromium");

        let png = renderer
            .render(
                "<div style=\"background:#160f29;width:100vw;height:100vh\"></div>",
                Size::new(320, 200),
            )
            .await
            .expect("Failed to render");

        assert!(is_png_data(&png));
    }

    #[tokio::test]
    #[ignore = "requires a local Chromium installation"]
    async fn rejects_empty_size() {
        let renderer = ChromeRenderer::launch(ChromeRendererOptions {
            sandbox: false,
            ..Default::default()
        })
        .expect("Failed to launch Chromium");

        let result = renderer.render("<p>hi</p>", Size::new(0, 10)).await;
        assert!(matches!(result, Err(HtmlRenderingError::InvalidSize(_))));
    }

    fn png_size(png: &[u8]) -> (u32, u32) {
        let width = u32::from_be_bytes(png[16..20].try_into().expect("Truncated PNG header"));
        let height = u32::from_be_bytes(png[20..24].try_into().expect("Truncated PNG header"));

        (width, height)
    }

    #[tokio::test(flavor = "multi_thread")]
    #[ignore = "requires a local Chromium installation"]
    async fn concurrent_renders_keep_their_own_size() {
        let renderer = Arc::new(
            ChromeRenderer::launch(ChromeRendererOptions {
                sandbox: false,
                ..Default::default()
            })
            .expect("Failed to launch Chromium"),
        );

        let sizes = [Size::new(1200, 630), Size::new(300, 300), Size::new(640, 480)];

        let tasks: Vec<_> = sizes
            .into_iter()
            .map(|size| {
                let renderer = Arc::clone(&renderer);
                tokio::spawn(async move {
                    let png = renderer
                        .render("<div style=\"width:100vw;height:100vh\"></div>", size)
                        .await
                        .expect("Failed to render");
                    (size, png)
                })
            })
            .collect();

        for task in tasks {
            let (size, png) = task.await.expect("Render task panicked");
            assert_eq!(png_size(&png), (size.width, size.height));
        }
    }
}
