use std::{path::PathBuf, time::Duration};

use html2png_rendering::chrome::ChromeRendererOptions;
use serde::{Deserialize, Serialize};
use twelf::config;

#[config]
#[derive(Default, Debug)]
pub struct Html2PngConfiguration {
    pub server: ServerConfiguration,
    pub tracing: Option<TracingConfiguration>,
    pub rendering: RenderingConfiguration,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ServerConfiguration {
    /// The address to bind the server to.
    #[serde(default = "default_address")]
    pub address: String,
    /// The port to bind the server to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// The largest request body, in bytes, that will be read.
    /// Bigger bodies are treated as unreadable and render the title card.
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

#[derive(Default, Serialize, Deserialize, Clone, Debug)]
pub struct TracingConfiguration {
    /// The OpenTelemetry endpoint to send traces to.
    pub endpoint: String,
    /// The service name to use for traces.
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RenderingConfiguration {
    /// Path to the Chromium executable. Auto-detected when unset.
    pub chrome_executable: Option<PathBuf>,

    /// Whether to run Chromium with its sandbox enabled.
    /// Containers running as root usually need this disabled.
    #[serde(default = "default_true")]
    pub sandbox: bool,

    /// How long the connection to Chromium may stay idle before being dropped.
    #[serde(with = "humantime_serde", default = "default_idle_browser_timeout")]
    pub idle_browser_timeout: Duration,

    /// How many renders may run at the same time. Extra requests wait.
    #[serde(default = "default_max_concurrent_renders")]
    pub max_concurrent_renders: usize,

    /// The Cache-Control header sent along with rendered images.
    #[serde(default = "default_cache_control")]
    pub cache_control: String,
}

impl Default for ServerConfiguration {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
            max_body_size: default_max_body_size(),
        }
    }
}

impl Default for RenderingConfiguration {
    fn default() -> Self {
        Self {
            chrome_executable: None,
            sandbox: true,
            idle_browser_timeout: default_idle_browser_timeout(),
            max_concurrent_renders: default_max_concurrent_renders(),
            cache_control: default_cache_control(),
        }
    }
}

impl RenderingConfiguration {
    #[must_use]
    pub fn chrome_options(&self) -> ChromeRendererOptions {
        ChromeRendererOptions {
            executable: self.chrome_executable.clone(),
            sandbox: self.sandbox,
            idle_browser_timeout: self.idle_browser_timeout,
        }
    }
}

fn default_address() -> String {
    "0.0.0.0".to_string()
}

#[inline]
const fn default_port() -> u16 {
    8787
}

#[inline]
const fn default_max_body_size() -> usize {
    2 * 1024 * 1024
}

#[inline]
const fn default_true() -> bool {
    true
}

#[inline]
const fn default_idle_browser_timeout() -> Duration {
    Duration::from_secs(60 * 60 * 24)
}

#[inline]
const fn default_max_concurrent_renders() -> usize {
    4
}

fn default_cache_control() -> String {
    "public, immutable, no-transform, max-age=31536000".to_string()
}

fn default_service_name() -> String {
    "html2png-aas".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendering_defaults_fill_missing_fields() {
        let rendering: RenderingConfiguration =
            serde_json::from_str(r#"{"sandbox": false, "idle_browser_timeout": "5m"}"#)
                .expect("Failed to parse rendering configuration");

        assert!(!rendering.sandbox);
        assert_eq!(rendering.idle_browser_timeout, Duration::from_secs(300));
        assert_eq!(rendering.max_concurrent_renders, 4);
        assert_eq!(rendering.chrome_executable, None);

        let options = rendering.chrome_options();
        assert!(!options.sandbox);
        assert_eq!(options.idle_browser_timeout, Duration::from_secs(300));
    }

    #[test]
    fn server_defaults() {
        let server: ServerConfiguration =
            serde_json::from_str("{}").expect("Failed to parse server configuration");

        assert_eq!(server.address, "0.0.0.0");
        assert_eq!(server.port, 8787);
        assert_eq!(server.max_body_size, 2 * 1024 * 1024);
    }
}
