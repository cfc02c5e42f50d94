use std::{net::SocketAddr, time::Duration};

use axum::{
    extract::{ConnectInfo, MatchedPath},
    http::{
        header::{CONTENT_TYPE, USER_AGENT},
        HeaderMap, HeaderName, Request, Response,
    },
};
use opentelemetry::{
    global,
    propagation::Extractor,
    trace::TracerProvider as _,
    KeyValue,
};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{propagation::TraceContextPropagator, runtime, trace, Resource};
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    trace::{DefaultOnBodyChunk, MakeSpan, OnFailure, OnResponse, TraceLayer},
};
use tracing::{debug, field::Empty, info_span, Span};
use tracing_opentelemetry::OpenTelemetrySpanExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{config::TracingConfiguration, error::Html2PngErrorExtension};

const X_FORWARDED_FOR_HEADER: HeaderName = HeaderName::from_static("x-forwarded-for");
const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");
const UNKNOWN: &str = "<unknown>";

/// Installs the global subscriber: env-filtered console output, plus an OTLP
/// exporter when a tracing endpoint is configured.
pub fn setup_tracing(config: Option<&TracingConfiguration>) -> anyhow::Result<()> {
    global::set_text_map_propagator(TraceContextPropagator::new());

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer();

    let otel_layer = config
        .map(|config| -> anyhow::Result<_> {
            let provider = opentelemetry_otlp::new_pipeline()
                .tracing()
                .with_exporter(
                    opentelemetry_otlp::new_exporter()
                        .tonic()
                        .with_endpoint(config.endpoint.clone()),
                )
                .with_trace_config(trace::Config::default().with_resource(Resource::new(vec![
                    KeyValue::new("service.name", config.service_name.clone()),
                ])))
                .install_batch(runtime::Tokio)?;

            let tracer = provider.tracer(config.service_name.clone());
            global::set_tracer_provider(provider);

            Ok(tracing_opentelemetry::layer().with_tracer(tracer))
        })
        .transpose()?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(otel_layer)
        .try_init()?;

    Ok(())
}

/// Span hooks for the HTTP [`TraceLayer`].
///
/// Request details are recorded when the span is created; the status and any
/// [`Html2PngErrorExtension`] are recorded once the response is known.
#[derive(Debug, Clone, Copy, Default)]
pub struct Html2PngTracing;

impl Html2PngTracing {
    #[must_use]
    pub fn new_trace_layer() -> TraceLayer<
        SharedClassifier<ServerErrorsAsFailures>,
        Self,
        (),
        Self,
        DefaultOnBodyChunk,
        (),
        Self,
    > {
        TraceLayer::new_for_http()
            .make_span_with(Self)
            .on_request(())
            .on_response(Self)
            .on_failure(Self)
            .on_eos(())
    }
}

fn header_str<'a>(headers: &'a HeaderMap, header: &HeaderName) -> Option<&'a str> {
    headers.get(header).and_then(|v| v.to_str().ok())
}

/// The caller's address: the first `X-Forwarded-For` hop, else the socket peer.
fn client_ip<B>(request: &Request<B>) -> String {
    header_str(request.headers(), &X_FORWARDED_FOR_HEADER)
        .and_then(|forwarded| forwarded.split(',').next())
        .map(|ip| ip.trim().to_owned())
        .filter(|ip| !ip.is_empty())
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| UNKNOWN.to_owned())
}

struct HeaderMapCarrier<'a>(&'a HeaderMap);

impl Extractor for HeaderMapCarrier<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(HeaderName::as_str).collect()
    }
}

impl<B> MakeSpan<B> for Html2PngTracing {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let headers = request.headers();
        let path = request
            .extensions()
            .get::<MatchedPath>()
            .map_or_else(|| request.uri().path(), MatchedPath::as_str);
        let name = format!("{} {path}", request.method());

        let span = info_span!("HTTP request",
            otel.name = name.as_str(),
            otel.kind = "server",
            otel.status_code = Empty,
            http.method = %request.method(),
            http.path = path,
            http.user_agent = header_str(headers, &USER_AGENT).unwrap_or(UNKNOWN),
            http.content_type = header_str(headers, &CONTENT_TYPE),
            http.client_ip = %client_ip(request),
            request_id = header_str(headers, &X_REQUEST_ID).unwrap_or(UNKNOWN),
            exception.message = Empty,
        );

        let parent = global::get_text_map_propagator(|propagator| {
            propagator.extract(&HeaderMapCarrier(headers))
        });
        span.set_parent(parent);

        span
    }
}

impl<B> OnResponse<B> for Html2PngTracing {
    fn on_response(self, response: &Response<B>, latency: Duration, span: &Span) {
        span.record("otel.status_code", response.status().as_u16());

        if let Some(Html2PngErrorExtension(error)) = response.extensions().get::<Html2PngErrorExtension>() {
            span.record("exception.message", error.to_string().as_str());
        }

        debug!(status = response.status().as_u16(), ?latency, "Finished request");
    }
}

impl<C: std::fmt::Debug> OnFailure<C> for Html2PngTracing {
    fn on_failure(&mut self, failure_classification: C, _latency: Duration, span: &Span) {
        span.record(
            "exception.message",
            format!("{failure_classification:?}").as_str(),
        );
    }
}
