use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::header::CONTENT_TYPE,
};

use crate::{
    error::{Html2PngError, RenderRequestError, Result},
    model::request::{RenderRequest, RenderRequestBody, RenderRequestQueryParams},
};

impl<S> FromRequest<S> for RenderRequest
where
    S: Send + Sync,
{
    type Rejection = Html2PngError;

    /// Extract a [`RenderRequest`] from an incoming request.
    ///
    /// Only a malformed query string rejects the request. Body failures are
    /// recorded as [`RenderRequestBody::Unreadable`] and resolved later.
    async fn from_request(request: Request, state: &S) -> Result<Self> {
        let (mut parts, body) = request.into_parts();

        let Query(query) = Query::<RenderRequestQueryParams>::from_request_parts(&mut parts, state)
            .await
            .map_err(RenderRequestError::from)?;

        let content_type = parts
            .headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_owned();

        let body = match Bytes::from_request(Request::from_parts(parts, body), state).await {
            Ok(bytes) => RenderRequestBody::Received(bytes),
            Err(rejection) => RenderRequestBody::Unreadable(rejection.body_text()),
        };

        Ok(Self {
            content_type,
            query,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        extract::{DefaultBodyLimit, State},
        http::{Request, StatusCode},
        routing::post,
        Router,
    };
    use tokio::sync::mpsc::Sender;
    use tower::ServiceExt;

    use super::*;

    async fn render_request_from(request: Request<Body>) -> Option<RenderRequest> {
        let (tx, mut rx) = tokio::sync::mpsc::channel::<RenderRequest>(1);

        let app: Router = Router::new()
            .route(
                "/api/render",
                post(
                    |State(state): State<Sender<RenderRequest>>, request: RenderRequest| async move {
                        state.send(request).await.expect("Failed to forward request");
                    },
                ),
            )
            .layer(DefaultBodyLimit::max(16))
            .with_state(tx);

        let response = app.oneshot(request).await.expect("Failed to send request");

        if response.status() != StatusCode::OK {
            return None;
        }

        rx.recv().await
    }

    #[tokio::test]
    async fn extracts_content_type_query_and_body() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/render?width=10&title=Hi")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .expect("Failed to build request");

        let extracted = render_request_from(request).await.expect("Request was rejected");

        assert_eq!(
            extracted,
            RenderRequest {
                content_type: "application/json".to_owned(),
                query: RenderRequestQueryParams {
                    width: Some("10".to_owned()),
                    height: None,
                    title: Some("Hi".to_owned()),
                },
                body: RenderRequestBody::Received(Bytes::from_static(b"{}")),
            }
        );
    }

    #[tokio::test]
    async fn missing_content_type_is_empty() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/render")
            .body(Body::empty())
            .expect("Failed to build request");

        let extracted = render_request_from(request).await.expect("Request was rejected");

        assert_eq!(extracted.content_type, "");
        assert_eq!(extracted.body, RenderRequestBody::Received(Bytes::new()));
    }

    #[tokio::test]
    async fn oversized_body_is_unreadable_instead_of_rejected() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/render")
            .header(CONTENT_TYPE, "text/html")
            .body(Body::from("<p>this body is longer than sixteen bytes</p>"))
            .expect("Failed to build request");

        let extracted = render_request_from(request).await.expect("Request was rejected");

        assert!(matches!(extracted.body, RenderRequestBody::Unreadable(_)));
    }

    #[tokio::test]
    async fn duplicated_query_keys_are_rejected() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/render?width=1&width=2")
            .body(Body::empty())
            .expect("Failed to build request");

        assert!(render_request_from(request).await.is_none());
    }
}
