//! Inbound request builders and response readers.

use axum::{
    body::Body,
    http::{header, Method, Request},
    response::Response,
};
use serde_json::Value;

/// Builds a request against the relay route.
pub fn relay_request(
    method: Method,
    path: &str,
    origin: Option<&str>,
    body: impl Into<Body>,
) -> Request<Body> {
    let mut builder =
        Request::builder().method(method).uri(path).header(header::CONTENT_TYPE, "application/json");

    if let Some(origin) = origin {
        builder = builder.header(header::ORIGIN, origin);
    }

    builder.body(body.into()).expect("valid test request")
}

/// Builds a JSON POST without an `Origin` header.
pub fn post_json(path: &str, body: &str) -> Request<Body> {
    relay_request(Method::POST, path, None, body.to_string())
}

/// Builds a JSON POST from the given origin.
pub fn post_json_from(path: &str, origin: &str, body: &str) -> Request<Body> {
    relay_request(Method::POST, path, Some(origin), body.to_string())
}

/// Builds a pre-flight request from the given origin.
pub fn preflight(path: &str, origin: &str) -> Request<Body> {
    Request::builder()
        .method(Method::OPTIONS)
        .uri(path)
        .header(header::ORIGIN, origin)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .expect("valid test request")
}

/// Reads a response body as UTF-8 text.
pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    String::from_utf8(bytes.to_vec()).expect("response body is UTF-8")
}

/// Reads a response body as JSON.
pub async fn body_json(response: Response) -> Value {
    let text = body_text(response).await;
    serde_json::from_str(&text).expect("response body should be valid JSON")
}
