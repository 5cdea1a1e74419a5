//! Cross-origin policy for the browser front-end.
//!
//! Only `GET` (and its preflight) is exposed; origins come from
//! `CORS_ALLOWED_ORIGINS`.

use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{Any, CorsLayer};

/// Build the CORS layer for the configured origins.
///
/// `*` allows any origin without credentials.  An explicit origin list
/// also allows credentialed requests.
pub fn build_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods([Method::GET, Method::OPTIONS]);

    if allowed_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any).allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|s| HeaderValue::from_str(s).ok())
        .collect();
    let headers: [HeaderName; 2] = [header::CONTENT_TYPE, header::AUTHORIZATION];

    layer
        .allow_origin(origins)
        .allow_headers(headers)
        .allow_credentials(true)
}
