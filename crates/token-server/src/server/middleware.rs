//! Response headers and CORS policy applied to every route.

use axum::http::{header, HeaderName, HeaderValue, Method};
use tower_http::{
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
};

/// Tokens are per-request secrets; no intermediary may cache them.
pub const NO_CACHE_HEADERS: [(HeaderName, &str); 3] = [
    (
        header::CACHE_CONTROL,
        "private, no-cache, no-store, must-revalidate",
    ),
    (header::EXPIRES, "-1"),
    (header::PRAGMA, "no-cache"),
];

/// One layer per entry of [`NO_CACHE_HEADERS`], overriding handler values.
pub fn no_cache() -> [SetResponseHeaderLayer<HeaderValue>; 3] {
    NO_CACHE_HEADERS.map(|(name, value)| {
        SetResponseHeaderLayer::overriding(name, HeaderValue::from_static(value))
    })
}

/// Browsers may call the API from any origin.
pub fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any)
}
