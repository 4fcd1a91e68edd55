//! Axum router construction.

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use super::{handlers, middleware, state::AppState};

const RTC: &str = "/rtc/:channelName/:role/:tokentype/:uid";
const RTM: &str = "/rtm/:uid";
const RTE: &str = "/rte/:channelName/:role/:tokentype/:uid";

/// Build the application [`Router`] with all routes and middleware attached.
///
/// Token routes are served with and without the trailing slash.
pub fn build(state: AppState) -> Router {
    let [cache_control, expires, pragma] = middleware::no_cache();

    Router::new()
        .route(RTC, get(handlers::rtc_token))
        .route(&format!("{RTC}/"), get(handlers::rtc_token))
        .route(RTM, get(handlers::rtm_token))
        .route(&format!("{RTM}/"), get(handlers::rtm_token))
        .route(RTE, get(handlers::rte_tokens))
        .route(&format!("{RTE}/"), get(handlers::rte_tokens))
        .route("/ping", get(handlers::ping))
        .fallback(handlers::not_found)
        .layer(cache_control)
        .layer(expires)
        .layer(pragma)
        .layer(middleware::cors())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
