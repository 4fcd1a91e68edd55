//! Axum request handlers for all service endpoints.

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use common::{
    protocol::{PingResponse, RtcTokenResponse, RteTokenResponse, RtmTokenResponse},
    ServiceError,
};
use tracing::{debug, error};

use super::{
    error::ApiError,
    params::{self, ChannelPath, TokenQuery, TokenRequest, UserPath},
    state::AppState,
};
use crate::signer::Grant;

/// `GET /rtc/{channelName}/{role}/{tokentype}/{uid}/` — channel token.
pub async fn rtc_token(
    State(state): State<AppState>,
    path: Result<Path<ChannelPath>, PathRejection>,
    query: Result<Query<TokenQuery>, QueryRejection>,
) -> Result<Json<RtcTokenResponse>, ApiError> {
    let Path(path) = path?;
    let Query(query) = query?;
    let req = TokenRequest::try_from(path)?;
    let expire_at = expire_at(&state, &query)?;

    let rtc_token = sign(&state, &req.rtc_grant(), expire_at)?;
    debug!(channel = %req.channel_name, expire_at, "issued rtc token");
    Ok(Json(RtcTokenResponse { rtc_token }))
}

/// `GET /rtm/{uid}/` — messaging login token.
pub async fn rtm_token(
    State(state): State<AppState>,
    path: Result<Path<UserPath>, PathRejection>,
    query: Result<Query<TokenQuery>, QueryRejection>,
) -> Result<Json<RtmTokenResponse>, ApiError> {
    let Path(path) = path?;
    let Query(query) = query?;
    let grant = params::rtm_grant(path)?;
    let expire_at = expire_at(&state, &query)?;

    let rtm_token = sign(&state, &grant, expire_at)?;
    debug!(expire_at, "issued rtm token");
    Ok(Json(RtmTokenResponse { rtm_token }))
}

/// `GET /rte/{channelName}/{role}/{tokentype}/{uid}/` — both tokens.
///
/// Either both tokens are returned or an error; never one of them alone.
pub async fn rte_tokens(
    State(state): State<AppState>,
    path: Result<Path<ChannelPath>, PathRejection>,
    query: Result<Query<TokenQuery>, QueryRejection>,
) -> Result<Json<RteTokenResponse>, ApiError> {
    let Path(path) = path?;
    let Query(query) = query?;
    let req = TokenRequest::try_from(path)?;
    let expire_at = expire_at(&state, &query)?;

    let rtc_token = sign(&state, &req.rtc_grant(), expire_at)?;
    let rtm_token = sign(&state, &req.rtm_grant(), expire_at)?;
    debug!(channel = %req.channel_name, expire_at, "issued rtc and rtm tokens");
    Ok(Json(RteTokenResponse {
        rtc_token,
        rtm_token,
    }))
}

/// `GET /ping` — liveness check.
pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse::default())
}

/// Catch-all 404 handler.
pub async fn not_found() -> ApiError {
    ApiError(ServiceError::NotFound)
}

fn expire_at(state: &AppState, query: &TokenQuery) -> Result<u32, ApiError> {
    let secs = query.expiry_secs(state.token_expiry_secs)?;
    Ok(access_token::unix_now().saturating_add(secs))
}

fn sign(state: &AppState, grant: &Grant, expire_at: u32) -> Result<String, ApiError> {
    state
        .signer
        .sign(&state.identity, grant, expire_at)
        .map_err(|e| {
            let kind = match grant {
                Grant::Rtc { .. } => "rtc",
                Grant::Rtm { .. } => "rtm",
            };
            error!(kind, error = %e, "token signing failed");
            ApiError(ServiceError::SigningFailure(e.to_string()))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use access_token::{AccessToken, TokenError};
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::Value;

    use crate::config::ServiceIdentity;
    use crate::server::router;
    use crate::signer::{MockTokenSigner, SignError};

    fn server() -> TestServer {
        TestServer::new(router::build(AppState::default())).unwrap()
    }

    fn failing_server() -> TestServer {
        let mut signer = MockTokenSigner::new();
        signer
            .expect_sign()
            .returning(|_, _, _| Err(SignError(TokenError::MissingAppCertificate)));
        let state = AppState::new(
            ServiceIdentity::new("app", "top-secret-certificate"),
            Arc::new(signer),
            3600,
        );
        TestServer::new(router::build(state)).unwrap()
    }

    fn verify(token: &str, channel: &str, uid: &str) {
        let state = AppState::default();
        AccessToken::parse(token, state.identity.app_id())
            .unwrap()
            .verify(state.identity.app_certificate(), channel, uid)
            .unwrap();
    }

    #[tokio::test]
    async fn rtc_uid_token() {
        let resp = server().get("/rtc/room/publisher/uid/12345/").await;
        resp.assert_status_ok();
        let body: Value = resp.json();
        let token = body["rtcToken"].as_str().unwrap();
        assert!(!token.is_empty());
        assert!(body.get("rtmToken").is_none());
        verify(token, "room", "12345");
    }

    #[tokio::test]
    async fn rtc_account_token() {
        let resp = server().get("/rtc/room/subscriber/account/alice/").await;
        resp.assert_status_ok();
        let body: Value = resp.json();
        verify(body["rtcToken"].as_str().unwrap(), "room", "alice");
    }

    #[tokio::test]
    async fn rtc_non_numeric_uid_is_400() {
        let resp = server().get("/rtc/room/publisher/uid/abc/").await;
        resp.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = resp.json();
        assert_eq!(body["field"], "uid");
        assert!(body.get("rtcToken").is_none());
    }

    #[tokio::test]
    async fn unknown_role_and_tokentype_are_400() {
        let server = server();
        for (url, field) in [
            ("/rtc/room/owner/uid/1/", "role"),
            ("/rtc/room/publisher/email/1/", "tokentype"),
            ("/rte/room/owner/uid/1/", "role"),
            ("/rte/room/publisher/email/1/", "tokentype"),
        ] {
            let resp = server.get(url).await;
            resp.assert_status(StatusCode::BAD_REQUEST);
            let body: Value = resp.json();
            assert_eq!(body["code"], "bad_request", "{url}");
            assert_eq!(body["field"], field, "{url}");
            assert!(body.get("rtcToken").is_none());
            assert!(body.get("rtmToken").is_none());
        }
    }

    #[tokio::test]
    async fn rtm_token_only() {
        let resp = server().get("/rtm/alice/").await;
        resp.assert_status_ok();
        let body: Value = resp.json();
        let token = body["rtmToken"].as_str().unwrap();
        assert!(!token.is_empty());
        assert!(body.get("rtcToken").is_none());
        verify(token, "alice", "");
    }

    #[tokio::test]
    async fn rte_returns_both_tokens() {
        let resp = server().get("/rte/room/publisher/uid/7/").await;
        resp.assert_status_ok();
        let body: Value = resp.json();
        verify(body["rtcToken"].as_str().unwrap(), "room", "7");
        verify(body["rtmToken"].as_str().unwrap(), "7", "");
    }

    #[tokio::test]
    async fn repeated_requests_both_verify() {
        let server = server();
        let a: Value = server.get("/rtc/room/publisher/uid/1/").await.json();
        let b: Value = server.get("/rtc/room/publisher/uid/1/").await.json();
        verify(a["rtcToken"].as_str().unwrap(), "room", "1");
        verify(b["rtcToken"].as_str().unwrap(), "room", "1");
    }

    #[tokio::test]
    async fn expiry_query_is_applied() {
        let before = access_token::unix_now();
        let resp = server().get("/rtm/alice/").add_query_param("expiry", 60).await;
        resp.assert_status_ok();
        let body: Value = resp.json();
        let parsed =
            AccessToken::parse(body["rtmToken"].as_str().unwrap(), AppState::default().identity.app_id())
                .unwrap();
        let exp = parsed
            .message()
            .privilege_expiry(access_token::Privilege::RtmLogin)
            .unwrap();
        assert!(exp >= before + 60 && exp <= before + 62);
    }

    #[tokio::test]
    async fn invalid_expiry_is_400() {
        let resp = server()
            .get("/rtc/room/publisher/uid/1/")
            .add_query_param("expiry", "never")
            .await;
        resp.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = resp.json();
        assert_eq!(body["field"], "expiry");
    }

    #[tokio::test]
    async fn signer_failure_is_generic_500() {
        let server = failing_server();
        for url in ["/rtc/room/publisher/uid/1/", "/rtm/alice/", "/rte/room/publisher/uid/1/"] {
            let resp = server.get(url).await;
            resp.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
            let text = resp.text();
            assert!(!text.contains("top-secret-certificate"));
            assert!(!text.contains("rtcToken"));
            assert!(!text.contains("rtmToken"));
            let body: Value = resp.json();
            assert_eq!(body["code"], "internal_error");
        }
    }

    #[tokio::test]
    async fn rte_is_all_or_nothing() {
        // RTC signs, RTM fails: no partial response.
        let mut signer = MockTokenSigner::new();
        signer
            .expect_sign()
            .returning(|_, grant, _| match grant {
                Grant::Rtc { .. } => Ok("rtc".into()),
                Grant::Rtm { .. } => Err(SignError(TokenError::MissingAppId)),
            });
        let state = AppState::new(ServiceIdentity::new("app", "cert"), Arc::new(signer), 3600);
        let server = TestServer::new(router::build(state)).unwrap();

        let resp = server.get("/rte/room/publisher/uid/1/").await;
        resp.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = resp.json();
        assert!(body.get("rtcToken").is_none());
        assert!(body.get("rtmToken").is_none());
    }

    #[tokio::test]
    async fn signer_receives_validated_grant() {
        let mut signer = MockTokenSigner::new();
        signer
            .expect_sign()
            .withf(|identity, grant, _| {
                identity.app_id() == "app"
                    && *grant
                        == Grant::Rtc {
                            channel_name: "room".into(),
                            user: access_token::RtcUser::Account("bob".into()),
                            role: access_token::RtcRole::Subscriber,
                        }
            })
            .times(1)
            .returning(|_, _, _| Ok("signed".into()));
        let state = AppState::new(ServiceIdentity::new("app", "cert"), Arc::new(signer), 3600);
        let server = TestServer::new(router::build(state)).unwrap();

        let resp = server.get("/rtc/room/subscriber/account/bob/").await;
        resp.assert_status_ok();
        let body: Value = resp.json();
        assert_eq!(body["rtcToken"], "signed");
    }

    #[tokio::test]
    async fn validation_errors_skip_signer() {
        let mut signer = MockTokenSigner::new();
        signer.expect_sign().never();
        let state = AppState::new(ServiceIdentity::new("app", "cert"), Arc::new(signer), 3600);
        let server = TestServer::new(router::build(state)).unwrap();

        server
            .get("/rte/room/publisher/uid/abc/")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn ping_returns_pong() {
        let resp = server().get("/ping").await;
        resp.assert_status_ok();
        let body: Value = resp.json();
        assert_eq!(body["message"], "pong");
    }
}
