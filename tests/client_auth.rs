//! Login, retry and re-authentication against a scripted transport.

mod common;

use antinex_client::client::NO_TOKEN;
use antinex_client::{LoginStatus, Status};
use common::*;
use serde_json::json;
use std::time::Duration;

#[test]
fn test_new_client_is_not_logged_in() {
    let (client, transport, _) = client();
    assert_eq!(client.get_token(), NO_TOKEN);
    assert_eq!(client.login_status(), LoginStatus::NotAttempted);
    assert!(!client.is_logged_in());
    assert!(client.cache().is_empty());
    assert_eq!(transport.calls(), 0);
}

#[test]
fn test_login_stores_token_and_posts_credentials() {
    let (mut client, transport, _) = client();
    transport.push_login();

    assert_eq!(client.login().unwrap(), LoginStatus::Success);
    assert_eq!(client.get_token(), TOKEN);

    let requests = transport.requests();
    assert_eq!(transport.trace(), vec!["POST /api-token-auth/"]);
    let body: serde_json::Value =
        serde_json::from_str(requests[0].body.as_deref().unwrap()).unwrap();
    assert_eq!(body, json!({"username": "trex", "password": "123321"}));
    assert_eq!(requests[0].header("content-type"), Some("application/json"));
    assert!(requests[0].header("authorization").is_none());
}

#[test]
fn test_login_without_token_fails() {
    let (mut client, transport, _) = client();
    transport.push_json(200, json!({"detail": "ok"}));
    assert_eq!(client.login().unwrap(), LoginStatus::Failed);
    assert_eq!(client.get_token(), NO_TOKEN);

    transport.push_json(400, json!({"non_field_errors": ["bad creds"]}));
    assert_eq!(client.login().unwrap(), LoginStatus::Failed);
}

#[test]
fn test_retry_login_requires_credentials() {
    let (mut client, transport, _) = client_with(config().with_credentials("", ""));
    let res = client.retry_login().unwrap();
    assert_eq!(res.status, Status::Error);
    assert_eq!(res.error, "please set the user and password");
    assert_eq!(transport.calls(), 0);
}

#[test]
fn test_retry_login_succeeds_on_first_attempt() {
    let (mut client, transport, sleeper) = client();
    transport.push_login();

    let res = client.retry_login().unwrap();
    assert_eq!(res.status, Status::Success);
    assert!(res.data.is_none());
    assert_eq!(transport.calls(), 1);
    assert_eq!(sleeper.count(), 0);
}

#[test]
fn test_retry_login_skips_when_already_logged_in() {
    let (mut client, transport, _) = logged_in();
    assert!(client.retry_login().unwrap().is_success());
    assert_eq!(transport.calls(), 1);
}

#[test]
fn test_retry_login_recovers_after_failures() {
    let (mut client, transport, sleeper) = client();
    transport
        .push_json(500, json!({}))
        .push_json(400, json!({}))
        .push_login();

    assert!(client.retry_login().unwrap().is_success());
    assert_eq!(transport.calls(), 3);
    assert_eq!(sleeper.naps(), vec![Duration::from_millis(100); 2]);
}

#[test]
fn test_retry_login_gives_up_after_max_retries() {
    let (mut client, transport, sleeper) = client_with(
        config()
            .with_max_retries(3)
            .with_login_retry_wait(Duration::from_millis(7)),
    );
    for _ in 0..10 {
        transport.push_json(401, json!({"detail": "no"}));
    }

    let res = client.retry_login().unwrap();
    assert_eq!(res.status, Status::Error);
    assert_eq!(res.error, "failed logging in user=trex retries=3");
    assert_eq!(transport.calls(), 4);
    assert_eq!(sleeper.naps(), vec![Duration::from_millis(7); 4]);
    assert_eq!(client.login_status(), LoginStatus::Failed);
}

#[test]
fn test_authorized_requests_carry_jwt() {
    let (mut client, transport, _) = logged_in();
    transport.push_json(200, json!({"id": 5, "status": "running"}));
    client.get_job_by_id(5).unwrap();

    let requests = transport.requests();
    let get = &requests[1];
    assert_eq!(get.header("Authorization"), Some("JWT test-token"));
    assert_eq!(get.header("Content-type"), Some("application/json"));
}

#[test]
fn test_unauthorized_reply_relogs_without_resending() {
    let (mut client, transport, _) = logged_in();
    transport
        .push_json(401, json!({"detail": "Signature has expired."}))
        .push_json(200, json!({"token": "fresh-token"}));

    let res = client.get_job_by_id(42).unwrap();
    assert_eq!(res.status, Status::Success);
    assert!(res.data.is_none());
    assert_eq!(client.get_token(), "fresh-token");
    assert_eq!(
        transport.trace(),
        vec!["POST /api-token-auth/", "GET /ml/42", "POST /api-token-auth/"]
    );
    assert!(client.all_jobs().is_empty());
}

#[test]
fn test_unauthorized_reply_with_failed_relogin() {
    let (mut client, transport, _) = client_with(config().with_max_retries(0));
    transport
        .push_json(401, json!({"detail": "expired"}))
        .push_json(400, json!({"detail": "bad creds"}));

    let res = client.get_prepare_by_id(3).unwrap();
    assert_eq!(res.status, Status::LoginFailed);
    assert_eq!(res.error, "failed logging in user=trex retries=0");
    assert_eq!(transport.calls(), 2);
}

#[test]
fn test_transport_failure_is_an_error() {
    let (mut client, transport, _) = client();
    assert_eq!(transport.remaining(), 0);
    let err = client.login().unwrap_err();
    assert!(err.to_string().contains("no reply scripted"));
}
