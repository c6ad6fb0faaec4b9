//! Integration tests for `TwilioSmsService::send_sms`.
//!
//! Uses `wiremock` to stand in for the Twilio REST API so no real messages are
//! sent.

use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use notification_services::TwilioSmsService;
use permit_scan::{NotificationError, SmsAccount, SmsService};

const MESSAGES_PATH: &str = "/2010-04-01/Accounts/AC123/Messages.json";

fn account() -> SmsAccount {
    SmsAccount {
        account_sid: "AC123".to_string(),
        auth_token: "token".to_string(),
        from_number: "+15550000".to_string(),
    }
}

#[tokio::test]
async fn send_sms_posts_form_with_basic_auth_and_returns_sid() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(MESSAGES_PATH))
        .and(header("authorization", "Basic QUMxMjM6dG9rZW4="))
        .and(body_string_contains("From=%2B15550000"))
        .and(body_string_contains("To=%2B15551111"))
        .and(body_string_contains("Body=permits+open"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "sid": "SM0123",
            "status": "queued"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let service = TwilioSmsService::with_base_url(&server.uri()).unwrap();
    let sid = service
        .send_sms(&account(), "+15551111", "permits open")
        .await
        .unwrap();

    assert_eq!(sid, "SM0123");
}

#[tokio::test]
async fn send_sms_surfaces_provider_rejection() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(MESSAGES_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": 21211,
            "message": "The 'To' number is not a valid phone number.",
            "status": 400
        })))
        .mount(&server)
        .await;

    let service = TwilioSmsService::with_base_url(&server.uri()).unwrap();
    let err = service
        .send_sms(&account(), "not-a-number", "permits open")
        .await
        .unwrap_err();

    match err {
        NotificationError::Provider { status, message } => {
            assert_eq!(status, 400);
            assert!(message.contains("not a valid phone number"));
            assert!(message.contains("21211"));
        }
        other => panic!("expected Provider, got {other:?}"),
    }
}

#[tokio::test]
async fn send_sms_keeps_raw_body_when_error_is_not_json() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(MESSAGES_PATH))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let service = TwilioSmsService::with_base_url(&server.uri()).unwrap();
    let err = service
        .send_sms(&account(), "+15551111", "permits open")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        NotificationError::Provider { status: 502, ref message } if message == "bad gateway"
    ));
}

#[tokio::test]
async fn send_sms_fails_on_unparseable_success_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(MESSAGES_PATH))
        .respond_with(ResponseTemplate::new(201).set_body_string("ok"))
        .mount(&server)
        .await;

    let service = TwilioSmsService::with_base_url(&server.uri()).unwrap();
    let err = service
        .send_sms(&account(), "+15551111", "permits open")
        .await
        .unwrap_err();

    assert!(matches!(err, NotificationError::Sms(_)));
}
