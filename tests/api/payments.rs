use actix_web::test::TestRequest;
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::{spawn_app, TestApp, GATEWAY_ORIGIN};

fn init_body(registration_id: &str, email: &str) -> Value {
    json!({
        "planId": "monthly",
        "registrationId": registration_id,
        "payer": {"fullName": "Dana Levi", "email": email}
    })
}

async fn mock_created_session(app: &TestApp) {
    app.mock_function(
        "cardcom-payment/create-payment",
        json!({
            "success": true,
            "data": {
                "sessionId": "session-1",
                "lowProfileCode": "lpc-1",
                "terminalNumber": "1000",
                "url": "https://secure.cardcom.solutions/openfields"
            }
        }),
    )
    .await;
}

async fn wait_for_progress(
    app: &TestApp,
    session_id: &str,
    settled: impl Fn(&Value) -> bool,
) -> Value {
    for _ in 0..100 {
        let (_, body) = app
            .send(TestRequest::get().uri(&format!("/api/v1/payments/{}/status", session_id)))
            .await;
        if settled(&body["data"]) {
            return body;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("payment {} never settled", session_id);
}

#[actix_web::test]
async fn guest_payment_registers_and_activates_the_subscription() {
    let app = spawn_app().await;
    let (registration_id, email) = app.signed_registration().await;
    mock_created_session(&app).await;
    app.mock_function(
        "register-user",
        json!({"success": true, "data": {"userId": "user-42"}}),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/subscriptions"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
            "user_id": "user-42",
            "plan_type": "monthly",
            "status": "trial",
            "contract_signed": true
        }])))
        .expect(1)
        .mount(&app.backend_server)
        .await;

    let (status, body) = app
        .send(
            TestRequest::post()
                .uri("/api/v1/payments/init")
                .set_json(init_body(&registration_id, &email)),
        )
        .await;
    assert_eq!(status, 201, "{}", body);
    assert_eq!(body["data"]["outbound"]["targetOrigin"], GATEWAY_ORIGIN);
    assert_eq!(body["data"]["outbound"]["message"]["action"], "init");

    let (status, body) = app
        .send(
            TestRequest::post()
                .uri("/api/v1/payments/session-1/messages")
                .set_json(json!({
                    "origin": GATEWAY_ORIGIN,
                    "data": {"action": "HandleSubmit", "data": {"IsSuccess": true, "Last4Digits": "4242"}}
                })),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["accepted"], true);

    let body = wait_for_progress(&app, "session-1", |p| p["redirectTo"].is_string()).await;
    assert_eq!(body["data"]["state"], "SUCCESS");
    assert_eq!(body["data"]["redirectTo"], "/subscription?success=true");

    let (_, body) = app
        .send(TestRequest::get().uri(&format!(
            "/api/v1/subscribe/registration/{}",
            registration_id
        )))
        .await;
    assert_eq!(body["data"]["notice"], "registration_missing");
}

#[actix_web::test]
async fn messages_from_other_origins_are_dropped() {
    let app = spawn_app().await;
    let (registration_id, email) = app.signed_registration().await;
    mock_created_session(&app).await;

    app.send(
        TestRequest::post()
            .uri("/api/v1/payments/init")
            .set_json(init_body(&registration_id, &email)),
    )
    .await;

    let (status, body) = app
        .send(
            TestRequest::post()
                .uri("/api/v1/payments/session-1/messages")
                .set_json(json!({
                    "origin": "https://evil.example",
                    "data": {"action": "HandleSubmit", "data": {"IsSuccess": true}}
                })),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["accepted"], false);

    let (_, body) = app
        .send(TestRequest::get().uri("/api/v1/payments/session-1/status"))
        .await;
    assert_eq!(body["data"]["state"], "INITIALIZING");
}

#[actix_web::test]
async fn anonymous_payment_without_registration_is_unauthorized() {
    let app = spawn_app().await;
    let (status, _) = app
        .send(TestRequest::post().uri("/api/v1/payments/init").set_json(json!({
            "planId": "annual",
            "payer": {"fullName": "Dana Levi", "email": "dana@example.com"}
        })))
        .await;
    assert_eq!(status, 401);
}

#[actix_web::test]
async fn declined_session_returns_a_recovery_path() {
    let app = spawn_app().await;
    app.mock_function(
        "cardcom-payment/create-payment",
        json!({"success": false, "error": "declined", "errorCode": "card_declined"}),
    )
    .await;
    let token = app.bearer_token("user-7", "trader@example.com");

    let (status, body) = app
        .send(
            TestRequest::post()
                .uri("/api/v1/payments/init")
                .insert_header(("Authorization", token))
                .set_json(json!({
                    "planId": "annual",
                    "payer": {"fullName": "Dana Levi", "email": "trader@example.com"}
                })),
        )
        .await;

    assert_eq!(status, 402);
    assert_eq!(body["success"], false);
    assert_eq!(body["errorCategory"], "card_declined");
    let recovery_path = body["recoveryPath"].as_str().expect("recovery path");
    assert!(recovery_path.starts_with("/subscription?recover="));

    let session_id = recovery_path.trim_start_matches("/subscription?recover=");
    let (status, body) = app
        .send(TestRequest::get().uri(&format!("/api/v1/recovery/sessions/{}", session_id)))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["planId"], "annual");
}

#[actix_web::test]
async fn declined_card_from_the_frame_can_be_retried() {
    let app = spawn_app().await;
    let (registration_id, email) = app.signed_registration().await;
    mock_created_session(&app).await;
    app.send(
        TestRequest::post()
            .uri("/api/v1/payments/init")
            .set_json(init_body(&registration_id, &email)),
    )
    .await;

    let (status, _) = app
        .send(
            TestRequest::post()
                .uri("/api/v1/payments/session-1/submit")
                .set_json(json!({
                    "cardOwnerName": "Dana Levi",
                    "cardExpMonth": "04",
                    "cardExpYear": "2029"
                })),
        )
        .await;
    assert_eq!(status, 200);

    app.send(
        TestRequest::post()
            .uri("/api/v1/payments/session-1/messages")
            .set_json(json!({
                "origin": GATEWAY_ORIGIN,
                "data": {"action": "HandleError", "code": "036", "message": "expired"}
            })),
    )
    .await;

    let body = wait_for_progress(&app, "session-1", |p| p["state"] == "FAILED").await;
    assert_eq!(body["data"]["errorCategory"], "expired_card");

    let (status, body) = app
        .send(TestRequest::post().uri("/api/v1/payments/session-1/retry"))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["state"], "IDLE");

    let (status, _) = app
        .send(TestRequest::get().uri("/api/v1/payments/session-1/status"))
        .await;
    assert_eq!(status, 404);
}

#[actix_web::test]
async fn cancelling_a_fresh_payment_is_refused() {
    let app = spawn_app().await;
    let (registration_id, email) = app.signed_registration().await;
    mock_created_session(&app).await;
    app.send(
        TestRequest::post()
            .uri("/api/v1/payments/init")
            .set_json(init_body(&registration_id, &email)),
    )
    .await;

    let (status, _) = app
        .send(TestRequest::post().uri("/api/v1/payments/session-1/cancel"))
        .await;
    assert_eq!(status, 409);
}

#[actix_web::test]
async fn unknown_session_is_not_found() {
    let app = spawn_app().await;
    let (status, _) = app
        .send(TestRequest::get().uri("/api/v1/payments/missing/validations"))
        .await;
    assert_eq!(status, 404);
}
