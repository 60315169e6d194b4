use actix_web::test::TestRequest;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::spawn_app;

#[actix_web::test]
async fn saved_session_can_be_loaded_then_deleted() {
    let app = spawn_app().await;
    let (status, body) = app
        .send(TestRequest::post().uri("/api/v1/recovery/sessions").set_json(json!({
            "email": "Trader@Example.com",
            "planId": "vip",
            "paymentDetails": {"step": 3},
            "errorCategory": "card_declined"
        })))
        .await;
    assert_eq!(status, 201, "{}", body);
    let session_id = body["data"]["sessionId"].as_str().unwrap().to_string();
    assert_eq!(
        body["data"]["recoveryPath"],
        format!("/subscription?recover={}", session_id)
    );

    let uri = format!("/api/v1/recovery/sessions/{}", session_id);
    let (status, body) = app.send(TestRequest::get().uri(&uri)).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["email"], "trader@example.com");
    assert_eq!(body["data"]["errorCategory"], "card_declined");

    let (status, _) = app.send(TestRequest::delete().uri(&uri)).await;
    assert_eq!(status, 200);
    let (status, _) = app.send(TestRequest::get().uri(&uri)).await;
    assert_eq!(status, 404);
}

#[actix_web::test]
async fn malformed_session_id_is_not_found() {
    let app = spawn_app().await;
    let (status, _) = app
        .send(TestRequest::get().uri("/api/v1/recovery/sessions/not-a-uuid"))
        .await;
    assert_eq!(status, 404);
}

#[actix_web::test]
async fn manual_repair_stops_calling_the_backend_at_the_cap() {
    let app = spawn_app().await;
    Mock::given(method("POST"))
        .and(path("/functions/v1/reprocess-webhook-by-email"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"processed": false}
        })))
        .expect(3)
        .mount(&app.backend_server)
        .await;

    let token = app.bearer_token("user-stuck", "stuck@example.com");
    let repair = || {
        TestRequest::post()
            .uri("/api/v1/recovery/repair")
            .insert_header(("Authorization", token.clone()))
    };

    let (status, body) = app.send(repair()).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["repaired"], false);
    assert_eq!(body["data"]["attempts"], 1);

    app.send(repair()).await;
    let (_, body) = app.send(repair()).await;
    assert_eq!(body["data"]["maxRetriesReached"], true);

    let (_, body) = app.send(repair()).await;
    assert_eq!(body["data"]["attempts"], 3);
    assert_eq!(body["data"]["maxRetriesReached"], true);
}

#[actix_web::test]
async fn successful_repair_reports_the_update() {
    let app = spawn_app().await;
    app.mock_function(
        "reprocess-webhook-by-email",
        json!({"success": true, "data": {"processed": true}}),
    )
    .await;

    let token = app.bearer_token("user-late", "late@example.com");
    let (_, body) = app
        .send(
            TestRequest::post()
                .uri("/api/v1/recovery/repair")
                .insert_header(("Authorization", token)),
        )
        .await;
    assert_eq!(body["data"]["repaired"], true);
    assert_eq!(body["data"]["attempts"], 0);
}

#[actix_web::test]
async fn repair_requires_a_signed_in_account() {
    let app = spawn_app().await;
    Mock::given(method("POST"))
        .and(path("/functions/v1/reprocess-webhook-by-email"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"processed": false}
        })))
        .expect(0)
        .mount(&app.backend_server)
        .await;

    for _ in 0..4 {
        let (status, _) = app
            .send(
                TestRequest::post()
                    .uri("/api/v1/recovery/repair")
                    .set_json(json!({"email": "victim@example.com"})),
            )
            .await;
        assert_eq!(status, 401);
    }

    // The victim's own attempts are untouched.
    Mock::given(method("GET"))
        .and(path("/rest/v1/subscriptions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&app.backend_server)
        .await;
    let token = app.bearer_token("user-victim", "victim@example.com");
    let (status, body) = app
        .send(
            TestRequest::get()
                .uri("/api/v1/subscriptions/status")
                .insert_header(("Authorization", token)),
        )
        .await;
    assert_eq!(status, 200, "{}", body);
    assert_eq!(body["data"]["repairAttempts"], 0);
}

#[actix_web::test]
async fn error_codes_resolve_to_categories() {
    let app = spawn_app().await;
    let (status, body) = app
        .send(TestRequest::get().uri("/api/v1/recovery/error-message?code=036"))
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["category"], "expired_card");
    assert_eq!(body["data"]["transient"], false);

    let (_, body) = app
        .send(TestRequest::get().uri("/api/v1/recovery/error-message?code=ETIMEDOUT"))
        .await;
    assert_eq!(body["data"]["category"], "timeout");
    assert_eq!(body["data"]["transient"], true);
}
