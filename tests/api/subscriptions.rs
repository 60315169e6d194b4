use actix_web::test::TestRequest;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::spawn_app;

#[actix_web::test]
async fn status_requires_a_bearer_token() {
    let app = spawn_app().await;
    let (status, _) = app
        .send(TestRequest::get().uri("/api/v1/subscriptions/status"))
        .await;
    assert_eq!(status, 401);
}

#[actix_web::test]
async fn active_subscription_shows_details() {
    let app = spawn_app().await;
    let ends_at = chrono::Utc::now() + chrono::Duration::days(100);
    Mock::given(method("GET"))
        .and(path("/rest/v1/subscriptions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "user_id": "user-1",
            "plan_type": "annual",
            "status": "active",
            "current_period_ends_at": ends_at,
            "contract_signed": true
        }])))
        .mount(&app.backend_server)
        .await;

    let (status, body) = app
        .send(
            TestRequest::get()
                .uri("/api/v1/subscriptions/status")
                .insert_header(("Authorization", app.bearer_token("user-1", "a@example.com"))),
        )
        .await;

    assert_eq!(status, 200, "{}", body);
    assert_eq!(body["data"]["panel"], "details");
    assert_eq!(body["data"]["tabs"].as_array().map(Vec::len), Some(3));
    assert_eq!(body["data"]["maxRepairAttempts"], 3);
}

#[actix_web::test]
async fn missing_subscription_shows_the_empty_state() {
    let app = spawn_app().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/subscriptions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&app.backend_server)
        .await;

    let (_, body) = app
        .send(
            TestRequest::get()
                .uri("/api/v1/subscriptions/status")
                .insert_header(("Authorization", app.bearer_token("user-2", "b@example.com"))),
        )
        .await;
    assert_eq!(body["data"]["panel"], "noSubscription");
}

#[actix_web::test]
async fn failed_lookup_is_a_critical_error() {
    let app = spawn_app().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/subscriptions"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&app.backend_server)
        .await;

    let (_, body) = app
        .send(
            TestRequest::get()
                .uri("/api/v1/subscriptions/status")
                .insert_header(("Authorization", app.bearer_token("user-3", "c@example.com"))),
        )
        .await;
    assert_eq!(body["data"]["panel"], "criticalError");
}

#[actix_web::test]
async fn cancel_goes_through_the_backend_function() {
    let app = spawn_app().await;
    Mock::given(method("POST"))
        .and(path("/functions/v1/cancel-subscription"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"user_id": "user-4", "plan_type": "monthly", "status": "cancelled"}
        })))
        .expect(1)
        .mount(&app.backend_server)
        .await;

    let (status, body) = app
        .send(
            TestRequest::post()
                .uri("/api/v1/subscriptions/cancel")
                .insert_header(("Authorization", app.bearer_token("user-4", "d@example.com")))
                .set_json(json!({"reason": "too expensive"})),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["status"], "cancelled");
}

#[actix_web::test]
async fn documents_are_listed_for_the_user() {
    let app = spawn_app().await;
    app.mock_function(
        "generate-document/list",
        json!({"success": true, "data": [{
            "id": "doc-1",
            "documentType": "invoice",
            "url": "https://files.example/doc-1.pdf",
            "createdAt": "2026-10-01T09:00:00Z"
        }]}),
    )
    .await;

    let (status, body) = app
        .send(
            TestRequest::get()
                .uri("/api/v1/subscriptions/documents")
                .insert_header(("Authorization", app.bearer_token("user-5", "e@example.com"))),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"][0]["documentType"], "invoice");
}
