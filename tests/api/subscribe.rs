use actix_web::test::TestRequest;
use claim::assert_none;
use serde_json::json;

use crate::helpers::spawn_app;

#[actix_web::test]
async fn health_check_works() {
    let app = spawn_app().await;
    let (status, _) = app
        .send(TestRequest::get().uri("/api/v1/health_check"))
        .await;
    assert_eq!(status, 200);
}

#[actix_web::test]
async fn plans_list_the_monthly_trial() {
    let app = spawn_app().await;
    let (status, body) = app
        .send(TestRequest::get().uri("/api/v1/subscribe/plans"))
        .await;

    assert_eq!(status, 200);
    let plans = body["data"].as_array().expect("plans");
    assert_eq!(plans.len(), 3);
    let monthly = plans
        .iter()
        .find(|p| p["id"] == "monthly")
        .expect("monthly plan");
    assert_eq!(monthly["trialDays"], 30);
}

#[actix_web::test]
async fn started_registration_never_echoes_the_password() {
    let app = spawn_app().await;
    let (status, body) = app
        .send(TestRequest::post().uri("/api/v1/subscribe/registration").set_json(json!({
            "email": "  Trader@Example.com ",
            "password": "correct-horse",
            "userData": {"firstName": "Dana", "lastName": "Levi", "phone": "0501234567"}
        })))
        .await;

    assert_eq!(status, 201);
    assert_eq!(body["data"]["draft"]["email"], "trader@example.com");
    assert!(!body.to_string().contains("correct-horse"));
}

#[actix_web::test]
async fn invalid_registration_payload_is_rejected() {
    let app = spawn_app().await;
    let (status, _) = app
        .send(TestRequest::post().uri("/api/v1/subscribe/registration").set_json(json!({
            "email": "not-an-email",
            "password": "correct-horse",
            "userData": {"firstName": "Dana", "lastName": "Levi", "phone": "0501234567"}
        })))
        .await;
    assert_eq!(status, 400);
}

#[actix_web::test]
async fn contract_requires_accepted_terms() {
    let app = spawn_app().await;
    let (_, body) = app
        .send(TestRequest::post().uri("/api/v1/subscribe/registration").set_json(json!({
            "email": "terms@example.com",
            "password": "correct-horse",
            "userData": {"firstName": "Dana", "lastName": "Levi", "phone": "0501234567"},
            "planId": "annual"
        })))
        .await;
    let registration_id = body["data"]["registrationId"].as_str().unwrap().to_string();

    let (status, _) = app
        .send(
            TestRequest::post()
                .uri(&format!("/api/v1/subscribe/registration/{}/contract", registration_id))
                .set_json(json!({
                    "fullName": "Dana Levi",
                    "signature": "data:image/png;base64,iVBORw0KGgo=",
                    "agreedToTerms": false
                })),
        )
        .await;
    assert_eq!(status, 400);
}

#[actix_web::test]
async fn payment_step_without_contract_falls_back_to_contract() {
    let app = spawn_app().await;
    let (_, body) = app
        .send(TestRequest::post().uri("/api/v1/subscribe/registration").set_json(json!({
            "email": "wizard@example.com",
            "password": "correct-horse",
            "userData": {"firstName": "Dana", "lastName": "Levi", "phone": "0501234567"},
            "planId": "monthly"
        })))
        .await;
    let registration_id = body["data"]["registrationId"].as_str().unwrap().to_string();

    let (status, body) = app
        .send(TestRequest::get().uri(&format!(
            "/api/v1/subscribe/wizard?step=3&regId={}",
            registration_id
        )))
        .await;

    assert_eq!(status, 200);
    assert_eq!(body["data"]["currentStep"], "contract");
    assert_eq!(body["data"]["requestedStep"], "payment");
    assert_eq!(body["data"]["selectedPlan"], "monthly");
}

#[actix_web::test]
async fn signed_contract_unlocks_the_payment_step() {
    let app = spawn_app().await;
    let (registration_id, _) = app.signed_registration().await;

    let (_, body) = app
        .send(TestRequest::get().uri(&format!(
            "/api/v1/subscribe/wizard?step=payment&regId={}",
            registration_id
        )))
        .await;
    assert_eq!(body["data"]["currentStep"], "payment");
    assert_eq!(body["data"]["stepNumber"], 3);
}

#[actix_web::test]
async fn unknown_registration_reports_a_notice() {
    let app = spawn_app().await;
    let (status, body) = app
        .send(TestRequest::get().uri("/api/v1/subscribe/registration/does-not-exist"))
        .await;

    assert_eq!(status, 200);
    assert_eq!(body["data"]["notice"], "registration_missing");
    assert!(body["data"]["draft"].is_null());
}

#[actix_web::test]
async fn contract_fields_cannot_be_patched_directly() {
    let app = spawn_app().await;
    let (_, body) = app
        .send(TestRequest::post().uri("/api/v1/subscribe/registration").set_json(json!({
            "email": "patch@example.com",
            "password": "correct-horse",
            "userData": {"firstName": "Dana", "lastName": "Levi", "phone": "0501234567"}
        })))
        .await;
    let registration_id = body["data"]["registrationId"].as_str().unwrap().to_string();

    let (status, body) = app
        .send(
            TestRequest::patch()
                .uri(&format!("/api/v1/subscribe/registration/{}", registration_id))
                .set_json(json!({
                    "planId": "vip",
                    "contractSigned": true,
                    "contractSignedAt": "2026-10-16T10:00:00Z"
                })),
        )
        .await;

    assert_eq!(status, 200);
    assert_eq!(body["data"]["draft"]["planId"], "vip");
    assert_eq!(body["data"]["draft"]["contractSigned"], false);
    assert_none!(body["data"]["draft"].get("contractSignedAt"));
}

#[actix_web::test]
async fn payment_token_and_account_cannot_be_patched_onto_a_draft() {
    let app = spawn_app().await;
    let (registration_id, _) = app.signed_registration().await;

    let (status, body) = app
        .send(
            TestRequest::patch()
                .uri(&format!("/api/v1/subscribe/registration/{}", registration_id))
                .set_json(json!({
                    "userId": "someone-else",
                    "paymentToken": {
                        "lastFourDigits": "4242",
                        "expiryMonth": "04",
                        "expiryYear": "2029",
                        "cardholderName": "Dana Levi",
                        "tokenCreatedAt": "2026-10-16T10:00:00Z"
                    }
                })),
        )
        .await;
    assert_eq!(status, 200);
    assert_none!(body["data"]["draft"].get("userId"));
    assert_none!(body["data"]["draft"].get("paymentToken"));

    let (_, body) = app
        .send(TestRequest::get().uri(&format!(
            "/api/v1/subscribe/wizard?step=completion&regId={}",
            registration_id
        )))
        .await;
    assert_eq!(body["data"]["currentStep"], "payment");
}

#[actix_web::test]
async fn success_flag_without_a_confirmed_payment_stays_on_payment() {
    let app = spawn_app().await;
    let (registration_id, _) = app.signed_registration().await;

    let (status, body) = app
        .send(TestRequest::get().uri(&format!(
            "/api/v1/subscribe/wizard?step=completion&success=true&regId={}",
            registration_id
        )))
        .await;

    assert_eq!(status, 200);
    assert_eq!(body["data"]["currentStep"], "payment");
    assert_eq!(body["data"]["requestedStep"], "completion");
}

#[actix_web::test]
async fn recovery_link_does_not_stand_in_for_a_signed_contract() {
    let app = spawn_app().await;
    let (_, body) = app
        .send(TestRequest::post().uri("/api/v1/recovery/sessions").set_json(json!({
            "planId": "monthly",
            "paymentDetails": {}
        })))
        .await;
    let session_id = body["data"]["sessionId"].as_str().unwrap().to_string();

    let (_, body) = app
        .send(TestRequest::post().uri("/api/v1/subscribe/registration").set_json(json!({
            "email": "unsigned@example.com",
            "password": "correct-horse",
            "userData": {"firstName": "Dana", "lastName": "Levi", "phone": "0501234567"},
            "planId": "monthly"
        })))
        .await;
    let registration_id = body["data"]["registrationId"].as_str().unwrap().to_string();

    let (status, body) = app
        .send(TestRequest::get().uri(&format!(
            "/api/v1/subscribe/wizard?step=payment&regId={}&recover={}",
            registration_id, session_id
        )))
        .await;

    assert_eq!(status, 200);
    assert_eq!(body["data"]["currentStep"], "contract");
    assert_eq!(body["data"]["recoveredSession"]["planId"], "monthly");
}
