use actix_web::test::{self, TestRequest};
use actix_web::App;
use fake::faker::internet::en::SafeEmail;
use fake::Fake;
use once_cell::sync::Lazy;
use secrecy::Secret;
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use journal_billing::billing_web_server::BillingServices;
use journal_billing::core::config::{
    AppConfig, BackendConfig, BillingServerConfig, GatewayConfig, JwtAuthConfig,
    PaymentTimingConfig, RecoveryConfig, RedisConfig, RegistrationConfig,
};
use journal_billing::core::jwt_auth::{generate_jwt_token, JwtClaims};
use journal_billing::core::{get_subscriber, init_subscriber, MemoryStore, SystemClock};
use journal_billing::services::HttpBackendClient;

pub const GATEWAY_ORIGIN: &str = "https://secure.cardcom.solutions";

static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        let _ = init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        let _ = init_subscriber(subscriber);
    };
});

pub struct TestApp {
    pub backend_server: MockServer,
    pub config: AppConfig,
    pub services: BillingServices,
}

fn test_config(backend_uri: String) -> AppConfig {
    AppConfig {
        server: BillingServerConfig {
            port: 0,
            host: "127.0.0.1".into(),
        },
        redis: RedisConfig {
            host: "127.0.0.1".into(),
            port: "6379".into(),
            password: None,
        },
        backend: BackendConfig {
            base_url: backend_uri,
            anon_key: Secret::new("test-anon-key".to_string()),
            timeout_ms: 2_000,
        },
        gateway: GatewayConfig {
            origin: GATEWAY_ORIGIN.into(),
            terminal_number: "1000".into(),
            language: "he".into(),
        },
        jwt_auth_config: JwtAuthConfig {
            secret: Secret::new("integration-test-secret".to_string()),
            token_expiration_time: 3600,
        },
        payments: PaymentTimingConfig::default(),
        registration: RegistrationConfig::default(),
        recovery: RecoveryConfig::default(),
    }
}

pub async fn spawn_app() -> TestApp {
    Lazy::force(&TRACING);

    let backend_server = MockServer::start().await;
    let config = test_config(backend_server.uri());
    let backend = HttpBackendClient::new(&config.backend).expect("failed to build backend client");
    let services = BillingServices::new(
        &config,
        Arc::new(MemoryStore::new()),
        Arc::new(backend),
        Arc::new(SystemClock),
    );

    TestApp {
        backend_server,
        config,
        services,
    }
}

impl TestApp {
    /// Returns the status code and the parsed JSON body.
    pub async fn send(&self, request: TestRequest) -> (u16, Value) {
        let app =
            test::init_service(App::new().configure(|conf| self.services.configure(conf))).await;
        let response = test::call_service(&app, request.to_request()).await;
        let status = response.status().as_u16();
        let body = test::read_body(response).await;
        let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    pub fn bearer_token(&self, user_id: &str, email: &str) -> String {
        let claims = JwtClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            role: None,
            exp: (chrono::Utc::now().timestamp() + 600) as usize,
        };
        let token = generate_jwt_token(&claims, &self.config.jwt_auth_config)
            .expect("failed to sign test token");
        format!("Bearer {}", token)
    }

    /// Creates a draft for the monthly plan and signs its contract.
    pub async fn signed_registration(&self) -> (String, String) {
        let email: String = SafeEmail().fake();
        let (status, body) = self
            .send(TestRequest::post().uri("/api/v1/subscribe/registration").set_json(json!({
                "email": email,
                "password": "correct-horse",
                "userData": {"firstName": "Dana", "lastName": "Levi", "phone": "0501234567"},
                "planId": "monthly"
            })))
            .await;
        assert_eq!(status, 201, "{}", body);
        let registration_id = body["data"]["registrationId"]
            .as_str()
            .expect("registration id")
            .to_string();

        let (status, body) = self
            .send(
                TestRequest::post()
                    .uri(&format!(
                        "/api/v1/subscribe/registration/{}/contract",
                        registration_id
                    ))
                    .set_json(json!({
                        "fullName": "Dana Levi",
                        "signature": "data:image/png;base64,iVBORw0KGgo=",
                        "agreedToTerms": true
                    })),
            )
            .await;
        assert_eq!(status, 200, "{}", body);
        (registration_id, email.to_lowercase())
    }

    pub async fn mock_function(&self, function: &str, body: Value) {
        Mock::given(method("POST"))
            .and(path(format!("/functions/v1/{}", function)))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.backend_server)
            .await;
    }
}
