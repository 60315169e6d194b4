use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;

use crate::core::config::BackendConfig;
use crate::models::payments::{OperationKind, PayerInfo, PaymentSessionConfig, PaymentStatusReport};
use crate::models::recovery::ErrorCategory;
use crate::models::registration::{ContractDetails, PaymentToken, UserData};
use crate::models::subscriptions::{
    PlanType, Subscription, SubscriptionDocument, SubscriptionUpsert,
};

pub const CREATE_PAYMENT: &str = "cardcom-payment/create-payment";
pub const OPEN_FIELDS: &str = "cardcom-openfields";
pub const PAYMENT_STATUS: &str = "cardcom-status";
pub const REPROCESS_WEBHOOK: &str = "reprocess-webhook-by-email";
pub const REGISTER_USER: &str = "register-user";
pub const CANCEL_SUBSCRIPTION: &str = "cancel-subscription";
pub const GENERATE_DOCUMENT: &str = "generate-document/generate";
pub const LIST_DOCUMENTS: &str = "generate-document/list";

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("network error calling {0}")]
    Network(String),
    #[error("timed out calling {0}")]
    Timeout(String),
    #[error("could not decode response: {0}")]
    Decode(String),
    #[error("{function} failed: {message}")]
    Function {
        function: String,
        message: String,
        code: Option<String>,
    },
}

impl BackendError {
    pub fn code(&self) -> Option<&str> {
        match self {
            BackendError::Function { code, .. } => code.as_deref(),
            BackendError::Network(_) => Some("network_error"),
            BackendError::Timeout(_) => Some("timeout"),
            BackendError::Decode(_) => None,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            BackendError::Network(_) => ErrorCategory::NetworkError.message().to_string(),
            BackendError::Timeout(_) => ErrorCategory::Timeout.message().to_string(),
            BackendError::Decode(_) => ErrorCategory::Unknown.message().to_string(),
            BackendError::Function { message, .. } => message.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FunctionEnvelope<T> {
    success: bool,
    data: Option<T>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default, rename = "errorCode")]
    error_code: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub plan_id: PlanType,
    pub operation: OperationKind,
    pub payer: PayerInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserRequest {
    pub email: String,
    pub password: String,
    pub user_data: UserData,
    pub plan_id: PlanType,
    pub contract_details: Option<ContractDetails>,
    pub payment_token: PaymentToken,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredUser {
    pub user_id: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReprocessResult {
    pub processed: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Backend-as-a-service functions this service orchestrates. None of them
/// are implemented here.
#[async_trait]
pub trait BackendFunctions: Send + Sync {
    async fn create_payment(
        &self,
        request: &CreatePaymentRequest,
    ) -> Result<PaymentSessionConfig, BackendError>;

    async fn payment_status(&self, low_profile_code: &str)
        -> Result<PaymentStatusReport, BackendError>;

    async fn register_user(
        &self,
        request: &RegisterUserRequest,
    ) -> Result<RegisteredUser, BackendError>;

    async fn reprocess_webhook_by_email(&self, email: &str)
        -> Result<ReprocessResult, BackendError>;

    async fn get_subscription(&self, user_id: &str) -> Result<Option<Subscription>, BackendError>;

    async fn upsert_subscription(
        &self,
        upsert: &SubscriptionUpsert,
    ) -> Result<Subscription, BackendError>;

    async fn cancel_subscription(
        &self,
        user_id: &str,
        reason: Option<&str>,
    ) -> Result<Subscription, BackendError>;

    async fn generate_document(
        &self,
        user_id: &str,
        document_type: &str,
    ) -> Result<SubscriptionDocument, BackendError>;

    async fn list_documents(&self, user_id: &str) -> Result<Vec<SubscriptionDocument>, BackendError>;
}

pub struct HttpBackendClient {
    http_client: Client,
    base_url: String,
    anon_key: Secret<String>,
}

impl HttpBackendClient {
    pub fn new(config: &BackendConfig) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
        })
    }

    fn transport_error(function: &str, error: reqwest::Error) -> BackendError {
        if error.is_timeout() {
            BackendError::Timeout(function.to_string())
        } else {
            BackendError::Network(function.to_string())
        }
    }

    async fn invoke<B, T>(&self, function: &str, body: &B) -> Result<T, BackendError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/functions/v1/{}", self.base_url, function);
        tracing::debug!(function, "invoking backend function");

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(self.anon_key.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|e| Self::transport_error(function, e))?;

        let envelope: FunctionEnvelope<T> = response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;

        match envelope {
            FunctionEnvelope {
                success: true,
                data: Some(data),
                ..
            } => Ok(data),
            FunctionEnvelope {
                error, error_code, ..
            } => Err(BackendError::Function {
                function: function.to_string(),
                message: error.unwrap_or_else(|| "Backend function failed".to_string()),
                code: error_code,
            }),
        }
    }
}

#[async_trait]
impl BackendFunctions for HttpBackendClient {
    #[tracing::instrument(name = "Create Payment Session", skip(self, request))]
    async fn create_payment(
        &self,
        request: &CreatePaymentRequest,
    ) -> Result<PaymentSessionConfig, BackendError> {
        let function = match request.operation {
            OperationKind::Charge => CREATE_PAYMENT,
            OperationKind::Tokenization => OPEN_FIELDS,
        };
        self.invoke(function, request).await
    }

    async fn payment_status(
        &self,
        low_profile_code: &str,
    ) -> Result<PaymentStatusReport, BackendError> {
        self.invoke(PAYMENT_STATUS, &json!({ "lowProfileCode": low_profile_code }))
            .await
    }

    #[tracing::instrument(name = "Register User", skip(self, request))]
    async fn register_user(
        &self,
        request: &RegisterUserRequest,
    ) -> Result<RegisteredUser, BackendError> {
        self.invoke(REGISTER_USER, request).await
    }

    async fn reprocess_webhook_by_email(
        &self,
        email: &str,
    ) -> Result<ReprocessResult, BackendError> {
        self.invoke(REPROCESS_WEBHOOK, &json!({ "email": email })).await
    }

    async fn get_subscription(&self, user_id: &str) -> Result<Option<Subscription>, BackendError> {
        let url = format!("{}/rest/v1/subscriptions", self.base_url);
        let response = self
            .http_client
            .get(&url)
            .query(&[("user_id", format!("eq.{}", user_id)), ("select", "*".into())])
            .bearer_auth(self.anon_key.expose_secret())
            .header("apikey", self.anon_key.expose_secret())
            .send()
            .await
            .map_err(|e| Self::transport_error("subscriptions", e))?;

        if !response.status().is_success() {
            return Err(BackendError::Function {
                function: "subscriptions".to_string(),
                message: format!("subscription lookup returned {}", response.status()),
                code: None,
            });
        }

        let rows: Vec<Subscription> = response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        Ok(rows.into_iter().next())
    }

    async fn upsert_subscription(
        &self,
        upsert: &SubscriptionUpsert,
    ) -> Result<Subscription, BackendError> {
        let url = format!("{}/rest/v1/subscriptions", self.base_url);
        let body = json!({
            "user_id": upsert.user_id,
            "plan_type": upsert.plan_type,
            "status": upsert.status,
            "trial_ends_at": upsert.trial_ends_at,
            "current_period_ends_at": upsert.current_period_ends_at,
            "payment_method": upsert.payment_method,
            "contract_signed": upsert.contract_signed,
            "contract_signed_at": upsert.contract_signed_at,
        });
        let response = self
            .http_client
            .post(&url)
            .query(&[("on_conflict", "user_id")])
            .bearer_auth(self.anon_key.expose_secret())
            .header("apikey", self.anon_key.expose_secret())
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::transport_error("subscriptions", e))?;

        if !response.status().is_success() {
            return Err(BackendError::Function {
                function: "subscriptions".to_string(),
                message: format!("subscription upsert returned {}", response.status()),
                code: None,
            });
        }

        let rows: Vec<Subscription> = response
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        rows.into_iter()
            .next()
            .ok_or_else(|| BackendError::Decode("empty upsert response".to_string()))
    }

    #[tracing::instrument(name = "Cancel Subscription", skip(self))]
    async fn cancel_subscription(
        &self,
        user_id: &str,
        reason: Option<&str>,
    ) -> Result<Subscription, BackendError> {
        self.invoke(
            CANCEL_SUBSCRIPTION,
            &json!({ "userId": user_id, "reason": reason }),
        )
        .await
    }

    async fn generate_document(
        &self,
        user_id: &str,
        document_type: &str,
    ) -> Result<SubscriptionDocument, BackendError> {
        self.invoke(
            GENERATE_DOCUMENT,
            &json!({ "userId": user_id, "documentType": document_type }),
        )
        .await
    }

    async fn list_documents(&self, user_id: &str) -> Result<Vec<SubscriptionDocument>, BackendError> {
        self.invoke(LIST_DOCUMENTS, &json!({ "userId": user_id })).await
    }
}
