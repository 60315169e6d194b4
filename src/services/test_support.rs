use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::models::payments::{GatewayStatus, PaymentSessionConfig, PaymentStatusReport};
use crate::models::registration::PaymentToken;
use crate::models::subscriptions::{Subscription, SubscriptionDocument, SubscriptionStatus, SubscriptionUpsert};
use crate::services::backend::{
    BackendError, BackendFunctions, CreatePaymentRequest, RegisterUserRequest, RegisteredUser,
    ReprocessResult,
};

pub fn sample_token() -> PaymentToken {
    PaymentToken {
        last_four_digits: "4242".into(),
        expiry_month: "04".into(),
        expiry_year: "2029".into(),
        cardholder_name: "Dana Levi".into(),
        token_created_at: Utc::now(),
    }
}

/// In-process stand-in for the backend functions, with call counters.
pub struct ScriptedBackend {
    create_payment_error: Mutex<Option<String>>,
    payment_status: Mutex<GatewayStatus>,
    reprocess_processed: AtomicBool,
    subscription: Mutex<Option<Subscription>>,
    subscription_delay: Mutex<Option<Duration>>,
    create_payment_calls: AtomicUsize,
    status_calls: AtomicUsize,
    register_calls: AtomicUsize,
    reprocess_calls: AtomicUsize,
    upsert_calls: AtomicUsize,
    cancel_calls: AtomicUsize,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self {
            create_payment_error: Mutex::new(None),
            payment_status: Mutex::new(GatewayStatus::Pending),
            reprocess_processed: AtomicBool::new(false),
            subscription: Mutex::new(None),
            subscription_delay: Mutex::new(None),
            create_payment_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            register_calls: AtomicUsize::new(0),
            reprocess_calls: AtomicUsize::new(0),
            upsert_calls: AtomicUsize::new(0),
            cancel_calls: AtomicUsize::new(0),
        }
    }
}

impl ScriptedBackend {
    pub fn fail_create_payment(&self, code: &str) {
        *self.create_payment_error.lock().unwrap() = Some(code.to_string());
    }

    pub fn set_payment_status(&self, status: GatewayStatus) {
        *self.payment_status.lock().unwrap() = status;
    }

    pub fn set_reprocess_processed(&self, processed: bool) {
        self.reprocess_processed.store(processed, Ordering::SeqCst);
    }

    pub fn set_subscription(&self, subscription: Option<Subscription>) {
        *self.subscription.lock().unwrap() = subscription;
    }

    pub fn set_subscription_delay(&self, delay: Duration) {
        *self.subscription_delay.lock().unwrap() = Some(delay);
    }

    pub fn create_payment_calls(&self) -> usize {
        self.create_payment_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn register_calls(&self) -> usize {
        self.register_calls.load(Ordering::SeqCst)
    }

    pub fn reprocess_calls(&self) -> usize {
        self.reprocess_calls.load(Ordering::SeqCst)
    }

    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }

    pub fn cancel_calls(&self) -> usize {
        self.cancel_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackendFunctions for ScriptedBackend {
    async fn create_payment(
        &self,
        request: &CreatePaymentRequest,
    ) -> Result<PaymentSessionConfig, BackendError> {
        let call = self.create_payment_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(code) = self.create_payment_error.lock().unwrap().clone() {
            return Err(BackendError::Function {
                function: "cardcom-payment/create-payment".into(),
                message: "gateway refused".into(),
                code: Some(code),
            });
        }
        Ok(PaymentSessionConfig {
            session_id: format!("session-{}-{}", request.plan_id, call),
            low_profile_code: format!("lpc-{}", call),
            terminal_number: "1000".into(),
            url: "https://secure.cardcom.solutions/openfields".into(),
        })
    }

    async fn payment_status(
        &self,
        _low_profile_code: &str,
    ) -> Result<PaymentStatusReport, BackendError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        Ok(PaymentStatusReport {
            status: *self.payment_status.lock().unwrap(),
            message: None,
            error_code: None,
            payment_token: None,
        })
    }

    async fn register_user(
        &self,
        _request: &RegisterUserRequest,
    ) -> Result<RegisteredUser, BackendError> {
        let call = self.register_calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(RegisteredUser {
            user_id: format!("registered-{}", call),
        })
    }

    async fn reprocess_webhook_by_email(
        &self,
        _email: &str,
    ) -> Result<ReprocessResult, BackendError> {
        self.reprocess_calls.fetch_add(1, Ordering::SeqCst);
        Ok(ReprocessResult {
            processed: self.reprocess_processed.load(Ordering::SeqCst),
            message: None,
        })
    }

    async fn get_subscription(&self, _user_id: &str) -> Result<Option<Subscription>, BackendError> {
        let delay = *self.subscription_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.subscription.lock().unwrap().clone())
    }

    async fn upsert_subscription(
        &self,
        upsert: &SubscriptionUpsert,
    ) -> Result<Subscription, BackendError> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        let subscription = Subscription {
            user_id: upsert.user_id.clone(),
            plan_type: upsert.plan_type,
            status: upsert.status,
            trial_ends_at: upsert.trial_ends_at,
            current_period_ends_at: Some(upsert.current_period_ends_at),
            payment_method: Some(upsert.payment_method.clone()),
            contract_signed: upsert.contract_signed,
            contract_signed_at: upsert.contract_signed_at,
        };
        *self.subscription.lock().unwrap() = Some(subscription.clone());
        Ok(subscription)
    }

    async fn cancel_subscription(
        &self,
        user_id: &str,
        _reason: Option<&str>,
    ) -> Result<Subscription, BackendError> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        let mut current = self.subscription.lock().unwrap();
        match current.as_mut() {
            Some(subscription) => {
                subscription.status = SubscriptionStatus::Cancelled;
                Ok(subscription.clone())
            }
            None => Err(BackendError::Function {
                function: "cancel-subscription".into(),
                message: format!("no subscription for {}", user_id),
                code: Some("not_found".into()),
            }),
        }
    }

    async fn generate_document(
        &self,
        _user_id: &str,
        document_type: &str,
    ) -> Result<SubscriptionDocument, BackendError> {
        Ok(SubscriptionDocument {
            id: "doc-1".into(),
            document_type: document_type.to_string(),
            url: "https://files.example/doc-1.pdf".into(),
            created_at: Utc::now(),
        })
    }

    async fn list_documents(&self, _user_id: &str) -> Result<Vec<SubscriptionDocument>, BackendError> {
        Ok(Vec::new())
    }
}
