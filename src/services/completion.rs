use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::core::{AppError, Clock};
use crate::models::registration::{PaymentToken, RegistrationDraft};
use crate::models::subscriptions::{PlanType, Subscription, SubscriptionStatus, SubscriptionUpsert};
use crate::services::backend::{BackendFunctions, RegisterUserRequest};
use crate::services::pending_payments::{PaymentOwner, PendingPaymentStore};
use crate::services::registration_store::RegistrationDraftStore;

/// Set-once guard shared by every source that can observe payment success.
#[derive(Debug, Default)]
pub struct CompletionLatch(AtomicBool);

impl CompletionLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// True for exactly one caller.
    pub fn try_fire(&self) -> bool {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_fired(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone)]
pub struct CompletedPayment {
    pub session_id: String,
    pub low_profile_code: String,
    pub plan: PlanType,
    pub user_id: Option<String>,
    pub registration_id: Option<String>,
    pub email: String,
    pub token: PaymentToken,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompletionOutcome {
    pub user_id: Option<String>,
    pub subscription: Option<Subscription>,
    pub redirect_to: String,
}

/// The single "payment complete" side effect.
#[async_trait]
pub trait PaymentCompletionHandler: Send + Sync {
    async fn on_payment_complete(
        &self,
        payment: &CompletedPayment,
    ) -> Result<CompletionOutcome, AppError>;
}

/// Creates the account from the draft when needed, upserts the
/// subscription and clears the transient signup state.
pub struct SubscriptionActivator {
    backend: Arc<dyn BackendFunctions>,
    drafts: RegistrationDraftStore,
    pending: PendingPaymentStore,
    clock: Arc<dyn Clock>,
}

impl SubscriptionActivator {
    pub fn new(
        backend: Arc<dyn BackendFunctions>,
        drafts: RegistrationDraftStore,
        pending: PendingPaymentStore,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            backend,
            drafts,
            pending,
            clock,
        }
    }

    async fn register_from_draft(
        &self,
        draft: &RegistrationDraft,
        payment: &CompletedPayment,
    ) -> Result<Option<String>, AppError> {
        let Some(password) = &draft.password else {
            return Ok(None);
        };

        let registered = self
            .backend
            .register_user(&RegisterUserRequest {
                email: draft.email.clone(),
                password: password.expose().to_string(),
                user_data: draft.user_data.clone(),
                plan_id: payment.plan,
                contract_details: draft.contract_details.clone(),
                payment_token: payment.token.clone(),
            })
            .await?;
        Ok(Some(registered.user_id))
    }

    fn upsert_for(
        &self,
        user_id: &str,
        payment: &CompletedPayment,
        draft: Option<&RegistrationDraft>,
    ) -> SubscriptionUpsert {
        let now = self.clock.now();
        let trial = payment.plan.trial_period();
        let (status, trial_ends_at) = match trial {
            Some(trial) => (SubscriptionStatus::Trial, Some(now + trial)),
            None => (SubscriptionStatus::Active, None),
        };

        SubscriptionUpsert {
            user_id: user_id.to_string(),
            plan_type: payment.plan,
            status,
            trial_ends_at,
            current_period_ends_at: trial_ends_at.unwrap_or(now + payment.plan.billing_period()),
            payment_method: json!({
                "type": "credit_card",
                "lastFourDigits": payment.token.last_four_digits,
                "expiryMonth": payment.token.expiry_month,
                "expiryYear": payment.token.expiry_year,
                "cardholderName": payment.token.cardholder_name,
            }),
            contract_signed: draft.map_or(false, |d| d.has_signed_contract()),
            contract_signed_at: draft.and_then(|d| d.contract_signed_at),
        }
    }
}

#[async_trait]
impl PaymentCompletionHandler for SubscriptionActivator {
    #[tracing::instrument(name = "Activate Subscription", skip(self, payment), fields(session_id = %payment.session_id))]
    async fn on_payment_complete(
        &self,
        payment: &CompletedPayment,
    ) -> Result<CompletionOutcome, AppError> {
        let draft = match payment.registration_id.as_deref() {
            Some(reg_id) => self.drafts.load(reg_id).await?.into_active(),
            None => None,
        };

        let user_id = match (&payment.user_id, &draft) {
            (Some(user_id), _) => Some(user_id.clone()),
            (None, Some(draft)) => self.register_from_draft(draft, payment).await?,
            (None, None) => None,
        };

        let Some(user_id) = user_id else {
            // Guest paid before registering; keep the pending record so the
            // payment can be reconciled once the account exists.
            tracing::info!("payment completed without an account");
            return Ok(CompletionOutcome {
                user_id: None,
                subscription: None,
                redirect_to: format!("/auth?mode=register&session={}", payment.session_id),
            });
        };

        let upsert = self.upsert_for(&user_id, payment, draft.as_ref());
        let subscription = self.backend.upsert_subscription(&upsert).await?;

        if let Some(reg_id) = &payment.registration_id {
            self.drafts.clear(reg_id).await?;
            self.pending
                .clear(&PaymentOwner::Registration(reg_id.clone()))
                .await?;
        }
        self.pending.clear(&PaymentOwner::User(user_id.clone())).await?;

        tracing::info!(user_id = %user_id, plan = %payment.plan, "subscription activated");
        Ok(CompletionOutcome {
            user_id: Some(user_id),
            subscription: Some(subscription),
            redirect_to: "/subscription?success=true".to_string(),
        })
    }
}
