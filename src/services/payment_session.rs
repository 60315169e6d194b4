use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

use crate::core::config::{GatewayConfig, PaymentTimingConfig};
use crate::core::{AppError, AuthenticatedUser, Clock, StoreError};
use crate::jobs::{start_payment_status_poller, PollSchedule, PollTarget, PollVerdict, PollerHandle};
use crate::models::payments::{
    CardMeta, ConcernLevel, GatewayStatus, InboundMessage, InitializePaymentRequest,
    InitializePaymentResponse, OperationKind, OutboundEnvelope, OutboundMessage, PaymentProgress,
    PaymentSessionConfig, PaymentState, PendingPayment, RelayedFrameMessage,
};
use crate::models::recovery::{ErrorCategory, RecoverySession, SaveSessionRequest};
use crate::models::registration::PaymentToken;
use crate::models::subscriptions::PlanType;
use crate::services::backend::{BackendFunctions, CreatePaymentRequest};
use crate::services::completion::{
    CompletedPayment, CompletionLatch, CompletionOutcome, PaymentCompletionHandler,
};
use crate::services::frame_channel::{ChannelError, FrameChannel};
use crate::services::pending_payments::{PaymentOwner, PendingPaymentStore};
use crate::services::recovery::{map_error_code, RecoveryService};
use crate::services::registration_store::{DraftLookup, RegistrationDraftStore};

pub const CARD_FIELD_CSS: &str = "body{margin:0;direction:ltr}\
input{width:100%;height:40px;border:1px solid #d1d5db;border-radius:6px;padding:0 12px;font-size:16px}\
input.invalid{border-color:#ef4444}";
pub const CVV_FIELD_CSS: &str = "body{margin:0}\
input{width:100%;height:40px;border:1px solid #d1d5db;border-radius:6px;padding:0 8px;font-size:16px;text-align:center}\
input.invalid{border-color:#ef4444}";

const SLOW_MESSAGE: &str = "התשלום עדיין בעיבוד. הפעולה לוקחת יותר זמן מהרגיל, אנא המתן";
const STALLED_MESSAGE: &str = "העיבוד אורך זמן רב מהצפוי. ניתן להמשיך להמתין או לבטל ולנסות שוב";
const THREE_DS_MESSAGE: &str = "מתבצע אימות מול חברת האשראי";
const CANCELLED_MESSAGE: &str = "התשלום בוטל. ניתן לנסות שוב";

/// Failure of `initialize`. Gateway failures carry the category and, when
/// the user has to act, the recovery session opened for them.
#[derive(Debug)]
pub enum PaymentInitError {
    Rejected(AppError),
    Gateway {
        category: ErrorCategory,
        recovery: Option<RecoverySession>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PaymentInitErrorResponse {
    success: bool,
    message: String,
    error_category: ErrorCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    recovery_path: Option<String>,
}

impl From<AppError> for PaymentInitError {
    fn from(error: AppError) -> Self {
        PaymentInitError::Rejected(error)
    }
}

impl From<StoreError> for PaymentInitError {
    fn from(error: StoreError) -> Self {
        PaymentInitError::Rejected(error.into())
    }
}

impl Display for PaymentInitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentInitError::Rejected(e) => write!(f, "{}", e),
            PaymentInitError::Gateway { category, .. } => {
                write!(f, "payment initialization failed: {:?}", category)
            }
        }
    }
}

impl ResponseError for PaymentInitError {
    fn status_code(&self) -> StatusCode {
        match self {
            PaymentInitError::Rejected(e) => e.status_code(),
            PaymentInitError::Gateway { category, .. } => match category {
                ErrorCategory::RateLimit => StatusCode::TOO_MANY_REQUESTS,
                ErrorCategory::Timeout => StatusCode::GATEWAY_TIMEOUT,
                ErrorCategory::CardDeclined
                | ErrorCategory::ExpiredCard
                | ErrorCategory::InsufficientFunds
                | ErrorCategory::InvalidCardNumber => StatusCode::PAYMENT_REQUIRED,
                _ => StatusCode::BAD_GATEWAY,
            },
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            PaymentInitError::Rejected(e) => e.error_response(),
            PaymentInitError::Gateway { category, recovery } => {
                HttpResponse::build(self.status_code()).json(PaymentInitErrorResponse {
                    success: false,
                    message: category.message().to_string(),
                    error_category: *category,
                    recovery_path: recovery.as_ref().map(RecoverySession::recovery_path),
                })
            }
        }
    }
}

struct FlowState {
    state: PaymentState,
    message: Option<String>,
    error_category: Option<ErrorCategory>,
    recovery_session_id: Option<String>,
    outcome: Option<CompletionOutcome>,
    submitted_at: Option<Instant>,
    card: Option<CardMeta>,
    validations: HashMap<String, bool>,
    budget_exhausted: bool,
    settled_at: Option<Instant>,
}

impl FlowState {
    fn new() -> Self {
        Self {
            state: PaymentState::Idle,
            message: None,
            error_category: None,
            recovery_session_id: None,
            outcome: None,
            submitted_at: None,
            card: None,
            validations: HashMap::new(),
            budget_exhausted: false,
            settled_at: None,
        }
    }

    fn transition(&mut self, next: PaymentState) -> bool {
        if !self.state.can_transition_to(next) {
            tracing::warn!(from = ?self.state, to = ?next, "ignoring illegal payment transition");
            return false;
        }
        self.state = next;
        if next.is_terminal() {
            self.settled_at = Some(Instant::now());
        }
        true
    }
}

/// One payment session from `initialize` until success or retry.
struct PaymentFlow {
    config: PaymentSessionConfig,
    plan: PlanType,
    operation: OperationKind,
    owner: PaymentOwner,
    user_id: Option<String>,
    registration_id: Option<String>,
    email: String,
    channel: FrameChannel,
    latch: CompletionLatch,
    state: Mutex<FlowState>,
}

struct ActiveFlow {
    flow: Arc<PaymentFlow>,
    poller: PollerHandle,
    created: Instant,
}

/// Applies poll results and gateway messages to one flow.
struct FlowDriver {
    flow: Arc<PaymentFlow>,
    backend: Arc<dyn BackendFunctions>,
    recovery: Arc<RecoveryService>,
    completion: Arc<dyn PaymentCompletionHandler>,
    pending: PendingPaymentStore,
    clock: Arc<dyn Clock>,
}

impl FlowDriver {
    async fn complete(&self, token: Option<PaymentToken>, last_four: Option<String>) {
        let card = {
            let mut state = self.flow.state.lock().await;
            if state.state == PaymentState::Failed {
                tracing::warn!("success reported for a cancelled payment, left to reconciliation");
                return;
            }
            if !self.flow.latch.try_fire() {
                tracing::debug!("duplicate success signal ignored");
                return;
            }
            if state.state == PaymentState::Initializing {
                state.transition(PaymentState::Processing);
            }
            state.transition(PaymentState::Success);
            state.message = None;
            state.card.clone()
        };

        let token = token.unwrap_or_else(|| PaymentToken {
            last_four_digits: last_four.unwrap_or_else(|| "****".to_string()),
            expiry_month: card.as_ref().map(|c| c.card_exp_month.clone()).unwrap_or_default(),
            expiry_year: card.as_ref().map(|c| c.card_exp_year.clone()).unwrap_or_default(),
            cardholder_name: card.map(|c| c.card_owner_name).unwrap_or_default(),
            token_created_at: self.clock.now(),
        });

        let payment = CompletedPayment {
            session_id: self.flow.config.session_id.clone(),
            low_profile_code: self.flow.config.low_profile_code.clone(),
            plan: self.flow.plan,
            user_id: self.flow.user_id.clone(),
            registration_id: self.flow.registration_id.clone(),
            email: self.flow.email.clone(),
            token,
        };

        let result = self.completion.on_payment_complete(&payment).await;
        let mut state = self.flow.state.lock().await;
        match result {
            Ok(outcome) => state.outcome = Some(outcome),
            Err(e) => {
                // The charge went through; the subscription page repair tool
                // picks it up from the pending record.
                tracing::error!(error = %e, "payment succeeded but activation failed");
                state.message = Some(e.message());
            }
        }
    }

    async fn fail(&self, code: Option<&str>) {
        if self.flow.latch.is_fired() {
            tracing::warn!("failure reported after success, ignoring");
            return;
        }

        let category = map_error_code(code.unwrap_or("unknown"));
        if !self
            .flow
            .state
            .lock()
            .await
            .state
            .can_transition_to(PaymentState::Failed)
        {
            return;
        }

        let opened = self
            .recovery
            .record_failure(
                category,
                SaveSessionRequest {
                    user_id: self.flow.user_id.clone(),
                    email: Some(self.flow.email.clone()),
                    plan_id: self.flow.plan.as_str().to_string(),
                    payment_details: json!({
                        "lowProfileCode": self.flow.config.low_profile_code,
                        "operation": self.flow.operation,
                        "registrationId": self.flow.registration_id,
                    }),
                    error_category: None,
                },
            )
            .await
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "could not save recovery session");
                None
            });

        {
            let mut state = self.flow.state.lock().await;
            if !state.transition(PaymentState::Failed) {
                return;
            }
            state.error_category = Some(category);
            state.message = Some(category.message().to_string());
            state.recovery_session_id = opened.map(|session| session.session_id.to_string());
        }
        tracing::info!(?category, "payment failed");

        if let Err(e) = self.pending.clear(&self.flow.owner).await {
            tracing::warn!(error = %e, "could not clear pending payment");
        }
    }
}

#[async_trait]
impl PollTarget for FlowDriver {
    async fn poll_status(&self, attempt: u32) -> PollVerdict {
        if self.flow.latch.is_fired() || self.flow.state.lock().await.state.is_terminal() {
            return PollVerdict::Finished;
        }

        match self
            .backend
            .payment_status(&self.flow.config.low_profile_code)
            .await
        {
            Ok(report) => match report.status {
                GatewayStatus::Completed => {
                    self.complete(report.payment_token, None).await;
                    PollVerdict::Finished
                }
                GatewayStatus::Failed => {
                    self.fail(report.error_code.as_deref()).await;
                    PollVerdict::Finished
                }
                _ => PollVerdict::Continue,
            },
            Err(e) => {
                tracing::warn!(attempt, error = %e, "status check failed, will retry");
                PollVerdict::Continue
            }
        }
    }

    async fn on_message(&self, message: InboundMessage) -> PollVerdict {
        match message {
            InboundMessage::HandleSubmit { data } if data.is_success => {
                self.complete(None, data.last_four_digits).await;
                PollVerdict::Finished
            }
            InboundMessage::HandleSubmit { data } => {
                self.fail(data.response_code.as_deref()).await;
                PollVerdict::Finished
            }
            InboundMessage::HandleError { code, message } => {
                tracing::info!(?message, "gateway reported an error");
                self.fail(code.as_deref()).await;
                PollVerdict::Finished
            }
            InboundMessage::ThreeDsStarted => {
                self.flow.state.lock().await.message = Some(THREE_DS_MESSAGE.to_string());
                PollVerdict::Continue
            }
            InboundMessage::ThreeDsCompleted => {
                self.flow.state.lock().await.message = None;
                PollVerdict::Continue
            }
            InboundMessage::HandleValidations {
                field, is_valid, ..
            } => {
                self.flow
                    .state
                    .lock()
                    .await
                    .validations
                    .insert(field, is_valid);
                PollVerdict::Continue
            }
        }
    }

    async fn on_budget_exhausted(&self) {
        let mut state = self.flow.state.lock().await;
        state.budget_exhausted = true;
        if state.settled_at.is_none() {
            state.settled_at = Some(Instant::now());
        }
        state.message = Some(STALLED_MESSAGE.to_string());
    }
}

pub struct PaymentSessionAdapter {
    backend: Arc<dyn BackendFunctions>,
    drafts: RegistrationDraftStore,
    pending: PendingPaymentStore,
    recovery: Arc<RecoveryService>,
    completion: Arc<dyn PaymentCompletionHandler>,
    clock: Arc<dyn Clock>,
    gateway: GatewayConfig,
    timing: PaymentTimingConfig,
    flows: RwLock<HashMap<String, ActiveFlow>>,
}

impl PaymentSessionAdapter {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        backend: Arc<dyn BackendFunctions>,
        drafts: RegistrationDraftStore,
        pending: PendingPaymentStore,
        recovery: Arc<RecoveryService>,
        completion: Arc<dyn PaymentCompletionHandler>,
        clock: Arc<dyn Clock>,
        gateway: GatewayConfig,
        timing: PaymentTimingConfig,
    ) -> Self {
        Self {
            backend,
            drafts,
            pending,
            recovery,
            completion,
            clock,
            gateway,
            timing,
            flows: RwLock::new(HashMap::new()),
        }
    }

    async fn flow(&self, session_id: &str) -> Result<Arc<PaymentFlow>, AppError> {
        self.flows
            .read()
            .await
            .get(session_id)
            .map(|active| active.flow.clone())
            .ok_or_else(|| AppError::not_found("Payment session not found"))
    }

    #[tracing::instrument(
        name = "Initialize Payment Session",
        skip(self, request, user),
        fields(plan = %request.plan_id, operation = ?request.operation)
    )]
    pub async fn initialize(
        &self,
        request: InitializePaymentRequest,
        user: Option<&AuthenticatedUser>,
    ) -> Result<InitializePaymentResponse, PaymentInitError> {
        let plan: PlanType = request
            .plan_id
            .parse()
            .map_err(|_| AppError::bad_request("Unknown subscription plan"))?;

        let owner = match (&request.registration_id, user) {
            (Some(reg_id), _) => {
                let draft = match self.drafts.load(reg_id).await? {
                    DraftLookup::Active(draft) => draft,
                    DraftLookup::Expired => {
                        return Err(AppError::bad_request(
                            "פג תוקף ההרשמה. אנא התחל את ההרשמה מחדש",
                        )
                        .into())
                    }
                    DraftLookup::Missing => {
                        return Err(AppError::not_found("Registration not found").into())
                    }
                };
                if !draft.has_signed_contract() {
                    return Err(
                        AppError::conflict("The contract must be signed before payment").into(),
                    );
                }
                self.drafts.keep_alive(reg_id).await?;
                match user {
                    Some(user) => PaymentOwner::User(user.user_id.clone()),
                    None => PaymentOwner::Registration(reg_id.clone()),
                }
            }
            (None, Some(user)) => PaymentOwner::User(user.user_id.clone()),
            (None, None) => {
                return Err(AppError::unauthorized(
                    "Sign in or start a registration before paying",
                )
                .into())
            }
        };

        let mut state = FlowState::new();
        state.transition(PaymentState::Initializing);

        let user_id = user.map(|u| u.user_id.clone());
        let created = self
            .backend
            .create_payment(&CreatePaymentRequest {
                plan_id: plan,
                operation: request.operation,
                payer: request.payer.clone(),
                user_id: user_id.clone(),
                registration_id: request.registration_id.clone(),
            })
            .await;

        let config = match created {
            Ok(config) => config,
            Err(e) => {
                let category = map_error_code(e.code().unwrap_or("unknown"));
                tracing::warn!(error = %e, ?category, "payment session could not be created");
                let recovery = self
                    .recovery
                    .record_failure(
                        category,
                        SaveSessionRequest {
                            user_id,
                            email: Some(request.payer.email.clone()),
                            plan_id: plan.as_str().to_string(),
                            payment_details: json!({
                                "operation": request.operation,
                                "registrationId": request.registration_id,
                            }),
                            error_category: None,
                        },
                    )
                    .await?;
                return Err(PaymentInitError::Gateway { category, recovery });
            }
        };

        self.pending
            .record(
                &owner,
                &PendingPayment {
                    payment_pending_id: config.low_profile_code.clone(),
                    payment_pending_plan: plan.as_str().to_string(),
                    payment_session_created: self.clock.now(),
                    email: Some(request.payer.email.clone()),
                },
            )
            .await?;
        if let Some(reg_id) = &request.registration_id {
            self.pending
                .remember_registration(&request.payer.email, reg_id)
                .await?;
        }

        let (channel, messages) = FrameChannel::new(&self.gateway.origin);
        let outbound = channel.post(OutboundMessage::Init {
            low_profile_code: config.low_profile_code.clone(),
            session_id: config.session_id.clone(),
            card_field_css: CARD_FIELD_CSS.to_string(),
            cvv_field_css: CVV_FIELD_CSS.to_string(),
            language: self.gateway.language.clone(),
        });

        let flow = Arc::new(PaymentFlow {
            config: config.clone(),
            plan,
            operation: request.operation,
            owner,
            user_id,
            registration_id: request.registration_id,
            email: request.payer.email,
            channel,
            latch: CompletionLatch::new(),
            state: Mutex::new(state),
        });

        let driver = Arc::new(FlowDriver {
            flow: flow.clone(),
            backend: self.backend.clone(),
            recovery: self.recovery.clone(),
            completion: self.completion.clone(),
            pending: self.pending.clone(),
            clock: self.clock.clone(),
        });
        let poller = start_payment_status_poller(driver, messages, PollSchedule::from(&self.timing));

        self.flows
            .write()
            .await
            .insert(
                config.session_id.clone(),
                ActiveFlow {
                    flow,
                    poller,
                    created: Instant::now(),
                },
            );

        tracing::info!(session_id = %config.session_id, "payment session initialized");
        Ok(InitializePaymentResponse {
            session: config,
            outbound,
        })
    }

    /// Hands the card metadata to the frame. Completion is reported later
    /// by the poller or by a relayed gateway message.
    #[tracing::instrument(name = "Submit Payment", skip(self, card))]
    pub async fn submit(&self, session_id: &str, card: CardMeta) -> Result<OutboundEnvelope, AppError> {
        let flow = self.flow(session_id).await?;
        {
            let mut state = flow.state.lock().await;
            if state.state != PaymentState::Initializing {
                return Err(AppError::conflict("Payment was already submitted"));
            }
            state.transition(PaymentState::Processing);
            state.submitted_at = Some(Instant::now());
            state.card = Some(card.clone());
        }

        let message = match flow.operation {
            OperationKind::Charge => OutboundMessage::SubmitPayment {
                card_owner_name: card.card_owner_name,
                card_exp_month: card.card_exp_month,
                card_exp_year: card.card_exp_year,
            },
            OperationKind::Tokenization => OutboundMessage::SubmitCardData {
                card_owner_name: card.card_owner_name,
                card_exp_month: card.card_exp_month,
                card_exp_year: card.card_exp_year,
            },
        };
        let envelope = flow.channel.post(message);

        if let Some(active) = self.flows.read().await.get(session_id) {
            active.poller.arm();
        }
        if let Some(reg_id) = &flow.registration_id {
            if let Err(e) = self.drafts.keep_alive(reg_id).await {
                tracing::warn!(error = %e, "could not refresh registration draft");
            }
        }
        Ok(envelope)
    }

    /// Forwards a browser `message` event. Returns whether it was accepted;
    /// events from any origin other than the gateway are dropped.
    pub async fn relay(
        &self,
        session_id: &str,
        event: RelayedFrameMessage,
    ) -> Result<bool, AppError> {
        let flow = self.flow(session_id).await?;
        match flow.channel.receive(&event.origin, event.data) {
            Ok(_) => Ok(true),
            Err(ChannelError::UntrustedOrigin(_)) => Ok(false),
            Err(ChannelError::Malformed(reason)) => Err(AppError::bad_request(reason)),
            Err(ChannelError::Closed) => {
                tracing::debug!(session_id, "message for a finished session");
                Ok(false)
            }
        }
    }

    fn concern(&self, flow: &PaymentFlow, state: &FlowState, elapsed: std::time::Duration) -> ConcernLevel {
        if state.state != PaymentState::Processing {
            return ConcernLevel::None;
        }
        let threshold = self.timing.concern_threshold(flow.operation);
        if state.budget_exhausted || elapsed >= threshold * 2 {
            ConcernLevel::Stalled
        } else if elapsed >= threshold {
            ConcernLevel::Slow
        } else {
            ConcernLevel::None
        }
    }

    pub async fn progress(&self, session_id: &str) -> Result<PaymentProgress, AppError> {
        let flow = self.flow(session_id).await?;
        let state = flow.state.lock().await;
        let elapsed = state
            .submitted_at
            .map(|at| at.elapsed())
            .unwrap_or_default();
        let concern = self.concern(&flow, &state, elapsed);
        let can_cancel = state.state == PaymentState::Processing
            && elapsed >= self.timing.concern_threshold(flow.operation);

        let message = state.message.clone().or_else(|| match concern {
            ConcernLevel::Slow => Some(SLOW_MESSAGE.to_string()),
            ConcernLevel::Stalled => Some(STALLED_MESSAGE.to_string()),
            ConcernLevel::None => None,
        });

        Ok(PaymentProgress {
            session_id: session_id.to_string(),
            state: state.state,
            elapsed_secs: elapsed.as_secs(),
            concern,
            can_cancel,
            message,
            error_category: state.error_category,
            recovery_session_id: state.recovery_session_id.clone(),
            redirect_to: state.outcome.as_ref().map(|o| o.redirect_to.clone()),
        })
    }

    /// Per-field validity last reported by the frame.
    pub async fn field_validations(&self, session_id: &str) -> Result<HashMap<String, bool>, AppError> {
        let flow = self.flow(session_id).await?;
        let validations = flow.state.lock().await.validations.clone();
        Ok(validations)
    }

    /// Gives up on a slow payment. Only offered once the concern threshold passed.
    #[tracing::instrument(name = "Cancel Payment", skip(self))]
    pub async fn cancel(&self, session_id: &str) -> Result<PaymentProgress, AppError> {
        let flow = self.flow(session_id).await?;
        {
            let mut state = flow.state.lock().await;
            let elapsed = state
                .submitted_at
                .map(|at| at.elapsed())
                .unwrap_or_default();
            if state.state != PaymentState::Processing
                || elapsed < self.timing.concern_threshold(flow.operation)
            {
                return Err(AppError::conflict(
                    "Payment can only be cancelled after it has been processing for a while",
                ));
            }
            if flow.latch.is_fired() {
                return Err(AppError::conflict("Payment already completed"));
            }
            state.transition(PaymentState::Failed);
            state.error_category = Some(ErrorCategory::Timeout);
            state.message = Some(CANCELLED_MESSAGE.to_string());
        }

        if let Some(active) = self.flows.read().await.get(session_id) {
            active.poller.stop();
        }
        self.pending.clear(&flow.owner).await?;
        self.progress(session_id).await
    }

    /// Drops sessions that settled more than the grace period ago, and
    /// sessions that never settled within the abandonment TTL. Returns how
    /// many were dropped.
    pub async fn evict_stale_flows(&self) -> usize {
        let grace = self.timing.settled_flow_grace();
        let abandoned = self.timing.abandoned_flow_ttl();
        let mut flows = self.flows.write().await;

        let mut stale = Vec::new();
        for (session_id, active) in flows.iter() {
            let settled_at = active.flow.state.lock().await.settled_at;
            let expired = match settled_at {
                Some(at) => at.elapsed() >= grace,
                None => active.created.elapsed() >= abandoned,
            };
            if expired {
                stale.push(session_id.clone());
            }
        }

        for session_id in &stale {
            if let Some(active) = flows.remove(session_id) {
                if !active.poller.is_finished() {
                    tracing::debug!(session_id = %session_id, "stopping poller of evicted session");
                    active.poller.stop();
                }
            }
        }
        stale.len()
    }

    /// `FAILED -> IDLE`: forgets the session so a new `initialize` starts clean.
    #[tracing::instrument(name = "Retry Payment", skip(self))]
    pub async fn retry(&self, session_id: &str) -> Result<PaymentProgress, AppError> {
        let flow = self.flow(session_id).await?;
        {
            let mut state = flow.state.lock().await;
            if state.state != PaymentState::Failed {
                return Err(AppError::conflict("Only a failed payment can be retried"));
            }
            state.transition(PaymentState::Idle);
        }

        if let Some(active) = self.flows.write().await.remove(session_id) {
            active.poller.stop();
        }
        self.pending.clear(&flow.owner).await?;

        Ok(PaymentProgress {
            session_id: session_id.to_string(),
            state: PaymentState::Idle,
            elapsed_secs: 0,
            concern: ConcernLevel::None,
            can_cancel: false,
            message: None,
            error_category: None,
            recovery_session_id: None,
            redirect_to: None,
        })
    }
}
