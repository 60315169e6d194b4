use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::recovery::ErrorCategory;

/// Lifecycle of one payment attempt.
///
/// `Failed -> Idle` happens only through an explicit retry; nothing leaves
/// `Success` within the same session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentState {
    Idle,
    Initializing,
    Processing,
    Success,
    Failed,
}

impl PaymentState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentState::Success | PaymentState::Failed)
    }

    pub fn can_transition_to(&self, next: PaymentState) -> bool {
        use PaymentState::*;
        matches!(
            (self, next),
            (Idle, Initializing)
                | (Initializing, Processing)
                | (Initializing, Failed)
                | (Processing, Processing)
                | (Processing, Success)
                | (Processing, Failed)
                | (Failed, Idle)
        )
    }
}

/// Status reported by the gateway status function.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GatewayStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusReport {
    pub status: GatewayStatus,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub payment_token: Option<crate::models::registration::PaymentToken>,
}

/// Which gateway operation is in flight; decides the concern threshold.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Tokenization,
    Charge,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ConcernLevel {
    None,
    Slow,
    Stalled,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PayerInfo {
    #[validate(length(min = 1))]
    pub full_name: String,
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InitializePaymentRequest {
    pub plan_id: String,
    #[serde(default)]
    pub registration_id: Option<String>,
    #[validate]
    pub payer: PayerInfo,
    #[serde(default = "default_operation")]
    pub operation: OperationKind,
}

fn default_operation() -> OperationKind {
    OperationKind::Charge
}

/// Hosted-field session handed back by the payment-creation function.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSessionConfig {
    pub session_id: String,
    pub low_profile_code: String,
    pub terminal_number: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CardMeta {
    #[validate(length(min = 2))]
    pub card_owner_name: String,
    #[validate(length(min = 1, max = 2))]
    pub card_exp_month: String,
    #[validate(length(min = 2, max = 4))]
    pub card_exp_year: String,
}

/// Messages posted into the hosted-fields frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action")]
pub enum OutboundMessage {
    #[serde(rename = "init", rename_all = "camelCase")]
    Init {
        low_profile_code: String,
        session_id: String,
        #[serde(rename = "cardFieldCSS")]
        card_field_css: String,
        #[serde(rename = "cvvFieldCSS")]
        cvv_field_css: String,
        language: String,
    },
    #[serde(rename = "submitPayment", rename_all = "camelCase")]
    SubmitPayment {
        card_owner_name: String,
        card_exp_month: String,
        card_exp_year: String,
    },
    #[serde(rename = "submitCardData", rename_all = "camelCase")]
    SubmitCardData {
        card_owner_name: String,
        card_exp_month: String,
        card_exp_year: String,
    },
}

/// An outbound message bound to the single origin allowed to read it.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OutboundEnvelope {
    pub target_origin: String,
    pub message: OutboundMessage,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOutcome {
    #[serde(alias = "IsSuccess")]
    pub is_success: bool,
    #[serde(default, alias = "Description")]
    pub description: Option<String>,
    #[serde(default, alias = "ResponseCode")]
    pub response_code: Option<String>,
    #[serde(default, alias = "Last4Digits")]
    pub last_four_digits: Option<String>,
}

/// Messages the hosted-fields frame posts back to the page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action")]
pub enum InboundMessage {
    #[serde(rename = "HandleSubmit")]
    HandleSubmit { data: SubmitOutcome },
    #[serde(rename = "3DSProcessStarted")]
    ThreeDsStarted,
    #[serde(rename = "3DSProcessCompleted")]
    ThreeDsCompleted,
    #[serde(rename = "HandleError", rename_all = "camelCase")]
    HandleError {
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        code: Option<String>,
    },
    #[serde(rename = "handleValidations", rename_all = "camelCase")]
    HandleValidations {
        field: String,
        is_valid: bool,
        #[serde(default)]
        message: Option<String>,
    },
}

/// A raw `message` event relayed by the browser.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayedFrameMessage {
    pub origin: String,
    pub data: serde_json::Value,
}

/// Bookkeeping that lets a reload recognize an in-flight session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingPayment {
    pub payment_pending_id: String,
    pub payment_pending_plan: String,
    pub payment_session_created: DateTime<Utc>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentProgress {
    pub session_id: String,
    pub state: PaymentState,
    pub elapsed_secs: u64,
    pub concern: ConcernLevel,
    pub can_cancel: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_category: Option<ErrorCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery_session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializePaymentResponse {
    pub session: PaymentSessionConfig,
    pub outbound: OutboundEnvelope,
}
