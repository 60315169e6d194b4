use serde::{Deserialize, Serialize};

use crate::models::payments::GatewayStatus;
use crate::models::recovery::RecoverySession;

/// Subscription wizard steps, in order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum WizardStep {
    PlanSelection,
    Contract,
    Payment,
    Completion,
}

impl WizardStep {
    pub fn number(&self) -> u8 {
        match self {
            WizardStep::PlanSelection => 1,
            WizardStep::Contract => 2,
            WizardStep::Payment => 3,
            WizardStep::Completion => 4,
        }
    }

    /// Out-of-range numbers fall back to the first step.
    pub fn from_number(n: u8) -> Self {
        match n {
            2 => WizardStep::Contract,
            3 => WizardStep::Payment,
            4 => WizardStep::Completion,
            _ => WizardStep::PlanSelection,
        }
    }

    /// Accepts either the 1-4 stepper number or the kebab-case name.
    pub fn parse_param(raw: &str) -> Self {
        let raw = raw.trim();
        if let Ok(n) = raw.parse::<u8>() {
            return Self::from_number(n);
        }
        match raw {
            "contract" => WizardStep::Contract,
            "payment" => WizardStep::Payment,
            "completion" => WizardStep::Completion,
            _ => WizardStep::PlanSelection,
        }
    }
}

/// Query parameters shared by the subscription pages.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardQuery {
    pub step: Option<String>,
    pub plan: Option<String>,
    pub plan_id: Option<String>,
    pub reg_id: Option<String>,
    pub recover: Option<String>,
    pub success: Option<String>,
    pub error: Option<String>,
    pub lp_id: Option<String>,
    pub low_profile_id: Option<String>,
    pub session: Option<String>,
}

impl WizardQuery {
    pub fn route_plan(&self) -> Option<&str> {
        self.plan_id
            .as_deref()
            .or(self.plan.as_deref())
            .filter(|p| !p.trim().is_empty())
    }

    pub fn low_profile_code(&self) -> Option<&str> {
        self.lp_id.as_deref().or(self.low_profile_id.as_deref())
    }

    pub fn returned_with_success(&self) -> bool {
        matches!(self.success.as_deref(), Some("true") | Some("1"))
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DraftNotice {
    RegistrationExpired,
    RegistrationMissing,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayReturn {
    pub low_profile_code: String,
    pub status: GatewayStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardView {
    pub current_step: WizardStep,
    pub step_number: u8,
    pub requested_step: WizardStep,
    pub selected_plan: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<DraftNotice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovered_session: Option<RecoverySession>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_return: Option<GatewayReturn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}
