use serde::Deserialize;
use std::sync::Arc;

use crate::core::AppError;
use crate::models::payments::GatewayStatus;
use crate::models::registration::RegistrationDraft;
use crate::models::subscriptions::PlanType;
use crate::models::wizard::{DraftNotice, GatewayReturn, WizardQuery, WizardStep, WizardView};
use crate::services::backend::BackendFunctions;
use crate::services::recovery::{get_error_message, RecoveryService};
use crate::services::registration_store::{DraftLookup, RegistrationDraftStore};

/// Artifacts produced by earlier steps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepEvidence {
    pub contract_signed: bool,
    pub payment_completed: bool,
}

impl StepEvidence {
    pub fn from_draft(draft: Option<&RegistrationDraft>) -> Self {
        Self {
            contract_signed: draft.map_or(false, |d| d.has_signed_contract()),
            payment_completed: draft.map_or(false, |d| d.payment_token.is_some()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoadingFlags {
    pub auth_loading: bool,
    pub subscription_loading: bool,
}

impl LoadingFlags {
    pub fn any(&self) -> bool {
        self.auth_loading || self.subscription_loading
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Regression {
    pub from: WizardStep,
    pub to: WizardStep,
}

/// Holds the wizard position and the chosen plan; never persists anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepController {
    current_step: WizardStep,
    selected_plan: Option<String>,
}

impl StepController {
    pub fn new(current_step: WizardStep, selected_plan: Option<String>) -> Self {
        Self {
            current_step,
            selected_plan: selected_plan.filter(|p| !p.trim().is_empty()),
        }
    }

    pub fn current_step(&self) -> WizardStep {
        self.current_step
    }

    pub fn selected_plan(&self) -> Option<&str> {
        self.selected_plan.as_deref()
    }

    /// A route-supplied plan is adopted only when none is selected yet.
    pub fn adopt_route_plan(&mut self, route_plan: Option<&str>) -> bool {
        match (self.selected_plan.as_ref(), route_plan) {
            (None, Some(plan)) if !plan.trim().is_empty() => {
                self.selected_plan = Some(plan.trim().to_string());
                true
            }
            _ => false,
        }
    }

    fn has_valid_plan(&self) -> bool {
        self.selected_plan
            .as_deref()
            .map_or(false, |p| p.parse::<PlanType>().is_ok())
    }

    fn required_regression(&self, evidence: &StepEvidence) -> Option<WizardStep> {
        match self.current_step {
            WizardStep::PlanSelection => None,
            _ if !self.has_valid_plan() => Some(WizardStep::PlanSelection),
            WizardStep::Payment | WizardStep::Completion if !evidence.contract_signed => {
                Some(WizardStep::Contract)
            }
            WizardStep::Completion if !evidence.payment_completed => Some(WizardStep::Payment),
            _ => None,
        }
    }

    /// Forces the step back until its preconditions hold. Skipped entirely
    /// while auth or subscription status is still loading.
    pub fn validate(&mut self, evidence: &StepEvidence, loading: LoadingFlags) -> Option<Regression> {
        if loading.any() {
            return None;
        }

        let from = self.current_step;
        while let Some(to) = self.required_regression(evidence) {
            self.current_step = to;
        }

        (self.current_step != from).then(|| Regression {
            from,
            to: self.current_step,
        })
    }
}

/// Builds the wizard page state from the shared query parameters.
pub struct WizardService {
    drafts: RegistrationDraftStore,
    recovery: Arc<RecoveryService>,
    backend: Arc<dyn BackendFunctions>,
}

impl WizardService {
    pub fn new(
        drafts: RegistrationDraftStore,
        recovery: Arc<RecoveryService>,
        backend: Arc<dyn BackendFunctions>,
    ) -> Self {
        Self {
            drafts,
            recovery,
            backend,
        }
    }

    pub async fn resolve(
        &self,
        query: &WizardQuery,
        loading: LoadingFlags,
    ) -> Result<WizardView, AppError> {
        let (draft, notice) = match query.reg_id.as_deref() {
            Some(reg_id) => match self.drafts.load(reg_id).await? {
                DraftLookup::Active(draft) => (Some(draft), None),
                DraftLookup::Expired => (None, Some(DraftNotice::RegistrationExpired)),
                DraftLookup::Missing => (None, Some(DraftNotice::RegistrationMissing)),
            },
            None => (None, None),
        };

        let recovered_session = match query.recover.as_deref() {
            Some(id) => self.recovery.get_session(id).await?,
            None => None,
        };

        let stored_plan = draft
            .as_ref()
            .and_then(|d| d.plan_id.clone())
            .or_else(|| recovered_session.as_ref().map(|s| s.plan_id.clone()));

        let requested_step = query
            .step
            .as_deref()
            .map(WizardStep::parse_param)
            .unwrap_or(WizardStep::PlanSelection);

        let mut controller = StepController::new(requested_step, stored_plan);
        controller.adopt_route_plan(query.route_plan());

        // Recovery sessions and return parameters are client-supplied; only
        // the draft and a confirmed gateway status count as evidence.
        let mut evidence = StepEvidence::from_draft(draft.as_ref());

        let gateway_return = match query.low_profile_code() {
            Some(lpc) => Some(self.gateway_return(lpc).await),
            None => None,
        };
        if matches!(
            gateway_return,
            Some(GatewayReturn {
                status: GatewayStatus::Completed,
                ..
            })
        ) {
            evidence.payment_completed = true;
        } else if query.returned_with_success() {
            tracing::warn!("ignoring success return without a confirmed payment");
        }

        if let Some(regression) = controller.validate(&evidence, loading) {
            tracing::info!(
                from = regression.from.number(),
                to = regression.to.number(),
                "wizard step regressed"
            );
        }

        let current_step = controller.current_step();
        Ok(WizardView {
            current_step,
            step_number: current_step.number(),
            requested_step,
            selected_plan: controller.selected_plan().map(str::to_string),
            notice,
            recovered_session,
            gateway_return,
            error_message: query.error.as_deref().map(get_error_message),
        })
    }

    async fn gateway_return(&self, low_profile_code: &str) -> GatewayReturn {
        match self.backend.payment_status(low_profile_code).await {
            Ok(report) => GatewayReturn {
                low_profile_code: low_profile_code.to_string(),
                status: report.status,
                message: report.message,
            },
            Err(e) => {
                tracing::warn!(error = %e, "could not confirm returned payment");
                GatewayReturn {
                    low_profile_code: low_profile_code.to_string(),
                    status: GatewayStatus::Unknown,
                    message: Some(e.user_message()),
                }
            }
        }
    }
}
