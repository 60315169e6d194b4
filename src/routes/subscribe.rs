use actix_web::{delete, get, patch, post, web, HttpRequest, HttpResponse};
use validator::Validate;

use crate::core::{normalize_email, AppError, AppSuccessResponse, Clock};
use crate::models::registration::{
    ContractDetails, DraftPassword, DraftPatch, DraftResponse, RegistrationDraft,
    SignContractRequest, StartRegistrationRequest, StartRegistrationResponse,
};
use crate::models::subscriptions::{PlanSummary, PlanType};
use crate::models::wizard::{DraftNotice, WizardQuery};
use crate::services::registration_store::DraftLookup;
use crate::services::wizard::LoadingFlags;
use crate::services::{RegistrationDraftStore, WizardService};

fn draft_response(lookup: DraftLookup) -> DraftResponse {
    match lookup {
        DraftLookup::Active(draft) => DraftResponse {
            draft: Some(draft.redacted()),
            notice: None,
        },
        DraftLookup::Expired => DraftResponse {
            draft: None,
            notice: Some(DraftNotice::RegistrationExpired),
        },
        DraftLookup::Missing => DraftResponse {
            draft: None,
            notice: Some(DraftNotice::RegistrationMissing),
        },
    }
}

#[tracing::instrument(name = "List Subscription Plans")]
#[get("/plans")]
pub async fn list_plans() -> HttpResponse {
    let plans: Vec<PlanSummary> = PlanType::ALL.into_iter().map(PlanSummary::from).collect();
    AppSuccessResponse::ok(plans, "Subscription plans retrieved successfully")
}

#[tracing::instrument(name = "Resolve Wizard Step", skip(wizard))]
#[get("/wizard")]
pub async fn resolve_wizard(
    wizard: web::Data<WizardService>,
    query: web::Query<WizardQuery>,
    loading: web::Query<LoadingFlags>,
) -> Result<HttpResponse, AppError> {
    let view = wizard.resolve(&query, *loading).await?;
    Ok(AppSuccessResponse::ok(view, "Wizard state resolved"))
}

#[tracing::instrument(name = "Start Registration", skip(drafts, clock, payload), fields(email = %payload.email))]
#[post("/registration")]
pub async fn start_registration(
    drafts: web::Data<RegistrationDraftStore>,
    clock: web::Data<dyn Clock>,
    payload: web::Json<StartRegistrationRequest>,
) -> Result<HttpResponse, AppError> {
    let mut payload = payload.into_inner();
    payload.email = normalize_email(&payload.email);
    payload.validate()?;

    if let Some(plan) = payload.plan_id.as_deref() {
        plan.parse::<PlanType>().map_err(AppError::bad_request)?;
    }

    let mut draft = RegistrationDraft::new(payload.email, clock.now());
    draft.password = Some(DraftPassword::new(payload.password));
    draft.user_data = payload.user_data;
    draft.plan_id = payload.plan_id;

    let registration_id = drafts.create(draft).await?;
    let draft = drafts
        .load(&registration_id)
        .await?
        .into_active()
        .ok_or_else(|| AppError::internal_error("Registration draft was not persisted"))?;

    Ok(AppSuccessResponse::created(
        StartRegistrationResponse {
            registration_id,
            draft: draft.redacted(),
        },
        "Registration started",
    ))
}

#[tracing::instrument(name = "Load Registration", skip(drafts))]
#[get("/registration/{registration_id}")]
pub async fn get_registration(
    drafts: web::Data<RegistrationDraftStore>,
    registration_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let lookup = drafts.load(&registration_id).await?;
    Ok(AppSuccessResponse::ok(
        draft_response(lookup),
        "Registration retrieved",
    ))
}

#[tracing::instrument(name = "Update Registration", skip(drafts, patch))]
#[patch("/registration/{registration_id}")]
pub async fn update_registration(
    drafts: web::Data<RegistrationDraftStore>,
    registration_id: web::Path<String>,
    patch: web::Json<DraftPatch>,
) -> Result<HttpResponse, AppError> {
    let mut patch = patch.into_inner();
    if let Some(plan) = patch.plan_id.as_deref() {
        plan.parse::<PlanType>().map_err(AppError::bad_request)?;
    }
    if let Some(user_data) = &patch.user_data {
        user_data.validate()?;
    }
    if let Some(email) = patch.email.as_deref() {
        patch.email = Some(normalize_email(email));
    }
    // Contract evidence only comes from the signing endpoint and the card
    // token only from the payment flow.
    patch.contract_signed = None;
    patch.contract_signed_at = None;
    patch.contract_details = None;
    patch.payment_token = None;

    let lookup = drafts.update(&registration_id, patch).await?;
    Ok(AppSuccessResponse::ok(
        draft_response(lookup),
        "Registration updated",
    ))
}

#[tracing::instrument(name = "Clear Registration", skip(drafts))]
#[delete("/registration/{registration_id}")]
pub async fn clear_registration(
    drafts: web::Data<RegistrationDraftStore>,
    registration_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    drafts.clear(&registration_id).await?;
    Ok(AppSuccessResponse::ok((), "Registration cleared"))
}

#[tracing::instrument(name = "Sign Contract", skip(drafts, req, payload))]
#[post("/registration/{registration_id}/contract")]
pub async fn sign_contract(
    req: HttpRequest,
    drafts: web::Data<RegistrationDraftStore>,
    registration_id: web::Path<String>,
    payload: web::Json<SignContractRequest>,
) -> Result<HttpResponse, AppError> {
    let payload = payload.into_inner();
    let details = ContractDetails {
        full_name: payload.full_name,
        signature: payload.signature,
        agreed_to_terms: payload.agreed_to_terms,
        ip_address: req
            .connection_info()
            .realip_remote_addr()
            .map(str::to_string),
    };

    let lookup = drafts.sign_contract(&registration_id, details).await?;
    Ok(AppSuccessResponse::ok(
        draft_response(lookup),
        "Contract signed",
    ))
}
