use actix_web::{get, post, web, HttpResponse};
use serde::Serialize;
use validator::Validate;

use crate::core::{AppError, AppSuccessResponse, AuthenticatedUser};
use crate::models::payments::{CardMeta, InitializePaymentRequest, RelayedFrameMessage};
use crate::services::payment_session::PaymentInitError;
use crate::services::PaymentSessionAdapter;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RelayAck {
    accepted: bool,
}

#[tracing::instrument(name = "Initialize Payment", skip(payments, user, payload))]
#[post("/init")]
pub async fn initialize_payment(
    payments: web::Data<PaymentSessionAdapter>,
    user: Option<AuthenticatedUser>,
    payload: web::Json<InitializePaymentRequest>,
) -> Result<HttpResponse, PaymentInitError> {
    payload.validate().map_err(AppError::from)?;
    let response = payments
        .initialize(payload.into_inner(), user.as_ref())
        .await?;
    Ok(AppSuccessResponse::created(
        response,
        "Payment session initialized",
    ))
}

#[tracing::instrument(name = "Submit Payment Form", skip(payments, card))]
#[post("/{session_id}/submit")]
pub async fn submit_payment(
    payments: web::Data<PaymentSessionAdapter>,
    session_id: web::Path<String>,
    card: web::Json<CardMeta>,
) -> Result<HttpResponse, AppError> {
    card.validate()?;
    let envelope = payments.submit(&session_id, card.into_inner()).await?;
    Ok(AppSuccessResponse::ok(envelope, "Payment submitted"))
}

#[tracing::instrument(name = "Relay Gateway Message", skip(payments, event))]
#[post("/{session_id}/messages")]
pub async fn relay_message(
    payments: web::Data<PaymentSessionAdapter>,
    session_id: web::Path<String>,
    event: web::Json<RelayedFrameMessage>,
) -> Result<HttpResponse, AppError> {
    let accepted = payments.relay(&session_id, event.into_inner()).await?;
    if !accepted {
        tracing::warn!(session_id = %session_id, "gateway message dropped");
    }
    Ok(AppSuccessResponse::ok(RelayAck { accepted }, "Message received"))
}

#[tracing::instrument(name = "Get Payment Progress", skip(payments))]
#[get("/{session_id}/status")]
pub async fn payment_progress(
    payments: web::Data<PaymentSessionAdapter>,
    session_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let progress = payments.progress(&session_id).await?;
    Ok(AppSuccessResponse::ok(progress, "Payment status retrieved"))
}

#[tracing::instrument(name = "Get Field Validations", skip(payments))]
#[get("/{session_id}/validations")]
pub async fn field_validations(
    payments: web::Data<PaymentSessionAdapter>,
    session_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let validations = payments.field_validations(&session_id).await?;
    Ok(AppSuccessResponse::ok(validations, "Field validations retrieved"))
}

#[tracing::instrument(name = "Cancel Slow Payment", skip(payments))]
#[post("/{session_id}/cancel")]
pub async fn cancel_payment(
    payments: web::Data<PaymentSessionAdapter>,
    session_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let progress = payments.cancel(&session_id).await?;
    Ok(AppSuccessResponse::ok(progress, "Payment cancelled"))
}

#[tracing::instrument(name = "Reset Failed Payment", skip(payments))]
#[post("/{session_id}/retry")]
pub async fn retry_payment(
    payments: web::Data<PaymentSessionAdapter>,
    session_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let progress = payments.retry(&session_id).await?;
    Ok(AppSuccessResponse::ok(progress, "Payment reset"))
}
