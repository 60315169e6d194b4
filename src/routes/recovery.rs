use actix_web::{delete, get, post, web, HttpResponse};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::{AppError, AppSuccessResponse, AuthenticatedUser};
use crate::models::recovery::{SaveSessionRequest, SaveSessionResponse};
use crate::services::recovery::{get_error_message, is_transient_error, map_error_code};
use crate::services::RecoveryService;

#[derive(Deserialize)]
pub struct ErrorCodeQuery {
    code: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorMessageResponse {
    code: String,
    category: crate::models::recovery::ErrorCategory,
    message: String,
    transient: bool,
}

#[tracing::instrument(name = "Save Recovery Session", skip(recovery, user, payload))]
#[post("/sessions")]
pub async fn save_session(
    recovery: web::Data<RecoveryService>,
    user: Option<AuthenticatedUser>,
    payload: web::Json<SaveSessionRequest>,
) -> Result<HttpResponse, AppError> {
    payload.validate()?;
    let mut request = payload.into_inner();
    if let Some(user) = user {
        request.user_id = Some(user.user_id);
        request.email = request.email.or(Some(user.email));
    }

    let session = recovery.save_session(request).await?;
    Ok(AppSuccessResponse::created(
        SaveSessionResponse {
            session_id: session.session_id,
            recovery_path: session.recovery_path(),
            expires_at: session.expires_at,
        },
        "Recovery session saved",
    ))
}

#[tracing::instrument(name = "Load Recovery Session", skip(recovery))]
#[get("/sessions/{session_id}")]
pub async fn get_session(
    recovery: web::Data<RecoveryService>,
    session_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let session = recovery
        .get_session(&session_id)
        .await?
        .ok_or_else(|| AppError::not_found("Recovery session not found or expired"))?;
    Ok(AppSuccessResponse::ok(session, "Recovery session retrieved"))
}

#[tracing::instrument(name = "Delete Recovery Session", skip(recovery))]
#[delete("/sessions/{session_id}")]
pub async fn delete_session(
    recovery: web::Data<RecoveryService>,
    session_id: web::Path<uuid::Uuid>,
) -> Result<HttpResponse, AppError> {
    recovery.delete_session(&session_id).await?;
    Ok(AppSuccessResponse::ok((), "Recovery session deleted"))
}

/// Manual repair from the subscription page, for the signed-in account only.
#[tracing::instrument(name = "Repair Unprocessed Payment", skip(recovery, user), fields(user_id = %user.user_id))]
#[post("/repair")]
pub async fn repair_payment(
    recovery: web::Data<RecoveryService>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let outcome = recovery
        .process_webhook(&user.email, Some(&user.user_id), false)
        .await?;
    Ok(AppSuccessResponse::ok(outcome, "Repair attempt finished"))
}

#[tracing::instrument(name = "Resolve Error Message", skip(query), fields(code = %query.code))]
#[get("/error-message")]
pub async fn error_message(query: web::Query<ErrorCodeQuery>) -> HttpResponse {
    let code = query.into_inner().code;
    AppSuccessResponse::ok(
        ErrorMessageResponse {
            category: map_error_code(&code),
            message: get_error_message(&code),
            transient: is_transient_error(&code),
            code,
        },
        "Error message resolved",
    )
}
