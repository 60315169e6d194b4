use actix_web::{get, post, web, HttpResponse};

use crate::core::{AppError, AppSuccessResponse, AuthenticatedUser};
use crate::models::subscriptions::{CancelSubscriptionRequest, GenerateDocumentRequest};
use crate::services::{BackendFunctions, SubscriptionStatusService};

#[tracing::instrument(name = "Get Subscription Status", skip(status, user), fields(user_id = %user.user_id))]
#[get("/status")]
pub async fn get_subscription_status(
    status: web::Data<SubscriptionStatusService>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let view = status.status(&user).await?;
    Ok(AppSuccessResponse::ok(view, "Subscription status retrieved"))
}

#[tracing::instrument(name = "Cancel Subscription", skip(backend, user, payload), fields(user_id = %user.user_id))]
#[post("/cancel")]
pub async fn cancel_subscription(
    backend: web::Data<dyn BackendFunctions>,
    user: AuthenticatedUser,
    payload: web::Json<CancelSubscriptionRequest>,
) -> Result<HttpResponse, AppError> {
    let subscription = backend
        .cancel_subscription(&user.user_id, payload.reason.as_deref())
        .await?;
    Ok(AppSuccessResponse::ok(subscription, "Subscription cancelled"))
}

#[tracing::instrument(name = "List Subscription Documents", skip(backend, user), fields(user_id = %user.user_id))]
#[get("/documents")]
pub async fn list_documents(
    backend: web::Data<dyn BackendFunctions>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let documents = backend.list_documents(&user.user_id).await?;
    Ok(AppSuccessResponse::ok(documents, "Documents retrieved"))
}

#[tracing::instrument(name = "Generate Subscription Document", skip(backend, user, payload), fields(user_id = %user.user_id))]
#[post("/documents")]
pub async fn generate_document(
    backend: web::Data<dyn BackendFunctions>,
    user: AuthenticatedUser,
    payload: web::Json<GenerateDocumentRequest>,
) -> Result<HttpResponse, AppError> {
    if payload.document_type.trim().is_empty() {
        return Err(AppError::bad_request("Document type is required"));
    }
    let document = backend
        .generate_document(&user.user_id, &payload.document_type)
        .await?;
    Ok(AppSuccessResponse::created(document, "Document generated"))
}
