use chrono::Duration;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::store::{self, KeyValueStore, StoreError};
use crate::core::{normalize_email, AppError, Clock};
use crate::models::recovery::{
    ErrorCategory, RecoverySession, RepairAttempt, RepairOutcome, SaveSessionRequest,
};
use crate::services::backend::BackendFunctions;

const SESSION_PREFIX: &str = "payment_recovery";
const REPAIR_COUNTER_PREFIX: &str = "repair_attempts";
const REPAIR_AUDIT_KEY: &str = "repair_audit";

/// Translates gateway-specific and generic codes into a closed category.
/// Anything unrecognised is `Unknown`; raw codes never reach the user.
pub fn map_error_code(code: &str) -> ErrorCategory {
    let normalized = code.trim().to_lowercase().replace(&['-', ' '][..], "_");
    match normalized.as_str() {
        "card_declined" | "declined" | "do_not_honor" | "card_blocked" | "stolen_card"
        | "001" | "002" | "003" | "004" | "006" => ErrorCategory::CardDeclined,
        "expired_card" | "card_expired" | "036" => ErrorCategory::ExpiredCard,
        "insufficient_funds" | "not_enough_credit" | "credit_limit_exceeded" => {
            ErrorCategory::InsufficientFunds
        }
        "invalid_card" | "invalid_card_number" | "incorrect_number" | "033" | "039" => {
            ErrorCategory::InvalidCardNumber
        }
        "rate_limit" | "rate_limited" | "too_many_requests" | "429" => ErrorCategory::RateLimit,
        "timeout" | "timed_out" | "etimedout" | "408" | "504" => ErrorCategory::Timeout,
        "network_error" | "network" | "failed_to_fetch" | "connection_refused" | "econnreset" => {
            ErrorCategory::NetworkError
        }
        "session_expired" | "low_profile_expired" | "invalid_session" | "session_not_found" => {
            ErrorCategory::SessionExpired
        }
        _ => ErrorCategory::Unknown,
    }
}

pub fn get_error_message(code: &str) -> String {
    map_error_code(code).message().to_string()
}

pub fn is_transient_error(code: &str) -> bool {
    map_error_code(code).is_transient()
}

/// Recovery sessions for interrupted payments plus the manual webhook repair.
pub struct RecoveryService {
    store: Arc<dyn KeyValueStore>,
    backend: Arc<dyn BackendFunctions>,
    clock: Arc<dyn Clock>,
    session_ttl: Duration,
    max_repair_attempts: u32,
}

impl RecoveryService {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        backend: Arc<dyn BackendFunctions>,
        clock: Arc<dyn Clock>,
        session_ttl: Duration,
        max_repair_attempts: u32,
    ) -> Self {
        Self {
            store,
            backend,
            clock,
            session_ttl,
            max_repair_attempts,
        }
    }

    pub fn max_repair_attempts(&self) -> u32 {
        self.max_repair_attempts
    }

    fn session_key(id: &Uuid) -> String {
        format!("{}:{}", SESSION_PREFIX, id)
    }

    fn counter_key(email: &str) -> String {
        format!("{}:{}", REPAIR_COUNTER_PREFIX, normalize_email(email))
    }

    #[tracing::instrument(name = "Save Recovery Session", skip(self, request))]
    pub async fn save_session(
        &self,
        request: SaveSessionRequest,
    ) -> Result<RecoverySession, StoreError> {
        let now = self.clock.now();
        let session = RecoverySession {
            session_id: Uuid::new_v4(),
            user_id: request.user_id,
            email: request.email.as_deref().map(normalize_email),
            plan_id: request.plan_id,
            payment_details: request.payment_details,
            error_category: request.error_category,
            created_at: now,
            expires_at: now + self.session_ttl,
        };
        store::set(
            self.store.as_ref(),
            &Self::session_key(&session.session_id),
            &session,
            self.session_ttl.to_std().ok(),
        )
        .await?;
        tracing::info!(session_id = %session.session_id, "recovery session saved");
        Ok(session)
    }

    /// `None` when the session never existed, was deleted, or has expired.
    pub async fn get_session(&self, id: &str) -> Result<Option<RecoverySession>, StoreError> {
        let Ok(id) = Uuid::parse_str(id.trim()) else {
            return Ok(None);
        };
        let key = Self::session_key(&id);
        let session: Option<RecoverySession> = store::get(self.store.as_ref(), &key).await?;

        match session {
            Some(session) if session.expires_at <= self.clock.now() => {
                self.store.delete(&key).await?;
                Ok(None)
            }
            other => Ok(other),
        }
    }

    pub async fn delete_session(&self, id: &Uuid) -> Result<(), StoreError> {
        self.store.delete(&Self::session_key(id)).await?;
        Ok(())
    }

    /// Opens a recovery session only for failures the user has to act on.
    pub async fn record_failure(
        &self,
        category: ErrorCategory,
        request: SaveSessionRequest,
    ) -> Result<Option<RecoverySession>, StoreError> {
        if !category.needs_recovery_session() {
            return Ok(None);
        }
        self.save_session(SaveSessionRequest {
            error_category: Some(category),
            ..request
        })
        .await
        .map(Some)
    }

    pub async fn repair_attempts(&self, email: &str) -> Result<u32, StoreError> {
        let attempts: Option<u32> =
            store::get(self.store.as_ref(), &Self::counter_key(email)).await?;
        Ok(attempts.map_or(0, |a| a.min(self.max_repair_attempts)))
    }

    pub async fn max_retries_reached(&self, email: &str) -> Result<bool, StoreError> {
        Ok(self.repair_attempts(email).await? >= self.max_repair_attempts)
    }

    /// Asks the backend to replay a payment webhook that never arrived.
    /// Each attempt is audited before the call; after the cap is reached the
    /// backend is no longer called.
    #[tracing::instrument(name = "Process Webhook Repair", skip(self))]
    pub async fn process_webhook(
        &self,
        email: &str,
        user_id: Option<&str>,
        automatic: bool,
    ) -> Result<RepairOutcome, AppError> {
        let email = normalize_email(email);
        let counter_key = Self::counter_key(&email);
        // Reserve the attempt before checking the cap so concurrent callers
        // can never exceed it between them.
        let reserved = self
            .store
            .incr(&counter_key, self.session_ttl.to_std().ok())
            .await?;
        let attempt_number = u32::try_from(reserved).unwrap_or(u32::MAX);

        if attempt_number > self.max_repair_attempts {
            tracing::warn!(attempts = self.max_repair_attempts, "repair attempts exhausted");
            return Ok(RepairOutcome {
                repaired: false,
                attempts: self.max_repair_attempts,
                max_retries_reached: true,
                message: "מספר הניסיונות המרבי הושג. אנא פנה לתמיכה".to_string(),
            });
        }

        let attempt = RepairAttempt {
            email: email.clone(),
            user_id: user_id.map(str::to_string),
            attempt: attempt_number,
            automatic,
            attempted_at: self.clock.now(),
        };
        store::lpush(self.store.as_ref(), REPAIR_AUDIT_KEY, &attempt).await?;
        tracing::info!(attempt = attempt_number, automatic, "replaying payment webhook");

        let result = self.backend.reprocess_webhook_by_email(&email).await;
        let repaired = matches!(result, Ok(ref r) if r.processed);

        if repaired {
            self.store.delete(&counter_key).await?;
        }

        let max_retries_reached = !repaired && attempt_number >= self.max_repair_attempts;
        let message = match (&result, repaired, max_retries_reached) {
            (_, true, _) => "התשלום עובד בהצלחה והמנוי עודכן".to_string(),
            (_, false, true) => "מספר הניסיונות המרבי הושג. אנא פנה לתמיכה".to_string(),
            (Err(e), false, false) => e.user_message(),
            (Ok(r), false, false) => r
                .message
                .clone()
                .unwrap_or_else(|| "לא נמצא תשלום לעיבוד. נסה שוב בעוד מספר דקות".to_string()),
        };

        Ok(RepairOutcome {
            repaired,
            attempts: if repaired { 0 } else { attempt_number },
            max_retries_reached,
            message,
        })
    }

    pub async fn repair_audit(&self) -> Result<Vec<RepairAttempt>, StoreError> {
        store::lrange(self.store.as_ref(), REPAIR_AUDIT_KEY).await
    }
}
