use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// User-facing failure categories. Raw gateway codes never reach the user.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    CardDeclined,
    ExpiredCard,
    InsufficientFunds,
    InvalidCardNumber,
    RateLimit,
    Timeout,
    NetworkError,
    SessionExpired,
    Unknown,
}

impl ErrorCategory {
    pub const ALL: [ErrorCategory; 9] = [
        ErrorCategory::CardDeclined,
        ErrorCategory::ExpiredCard,
        ErrorCategory::InsufficientFunds,
        ErrorCategory::InvalidCardNumber,
        ErrorCategory::RateLimit,
        ErrorCategory::Timeout,
        ErrorCategory::NetworkError,
        ErrorCategory::SessionExpired,
        ErrorCategory::Unknown,
    ];

    pub fn message(&self) -> &'static str {
        match self {
            ErrorCategory::CardDeclined => "הכרטיס נדחה. אנא נסה כרטיס אחר או פנה לחברת האשראי",
            ErrorCategory::ExpiredCard => "תוקף הכרטיס פג. אנא השתמש בכרטיס בתוקף",
            ErrorCategory::InsufficientFunds => "אין מספיק מסגרת אשראי בכרטיס. אנא נסה כרטיס אחר",
            ErrorCategory::InvalidCardNumber => "מספר הכרטיס שגוי. אנא בדוק את הפרטים ונסה שוב",
            ErrorCategory::RateLimit => "בוצעו יותר מדי ניסיונות. אנא המתן מספר דקות ונסה שוב",
            ErrorCategory::Timeout => "הפעולה ארכה זמן רב מדי. אנא נסה שוב",
            ErrorCategory::NetworkError => "שגיאת תקשורת. אנא בדוק את החיבור לאינטרנט ונסה שוב",
            ErrorCategory::SessionExpired => "פג תוקף תהליך התשלום. אנא התחל את התהליך מחדש",
            ErrorCategory::Unknown => "אירעה שגיאה בלתי צפויה. אנא נסה שוב או פנה לתמיכה",
        }
    }

    /// Retry-safe without asking the user to change anything.
    pub fn is_transient(&self) -> bool {
        matches!(self, ErrorCategory::Timeout | ErrorCategory::NetworkError)
    }

    /// Errors that need the user to act, e.g. replace the card.
    pub fn needs_recovery_session(&self) -> bool {
        !self.is_transient() && *self != ErrorCategory::RateLimit
    }
}

/// Server-held snapshot of an interrupted payment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecoverySession {
    pub session_id: Uuid,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub plan_id: String,
    #[serde(default)]
    pub payment_details: serde_json::Value,
    #[serde(default)]
    pub error_category: Option<ErrorCategory>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl RecoverySession {
    pub fn recovery_path(&self) -> String {
        format!("/subscription?recover={}", self.session_id)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SaveSessionRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[validate(email)]
    #[serde(default)]
    pub email: Option<String>,
    #[validate(length(min = 1))]
    pub plan_id: String,
    #[serde(default)]
    pub payment_details: serde_json::Value,
    #[serde(default)]
    pub error_category: Option<ErrorCategory>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSessionResponse {
    pub session_id: Uuid,
    pub recovery_path: String,
    pub expires_at: DateTime<Utc>,
}

/// Audit record written before every webhook replay.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RepairAttempt {
    pub email: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub attempt: u32,
    pub automatic: bool,
    pub attempted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RepairOutcome {
    pub repaired: bool,
    pub attempts: u32,
    pub max_retries_reached: bool,
    pub message: String,
}
