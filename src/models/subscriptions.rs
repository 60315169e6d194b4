use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PlanType {
    Monthly,
    Annual,
    Vip,
}

impl PlanType {
    pub const ALL: [PlanType; 3] = [PlanType::Monthly, PlanType::Annual, PlanType::Vip];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanType::Monthly => "monthly",
            PlanType::Annual => "annual",
            PlanType::Vip => "vip",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PlanType::Monthly => "מנוי חודשי",
            PlanType::Annual => "מנוי שנתי",
            PlanType::Vip => "מנוי VIP",
        }
    }

    /// Only the monthly plan starts with a free trial.
    pub fn trial_period(&self) -> Option<Duration> {
        match self {
            PlanType::Monthly => Some(Duration::days(30)),
            PlanType::Annual | PlanType::Vip => None,
        }
    }

    pub fn billing_period(&self) -> Duration {
        match self {
            PlanType::Monthly => Duration::days(30),
            PlanType::Annual => Duration::days(365),
            PlanType::Vip => Duration::days(365),
        }
    }
}

/// What the plan-selection step shows for each plan.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanSummary {
    pub id: PlanType,
    pub display_name: &'static str,
    pub trial_days: Option<i64>,
    pub billing_days: i64,
}

impl From<PlanType> for PlanSummary {
    fn from(plan: PlanType) -> Self {
        Self {
            id: plan,
            display_name: plan.display_name(),
            trial_days: plan.trial_period().map(|d| d.num_days()),
            billing_days: plan.billing_period().num_days(),
        }
    }
}

impl FromStr for PlanType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "monthly" => Ok(PlanType::Monthly),
            "annual" | "yearly" => Ok(PlanType::Annual),
            "vip" => Ok(PlanType::Vip),
            other => Err(format!("Invalid plan: {}", other)),
        }
    }
}

impl fmt::Display for PlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Trial,
    Active,
    Cancelled,
    Expired,
}

impl SubscriptionStatus {
    pub fn grants_access(&self) -> bool {
        matches!(self, SubscriptionStatus::Trial | SubscriptionStatus::Active)
    }
}

/// Subscription row owned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Subscription {
    pub user_id: String,
    pub plan_type: PlanType,
    pub status: SubscriptionStatus,
    #[serde(default)]
    pub trial_ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub current_period_ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub payment_method: Option<serde_json::Value>,
    #[serde(default)]
    pub contract_signed: bool,
    #[serde(default)]
    pub contract_signed_at: Option<DateTime<Utc>>,
}

impl Subscription {
    pub fn days_remaining(&self, now: DateTime<Utc>) -> Option<i64> {
        let ends_at = match self.status {
            SubscriptionStatus::Trial => self.trial_ends_at,
            _ => self.current_period_ends_at,
        }?;
        Some((ends_at - now).num_days().max(0))
    }
}

/// Body sent to the backend to create or update the user's subscription row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionUpsert {
    pub user_id: String,
    pub plan_type: PlanType,
    pub status: SubscriptionStatus,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub current_period_ends_at: DateTime<Utc>,
    pub payment_method: serde_json::Value,
    pub contract_signed: bool,
    pub contract_signed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionDocument {
    pub id: String,
    pub document_type: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateDocumentRequest {
    pub document_type: String,
}

#[derive(Debug, Deserialize)]
pub struct CancelSubscriptionRequest {
    pub reason: Option<String>,
}
