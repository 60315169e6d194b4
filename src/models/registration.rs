use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use crate::models::subscriptions::PlanType;

/// Plain-text password held only until the account is created.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct DraftPassword(String);

impl DraftPassword {
    pub fn new(password: impl Into<String>) -> Self {
        Self(password.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for DraftPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DraftPassword([REDACTED])")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    #[validate(length(min = 1, max = 80))]
    pub first_name: String,
    #[validate(length(min = 1, max = 80))]
    pub last_name: String,
    #[validate(length(min = 9, max = 20))]
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContractDetails {
    pub full_name: String,
    /// Data-URL of the drawn signature.
    pub signature: String,
    pub agreed_to_terms: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
}

/// Card metadata returned by tokenization. Never holds the card number itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentToken {
    pub last_four_digits: String,
    pub expiry_month: String,
    pub expiry_year: String,
    pub cardholder_name: String,
    pub token_created_at: DateTime<Utc>,
}

/// In-progress signup of a visitor who has no account yet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationDraft {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<DraftPassword>,
    #[serde(default)]
    pub user_data: UserData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,
    #[serde(default)]
    pub contract_signed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_signed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_details: Option<ContractDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_token: Option<PaymentToken>,
    #[serde(alias = "signupDate")]
    pub registration_time: DateTime<Utc>,
}

impl RegistrationDraft {
    pub fn new(email: String, registration_time: DateTime<Utc>) -> Self {
        Self {
            email,
            password: None,
            user_data: UserData::default(),
            plan_id: None,
            contract_signed: false,
            contract_signed_at: None,
            contract_details: None,
            payment_token: None,
            registration_time,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.registration_time > ttl
    }

    pub fn selected_plan(&self) -> Option<PlanType> {
        self.plan_id.as_deref().and_then(|id| id.parse().ok())
    }

    /// Contract evidence required before the payment step may render.
    pub fn has_signed_contract(&self) -> bool {
        self.contract_signed && self.contract_signed_at.is_some()
    }

    /// Copy safe to send back to the browser.
    pub fn redacted(mut self) -> Self {
        self.password = None;
        self
    }

    /// Shallow merge: every field present in the patch replaces the stored one.
    pub fn apply(&mut self, patch: DraftPatch) {
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(password) = patch.password {
            self.password = Some(password);
        }
        if let Some(user_data) = patch.user_data {
            self.user_data = user_data;
        }
        if let Some(plan_id) = patch.plan_id {
            self.plan_id = Some(plan_id);
        }
        if let Some(contract_signed) = patch.contract_signed {
            self.contract_signed = contract_signed;
        }
        if let Some(at) = patch.contract_signed_at {
            self.contract_signed_at = Some(at);
        }
        if let Some(details) = patch.contract_details {
            self.contract_details = Some(details);
        }
        if let Some(token) = patch.payment_token {
            self.payment_token = Some(token);
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftPatch {
    pub email: Option<String>,
    pub password: Option<DraftPassword>,
    pub user_data: Option<UserData>,
    pub plan_id: Option<String>,
    pub contract_signed: Option<bool>,
    pub contract_signed_at: Option<DateTime<Utc>>,
    pub contract_details: Option<ContractDetails>,
    pub payment_token: Option<PaymentToken>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StartRegistrationRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
    #[validate]
    pub user_data: UserData,
    pub plan_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRegistrationResponse {
    pub registration_id: String,
    pub draft: RegistrationDraft,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftResponse {
    pub draft: Option<RegistrationDraft>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<crate::models::wizard::DraftNotice>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignContractRequest {
    pub full_name: String,
    pub signature: String,
    pub agreed_to_terms: bool,
}
