use chrono::Duration;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::store::{self, KeyValueStore, StoreError};
use crate::core::Clock;
use crate::models::registration::{ContractDetails, DraftPatch, RegistrationDraft};

const DRAFT_PREFIX: &str = "registration_data";

/// What a page finds when it looks for the visitor's draft.
#[derive(Debug, Clone, PartialEq)]
pub enum DraftLookup {
    Active(RegistrationDraft),
    /// Found but older than the TTL; it has already been deleted.
    Expired,
    Missing,
}

impl DraftLookup {
    pub fn into_active(self) -> Option<RegistrationDraft> {
        match self {
            DraftLookup::Active(draft) => Some(draft),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    #[error("a plan must be selected before the contract is signed")]
    PlanNotSelected,
    #[error("the terms must be accepted")]
    TermsNotAccepted,
    #[error("a signature is required")]
    MissingSignature,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Single source of truth for everything needed to create the account
/// after payment. Drafts are keyed by registration id.
#[derive(Clone)]
pub struct RegistrationDraftStore {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl RegistrationDraftStore {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self { store, clock, ttl }
    }

    fn key(registration_id: &str) -> String {
        format!("{}:{}", DRAFT_PREFIX, registration_id)
    }

    fn store_expiry(&self) -> Option<std::time::Duration> {
        // Keep the record a little past the TTL so an expired draft can still
        // be reported as expired rather than missing.
        (self.ttl * 2).to_std().ok()
    }

    pub async fn create(&self, mut draft: RegistrationDraft) -> Result<String, StoreError> {
        let registration_id = Uuid::new_v4().to_string();
        draft.registration_time = self.clock.now();
        store::set(
            self.store.as_ref(),
            &Self::key(&registration_id),
            &draft,
            self.store_expiry(),
        )
        .await?;
        tracing::info!(registration_id = %registration_id, "registration draft created");
        Ok(registration_id)
    }

    /// Absence is a normal outcome; guests may pay first and register later.
    pub async fn load(&self, registration_id: &str) -> Result<DraftLookup, StoreError> {
        let key = Self::key(registration_id);
        let draft: Option<RegistrationDraft> = store::get(self.store.as_ref(), &key).await?;

        match draft {
            None => Ok(DraftLookup::Missing),
            Some(draft) if draft.is_expired(self.clock.now(), self.ttl) => {
                tracing::info!(registration_id, "discarding expired registration draft");
                self.store.delete(&key).await?;
                Ok(DraftLookup::Expired)
            }
            Some(draft) => Ok(DraftLookup::Active(draft)),
        }
    }

    /// Merges the patch into the active draft and persists the result.
    pub async fn update(
        &self,
        registration_id: &str,
        patch: DraftPatch,
    ) -> Result<DraftLookup, StoreError> {
        let mut draft = match self.load(registration_id).await? {
            DraftLookup::Active(draft) => draft,
            other => return Ok(other),
        };
        draft.apply(patch);
        self.save(registration_id, &draft).await?;
        Ok(DraftLookup::Active(draft))
    }

    /// Restarts the TTL of a draft whose payment is still in flight, so the
    /// account can be created from it when the charge completes.
    pub async fn keep_alive(&self, registration_id: &str) -> Result<DraftLookup, StoreError> {
        let mut draft = match self.load(registration_id).await? {
            DraftLookup::Active(draft) => draft,
            other => return Ok(other),
        };
        draft.registration_time = self.clock.now();
        self.save(registration_id, &draft).await?;
        Ok(DraftLookup::Active(draft))
    }

    async fn save(&self, registration_id: &str, draft: &RegistrationDraft) -> Result<(), StoreError> {
        store::set(
            self.store.as_ref(),
            &Self::key(registration_id),
            draft,
            self.store_expiry(),
        )
        .await
    }

    pub async fn clear(&self, registration_id: &str) -> Result<(), StoreError> {
        self.store.delete(&Self::key(registration_id)).await?;
        Ok(())
    }

    /// Records the signed contract. Requires a valid plan on the draft.
    #[tracing::instrument(name = "Sign Registration Contract", skip(self, details))]
    pub async fn sign_contract(
        &self,
        registration_id: &str,
        details: ContractDetails,
    ) -> Result<DraftLookup, ContractError> {
        if !details.agreed_to_terms {
            return Err(ContractError::TermsNotAccepted);
        }
        if details.signature.trim().is_empty() || details.full_name.trim().is_empty() {
            return Err(ContractError::MissingSignature);
        }

        let draft = match self.load(registration_id).await? {
            DraftLookup::Active(draft) => draft,
            other => return Ok(other),
        };
        if draft.selected_plan().is_none() {
            return Err(ContractError::PlanNotSelected);
        }

        let patch = DraftPatch {
            contract_signed: Some(true),
            contract_signed_at: Some(self.clock.now()),
            contract_details: Some(details),
            ..DraftPatch::default()
        };
        Ok(self.update(registration_id, patch).await?)
    }
}
