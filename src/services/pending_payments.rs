use std::sync::Arc;
use std::time::Duration;

use crate::core::normalize_email;
use crate::core::store::{self, KeyValueStore, StoreError};
use crate::models::payments::PendingPayment;

const PENDING_PREFIX: &str = "payment_pending";
const TEMP_REGISTRATION_PREFIX: &str = "temp_registration_id";

const PENDING_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);
const TEMP_REGISTRATION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Who an in-flight payment belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOwner {
    User(String),
    Registration(String),
}

impl PaymentOwner {
    fn key(&self) -> String {
        match self {
            PaymentOwner::User(id) => format!("{}:user:{}", PENDING_PREFIX, id),
            PaymentOwner::Registration(id) => format!("{}:reg:{}", PENDING_PREFIX, id),
        }
    }
}

/// Bookkeeping that lets a reload, or the subscription page, recognise a
/// payment that was started but never reconciled.
#[derive(Clone)]
pub struct PendingPaymentStore {
    store: Arc<dyn KeyValueStore>,
}

impl PendingPaymentStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn record(
        &self,
        owner: &PaymentOwner,
        pending: &PendingPayment,
    ) -> Result<(), StoreError> {
        store::set(self.store.as_ref(), &owner.key(), pending, Some(PENDING_TTL)).await
    }

    pub async fn find(&self, owner: &PaymentOwner) -> Result<Option<PendingPayment>, StoreError> {
        store::get(self.store.as_ref(), &owner.key()).await
    }

    pub async fn clear(&self, owner: &PaymentOwner) -> Result<(), StoreError> {
        self.store.delete(&owner.key()).await?;
        Ok(())
    }

    /// Moves a guest's pending payment onto the account created for them.
    pub async fn transfer(
        &self,
        from: &PaymentOwner,
        to: &PaymentOwner,
    ) -> Result<bool, StoreError> {
        let Some(pending) = self.find(from).await? else {
            return Ok(false);
        };
        self.record(to, &pending).await?;
        self.clear(from).await?;
        Ok(true)
    }

    /// A guest who paid before their account existed signs in later with the
    /// same email: their pending payment becomes the account's.
    pub async fn claim_guest_payment(
        &self,
        email: &str,
        user_id: &str,
    ) -> Result<bool, StoreError> {
        let Some(registration_id) = self.registration_for(email).await? else {
            return Ok(false);
        };
        let moved = self
            .transfer(
                &PaymentOwner::Registration(registration_id),
                &PaymentOwner::User(user_id.to_string()),
            )
            .await?;
        self.store.delete(&Self::temp_registration_key(email)).await?;
        if moved {
            tracing::info!(user_id, "guest payment claimed by new account");
        }
        Ok(moved)
    }

    fn temp_registration_key(email: &str) -> String {
        format!("{}:{}", TEMP_REGISTRATION_PREFIX, normalize_email(email))
    }

    /// Remembers which draft a paying email belongs to, for the registration page.
    pub async fn remember_registration(
        &self,
        email: &str,
        registration_id: &str,
    ) -> Result<(), StoreError> {
        store::set(
            self.store.as_ref(),
            &Self::temp_registration_key(email),
            &registration_id.to_string(),
            Some(TEMP_REGISTRATION_TTL),
        )
        .await
    }

    pub async fn registration_for(&self, email: &str) -> Result<Option<String>, StoreError> {
        store::get(self.store.as_ref(), &Self::temp_registration_key(email)).await
    }
}
