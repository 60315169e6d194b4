use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::time::Instant;

use crate::core::{AppError, AuthenticatedUser, Clock};
use crate::models::subscriptions::Subscription;
use crate::services::backend::BackendFunctions;
use crate::services::pending_payments::{PaymentOwner, PendingPaymentStore};
use crate::services::recovery::RecoveryService;

/// How long a status request waits for the subscription before answering
/// with a loading panel.
const RESPONSE_WINDOW: Duration = Duration::from_millis(1500);

/// A finished lookup nobody collected within this long is dropped, and the
/// next request starts a fresh one.
const UNCLAIMED_RESULT_TTL: Duration = Duration::from_secs(30);

const CRITICAL_MESSAGE: &str = "לא הצלחנו לטעון את פרטי המנוי. אנא רענן את הדף או פנה לתמיכה";
const TIMEOUT_MESSAGE: &str = "טעינת פרטי המנוי אורכת זמן רב מהרגיל";
const MAX_RETRIES_MESSAGE: &str = "מספר הניסיונות המרבי הושג. אנא פנה לתמיכה";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubscriptionViewInputs {
    pub subscription_loading: bool,
    pub critical_error: bool,
    pub loading_timeout: bool,
    pub max_retries_reached: bool,
    pub check_error: Option<String>,
    pub retry_count: u32,
    pub has_unprocessed_payment: bool,
    pub subscription: Option<Subscription>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DetailsTab {
    Details,
    Contract,
    Documents,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "panel", rename_all = "camelCase")]
pub enum SubscriptionPanel {
    #[serde(rename_all = "camelCase")]
    CriticalError { message: String },
    #[serde(rename_all = "camelCase")]
    TimeoutWarning { message: String },
    #[serde(rename_all = "camelCase")]
    MaxRetries { message: String, retry_count: u32 },
    #[serde(rename_all = "camelCase")]
    Loading { show_repair_tool: bool },
    #[serde(rename_all = "camelCase")]
    UnprocessedPayment { retry_count: u32 },
    NoSubscription,
    #[serde(rename_all = "camelCase")]
    Details {
        subscription: Subscription,
        days_remaining: Option<i64>,
        tabs: Vec<DetailsTab>,
    },
}

/// Picks the one panel to render. The order is fixed: a definitive critical
/// error must never be hidden behind a stale timeout or retry flag.
pub fn select_panel(inputs: &SubscriptionViewInputs, now: DateTime<Utc>) -> SubscriptionPanel {
    if inputs.critical_error {
        return SubscriptionPanel::CriticalError {
            message: inputs
                .check_error
                .clone()
                .unwrap_or_else(|| CRITICAL_MESSAGE.to_string()),
        };
    }
    if inputs.loading_timeout {
        return SubscriptionPanel::TimeoutWarning {
            message: TIMEOUT_MESSAGE.to_string(),
        };
    }
    if inputs.max_retries_reached {
        return SubscriptionPanel::MaxRetries {
            message: MAX_RETRIES_MESSAGE.to_string(),
            retry_count: inputs.retry_count,
        };
    }
    if inputs.subscription_loading {
        return SubscriptionPanel::Loading {
            show_repair_tool: inputs.check_error.is_some() || inputs.retry_count > 0,
        };
    }
    if inputs.has_unprocessed_payment {
        return SubscriptionPanel::UnprocessedPayment {
            retry_count: inputs.retry_count,
        };
    }
    match &inputs.subscription {
        None => SubscriptionPanel::NoSubscription,
        Some(subscription) => SubscriptionPanel::Details {
            days_remaining: subscription.days_remaining(now),
            subscription: subscription.clone(),
            tabs: vec![DetailsTab::Details, DetailsTab::Contract, DetailsTab::Documents],
        },
    }
}

/// Advisory flags raised while a load keeps running; neither cancels it.
#[derive(Debug, Clone, Copy)]
pub struct LoadingEscalation {
    pub soft: Duration,
    pub hard: Duration,
}

impl Default for LoadingEscalation {
    fn default() -> Self {
        Self {
            soft: Duration::from_secs(10),
            hard: Duration::from_secs(25),
        }
    }
}

impl LoadingEscalation {
    /// `(loading_timeout, critical_error)` after `elapsed` of loading.
    pub fn flags(&self, elapsed: Duration) -> (bool, bool) {
        (elapsed >= self.soft, elapsed >= self.hard)
    }
}

type LoadResult = Result<Option<Subscription>, String>;

#[derive(Clone)]
struct FinishedLoad {
    result: LoadResult,
    at: Instant,
}

struct InFlightLoad {
    started: Instant,
    result: watch::Receiver<Option<FinishedLoad>>,
}

impl InFlightLoad {
    fn is_unclaimed(&self) -> bool {
        self.result
            .borrow()
            .as_ref()
            .map_or(false, |done| done.at.elapsed() >= UNCLAIMED_RESULT_TTL)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatusView {
    #[serde(flatten)]
    pub panel: SubscriptionPanel,
    pub repair_attempts: u32,
    pub max_repair_attempts: u32,
}

/// Builds the selector inputs for a signed-in user. A slow subscription
/// lookup keeps running in the background while repeated status requests
/// report how long it has been loading.
pub struct SubscriptionStatusService {
    backend: Arc<dyn BackendFunctions>,
    pending: PendingPaymentStore,
    recovery: Arc<RecoveryService>,
    clock: Arc<dyn Clock>,
    escalation: LoadingEscalation,
    loads: Mutex<HashMap<String, InFlightLoad>>,
}

impl SubscriptionStatusService {
    pub fn new(
        backend: Arc<dyn BackendFunctions>,
        pending: PendingPaymentStore,
        recovery: Arc<RecoveryService>,
        clock: Arc<dyn Clock>,
        escalation: LoadingEscalation,
    ) -> Self {
        Self {
            backend,
            pending,
            recovery,
            clock,
            escalation,
            loads: Mutex::new(HashMap::new()),
        }
    }

    fn spawn_load(&self, user_id: &str) -> InFlightLoad {
        let (tx, rx) = watch::channel(None);
        let backend = self.backend.clone();
        let user_id = user_id.to_string();
        tokio::spawn(async move {
            let result = backend
                .get_subscription(&user_id)
                .await
                .map_err(|e| e.user_message());
            let _ = tx.send(Some(FinishedLoad {
                result,
                at: Instant::now(),
            }));
        });
        InFlightLoad {
            started: Instant::now(),
            result: rx,
        }
    }

    /// Waits up to the response window for the user's load, starting one if
    /// none is running. `Err(elapsed)` while it is still loading.
    async fn await_load(&self, user_id: &str) -> Result<LoadResult, Duration> {
        let (started, mut rx) = {
            let mut loads = self.loads.lock().await;
            loads.retain(|_, load| !load.is_unclaimed());
            let load = match loads.remove(user_id) {
                Some(load) => load,
                None => self.spawn_load(user_id),
            };
            let handle = (load.started, load.result.clone());
            loads.insert(user_id.to_string(), load);
            handle
        };

        let waited = tokio::time::timeout(RESPONSE_WINDOW, async {
            loop {
                let current = rx.borrow().clone();
                if let Some(done) = current {
                    return done.result;
                }
                if rx.changed().await.is_err() {
                    return Err("subscription lookup was interrupted".to_string());
                }
            }
        })
        .await;

        match waited {
            Ok(result) => {
                self.loads.lock().await.remove(user_id);
                Ok(result)
            }
            Err(_) => Err(started.elapsed()),
        }
    }

    #[tracing::instrument(name = "Resolve Subscription Status", skip(self, user), fields(user_id = %user.user_id))]
    pub async fn status(&self, user: &AuthenticatedUser) -> Result<SubscriptionStatusView, AppError> {
        let mut inputs = SubscriptionViewInputs::default();
        let max_repair_attempts = self.recovery.max_repair_attempts();

        match self.await_load(&user.user_id).await {
            Err(elapsed) => {
                let (loading_timeout, critical_error) = self.escalation.flags(elapsed);
                if critical_error {
                    tracing::error!(elapsed_ms = elapsed.as_millis() as u64, "subscription load exceeded hard budget");
                }
                inputs.subscription_loading = true;
                inputs.loading_timeout = loading_timeout;
                inputs.critical_error = critical_error;
                inputs.retry_count = self.recovery.repair_attempts(&user.email).await?;
            }
            Ok(Err(message)) => {
                tracing::warn!(%message, "subscription lookup failed");
                inputs.critical_error = true;
                inputs.check_error = Some(message);
            }
            Ok(Ok(subscription)) => {
                inputs.subscription = subscription;
                self.reconcile(user, &mut inputs).await?;
            }
        }

        let panel = select_panel(&inputs, self.clock.now());
        Ok(SubscriptionStatusView {
            panel,
            repair_attempts: inputs.retry_count,
            max_repair_attempts,
        })
    }

    /// A started payment with no access-granting subscription means the
    /// gateway notification was probably lost. Replays it while under the cap.
    async fn reconcile(
        &self,
        user: &AuthenticatedUser,
        inputs: &mut SubscriptionViewInputs,
    ) -> Result<(), AppError> {
        let owner = PaymentOwner::User(user.user_id.clone());
        let has_access = inputs
            .subscription
            .as_ref()
            .map_or(false, |s| s.status.grants_access());
        if has_access {
            self.pending.clear(&owner).await?;
            return Ok(());
        }

        self.pending
            .claim_guest_payment(&user.email, &user.user_id)
            .await?;
        let Some(pending) = self.pending.find(&owner).await? else {
            return Ok(());
        };
        let email = pending.email.unwrap_or_else(|| user.email.clone());
        inputs.has_unprocessed_payment = true;

        if self.recovery.max_retries_reached(&email).await? {
            inputs.max_retries_reached = true;
            inputs.retry_count = self.recovery.repair_attempts(&email).await?;
            return Ok(());
        }

        let outcome = self
            .recovery
            .process_webhook(&email, Some(&user.user_id), true)
            .await?;
        inputs.retry_count = outcome.attempts;
        inputs.max_retries_reached = outcome.max_retries_reached;

        if outcome.repaired {
            inputs.has_unprocessed_payment = false;
            inputs.subscription = self.backend.get_subscription(&user.user_id).await?;
            self.pending.clear(&owner).await?;
        }
        Ok(())
    }
}
