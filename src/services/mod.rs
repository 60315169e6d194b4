pub mod backend;
pub mod completion;
pub mod frame_channel;
pub mod payment_session;
pub mod pending_payments;
pub mod recovery;
pub mod registration_store;
pub mod subscription_view;
pub mod wizard;

#[cfg(test)]
pub(crate) mod test_support;

pub use backend::{BackendFunctions, HttpBackendClient};
pub use completion::{PaymentCompletionHandler, SubscriptionActivator};
pub use payment_session::PaymentSessionAdapter;
pub use pending_payments::PendingPaymentStore;
pub use recovery::RecoveryService;
pub use registration_store::RegistrationDraftStore;
pub use subscription_view::SubscriptionStatusService;
pub use wizard::WizardService;
