pub mod payments;
pub mod recovery;
pub mod registration;
pub mod subscriptions;
pub mod wizard;
