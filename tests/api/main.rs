mod helpers;
mod payments;
mod recovery;
mod subscribe;
mod subscriptions;
