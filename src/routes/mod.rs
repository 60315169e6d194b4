use actix_web::web::{scope, ServiceConfig};
use actix_web::Scope;
use payments::{
    cancel_payment, field_validations, initialize_payment, payment_progress, relay_message,
    retry_payment, submit_payment,
};
use recovery::{delete_session, error_message, get_session, repair_payment, save_session};
use subscribe::{
    clear_registration, get_registration, list_plans, resolve_wizard, sign_contract,
    start_registration, update_registration,
};
use subscriptions::{cancel_subscription, generate_document, get_subscription_status, list_documents};
mod health_check;
mod payments;
mod recovery;
mod subscribe;
mod subscriptions;

use crate::routes::health_check::*;

fn subscribe_routes() -> Scope {
    scope("subscribe")
        .service(list_plans)
        .service(resolve_wizard)
        .service(start_registration)
        .service(get_registration)
        .service(update_registration)
        .service(clear_registration)
        .service(sign_contract)
}

fn payments_routes() -> Scope {
    scope("payments")
        .service(initialize_payment)
        .service(submit_payment)
        .service(relay_message)
        .service(payment_progress)
        .service(field_validations)
        .service(cancel_payment)
        .service(retry_payment)
}

fn recovery_routes() -> Scope {
    scope("recovery")
        .service(save_session)
        .service(get_session)
        .service(delete_session)
        .service(repair_payment)
        .service(error_message)
}

fn subscriptions_routes() -> Scope {
    scope("subscriptions")
        .service(get_subscription_status)
        .service(cancel_subscription)
        .service(list_documents)
        .service(generate_document)
}

pub fn billing_routes(conf: &mut ServiceConfig) {
    conf.service(
        scope("api/v1")
            .service(health_check)
            .service(subscribe_routes())
            .service(payments_routes())
            .service(recovery_routes())
            .service(subscriptions_routes()),
    );
}
