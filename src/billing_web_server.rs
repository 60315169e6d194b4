use actix_cors::Cors;
use actix_web::http::header;
use actix_web::web::{Data, ServiceConfig};
use actix_web::{dev::Server, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;

use crate::core::config::JwtAuthConfig;
use crate::core::{AppConfig, Clock, KeyValueStore, RedisStore, SystemClock};
use crate::jobs::start_flow_eviction_job;
use crate::routes::billing_routes;
use crate::services::completion::PaymentCompletionHandler;
use crate::services::subscription_view::LoadingEscalation;
use crate::services::{
    BackendFunctions, HttpBackendClient, PaymentSessionAdapter, PendingPaymentStore,
    RecoveryService, RegistrationDraftStore, SubscriptionActivator, SubscriptionStatusService,
    WizardService,
};

/// Every service the handlers extract, wired once per process.
#[derive(Clone)]
pub struct BillingServices {
    drafts: Data<RegistrationDraftStore>,
    wizard: Data<WizardService>,
    payments: Data<PaymentSessionAdapter>,
    recovery: Data<RecoveryService>,
    status: Data<SubscriptionStatusService>,
    backend: Data<dyn BackendFunctions>,
    clock: Data<dyn Clock>,
    jwt_auth: Data<JwtAuthConfig>,
}

impl BillingServices {
    pub fn new(
        configuration: &AppConfig,
        store: Arc<dyn KeyValueStore>,
        backend: Arc<dyn BackendFunctions>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let drafts = RegistrationDraftStore::new(
            store.clone(),
            clock.clone(),
            chrono::Duration::minutes(configuration.registration.draft_ttl_minutes),
        );
        let pending = PendingPaymentStore::new(store.clone());
        let recovery = Arc::new(RecoveryService::new(
            store,
            backend.clone(),
            clock.clone(),
            chrono::Duration::hours(configuration.recovery.session_ttl_hours),
            configuration.recovery.max_repair_attempts,
        ));
        let completion: Arc<dyn PaymentCompletionHandler> = Arc::new(SubscriptionActivator::new(
            backend.clone(),
            drafts.clone(),
            pending.clone(),
            clock.clone(),
        ));
        let payments = PaymentSessionAdapter::new(
            backend.clone(),
            drafts.clone(),
            pending.clone(),
            recovery.clone(),
            completion,
            clock.clone(),
            configuration.gateway.clone(),
            configuration.payments.clone(),
        );
        let status = SubscriptionStatusService::new(
            backend.clone(),
            pending,
            recovery.clone(),
            clock.clone(),
            LoadingEscalation::default(),
        );
        let wizard = WizardService::new(drafts.clone(), recovery.clone(), backend.clone());

        Self {
            drafts: Data::new(drafts),
            wizard: Data::new(wizard),
            payments: Data::new(payments),
            recovery: Data::from(recovery),
            status: Data::new(status),
            backend: Data::from(backend),
            clock: Data::from(clock),
            jwt_auth: Data::new(configuration.jwt_auth_config.clone()),
        }
    }

    /// Registers the shared state and every route on an app.
    pub fn configure(&self, conf: &mut ServiceConfig) {
        conf.app_data(self.drafts.clone())
            .app_data(self.wizard.clone())
            .app_data(self.payments.clone())
            .app_data(self.recovery.clone())
            .app_data(self.status.clone())
            .app_data(self.backend.clone())
            .app_data(self.clock.clone())
            .app_data(self.jwt_auth.clone())
            .configure(billing_routes);
    }

    pub fn payments(&self) -> Arc<PaymentSessionAdapter> {
        self.payments.clone().into_inner()
    }
}

pub struct BillingWebServer {
    port: u16,
    server: Server,
}

impl BillingWebServer {
    pub async fn build(configuration: AppConfig) -> Result<Self, anyhow::Error> {
        let address = format!(
            "{}:{}",
            configuration.server.host, configuration.server.port
        );

        let store: Arc<dyn KeyValueStore> =
            Arc::new(RedisStore::new(configuration.redis.connect()?));
        let backend: Arc<dyn BackendFunctions> =
            Arc::new(HttpBackendClient::new(&configuration.backend)?);
        let services = BillingServices::new(&configuration, store, backend, Arc::new(SystemClock));
        start_flow_eviction_job(
            services.payments(),
            configuration.payments.eviction_interval(),
        );

        let listener = TcpListener::bind(address)?;
        let port = listener.local_addr()?.port();

        let server = run(listener, services)?;

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub fn run(listener: TcpListener, services: BillingServices) -> Result<Server, anyhow::Error> {
    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allowed_headers(vec![
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                header::ACCEPT,
            ]);
        App::new()
            .wrap(TracingLogger::default())
            .wrap(cors)
            .configure(|conf| services.configure(conf))
    })
    .listen(listener)?
    .run();

    Ok(server)
}
