use std::fmt::{Debug, Display};

use journal_billing::billing_web_server::BillingWebServer;
use journal_billing::core::{get_subscriber, init_subscriber, AppConfig};
use tokio::task::JoinError;

use colored::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let file_appender = tracing_appender::rolling::daily("/var/tmp/log/journal_billing", "app");

    let subscriber = get_subscriber("journal_billing".into(), "info".into(), file_appender);
    init_subscriber(subscriber)?;

    let config = AppConfig::new()?;

    let billing_web_server = BillingWebServer::build(config.clone()).await?;
    let port = billing_web_server.port();

    let server_task = tokio::spawn(billing_web_server.run_until_stopped());

    println!("{}", "-----------------------------------------".green());
    println!("🚀 Server started on Addr: {}:{}", config.server.host, port);
    println!("{}", "-----------------------------------------".green());

    tokio::select! {
        outcome = server_task => report_exit("billing web server", outcome),
    }
    Ok(())
}

fn report_exit(task_name: &str, outcome: Result<Result<(), impl Debug + Display>, JoinError>) {
    match outcome {
        Ok(Ok(())) => {
            tracing::info!("{} has exited", task_name)
        }
        Ok(Err(e)) => {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                "{} failed",
                task_name
            )
        }
        Err(e) => {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                "{}' task failed to complete",
                task_name
            )
        }
    }
}
