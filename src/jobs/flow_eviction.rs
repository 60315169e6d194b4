use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::services::PaymentSessionAdapter;

/// Background job that drops finished and abandoned payment sessions from memory.
pub fn start_flow_eviction_job(
    payments: Arc<PaymentSessionAdapter>,
    every: Duration,
) -> JoinHandle<()> {
    info!("Starting payment session eviction job");

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            let evicted = payments.evict_stale_flows().await;
            if evicted > 0 {
                info!(evicted, "evicted stale payment sessions");
            } else {
                debug!("no stale payment sessions");
            }
        }
    })
}
