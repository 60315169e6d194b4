use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::core::config::PaymentTimingConfig;
use crate::models::payments::InboundMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollVerdict {
    Continue,
    Finished,
}

/// What the poller drives. Both the status poll and the gateway messages
/// report through here, so the target decides when the session is over.
#[async_trait]
pub trait PollTarget: Send + Sync + 'static {
    async fn poll_status(&self, attempt: u32) -> PollVerdict;

    async fn on_message(&self, message: InboundMessage) -> PollVerdict;

    /// Called once when the attempt budget runs out without a terminal status.
    async fn on_budget_exhausted(&self);
}

#[derive(Debug, Clone, Copy)]
pub struct PollSchedule {
    pub initial_delay: Duration,
    pub interval: Duration,
    pub max_attempts: u32,
}

impl From<&PaymentTimingConfig> for PollSchedule {
    fn from(config: &PaymentTimingConfig) -> Self {
        Self {
            initial_delay: config.initial_delay(),
            interval: config.interval(),
            max_attempts: config.max_poll_attempts,
        }
    }
}

#[derive(Debug)]
enum PollerCommand {
    Arm,
    Stop,
}

/// Cancellable handle to a running poller. Dropping it stops the task.
pub struct PollerHandle {
    commands: mpsc::UnboundedSender<PollerCommand>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Starts status polling; the first check runs after the initial delay.
    pub fn arm(&self) {
        let _ = self.commands.send(PollerCommand::Arm);
    }

    pub fn stop(&self) {
        let _ = self.commands.send(PollerCommand::Stop);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        let _ = self.commands.send(PollerCommand::Stop);
    }
}

/// Spawns the poller for one payment session. Gateway messages are handled
/// as soon as they arrive; status polling waits for `arm`.
pub fn start_payment_status_poller(
    target: Arc<dyn PollTarget>,
    messages: mpsc::UnboundedReceiver<InboundMessage>,
    schedule: PollSchedule,
) -> PollerHandle {
    let (tx, rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run_poller(target, messages, rx, schedule));
    PollerHandle { commands: tx, task }
}

async fn run_poller(
    target: Arc<dyn PollTarget>,
    mut messages: mpsc::UnboundedReceiver<InboundMessage>,
    mut commands: mpsc::UnboundedReceiver<PollerCommand>,
    schedule: PollSchedule,
) {
    let mut next_poll: Option<Instant> = None;
    let mut attempts = 0u32;
    let mut armed = false;
    let mut messages_open = true;

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(PollerCommand::Arm) if !armed => {
                    armed = true;
                    next_poll = Some(Instant::now() + schedule.initial_delay);
                    debug!(delay_ms = schedule.initial_delay.as_millis() as u64, "status polling armed");
                }
                Some(PollerCommand::Arm) => {}
                Some(PollerCommand::Stop) | None => {
                    debug!("status poller stopped");
                    break;
                }
            },
            message = messages.recv(), if messages_open => match message {
                Some(message) => {
                    if target.on_message(message).await == PollVerdict::Finished {
                        break;
                    }
                }
                None => messages_open = false,
            },
            _ = sleep_until(next_poll.unwrap_or_else(Instant::now)), if next_poll.is_some() => {
                attempts += 1;
                match target.poll_status(attempts).await {
                    PollVerdict::Finished => break,
                    PollVerdict::Continue if attempts >= schedule.max_attempts => {
                        warn!(attempts, "status poll budget exhausted");
                        next_poll = None;
                        target.on_budget_exhausted().await;
                    }
                    PollVerdict::Continue => {
                        next_poll = Some(Instant::now() + schedule.interval);
                    }
                }
            }
        }
    }

    info!(attempts, "payment status poller finished");
}
