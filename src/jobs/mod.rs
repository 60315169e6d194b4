pub mod flow_eviction;
pub mod payment_status_poller;

pub use flow_eviction::start_flow_eviction_job;
pub use payment_status_poller::{
    start_payment_status_poller, PollSchedule, PollTarget, PollVerdict, PollerHandle,
};
