//! # vmtailor-resize
//!
//! Instance resize orchestration: the state machine that takes a cloud
//! compute instance from running to fully stopped to resized.
//!
//! ## Design principles
//!
//! - The orchestrator talks to the provider only through the
//!   [`ComputeGateway`] trait; transport, auth, and wire formats live in
//!   adapter crates.
//! - Polling is bounded. Every run terminates with a typed
//!   [`ResizeOutcome`] (success, timeout, or classified failure), never a
//!   hang and never a process exit.
//! - Stops are idempotent: re-running a resize against an instance that
//!   is already stopping or stopped is safe.
//!
//! ## Flow
//!
//! ```text
//! validate -> stop -> poll status until TERMINATED -> set machine type
//! ```
//!
//! The machine type is applied only after the instance has been observed
//! in `TERMINATED`, the provider's fully-stopped state. Cancellation is
//! cooperative: a `watch` channel aborts a run within one poll interval.

mod error;
mod gateway;
mod orchestrator;
mod outcome;
mod policy;
mod request;
mod status;

pub use error::RequestError;
pub use gateway::{AlreadyStoppedError, ComputeGateway, MockGateway, TransientError};
pub use orchestrator::ResizeOrchestrator;
pub use outcome::{FailureCause, ResizeOutcome, ResizeStage};
pub use policy::{
    PollBudget, PollPolicy, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_TRANSIENT_POLLS,
    DEFAULT_POLL_INTERVAL,
};
pub use request::ResizeRequest;
pub use status::InstanceStatus;
