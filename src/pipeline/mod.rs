//! Pull request size check pipeline
//!
//! One accepted event becomes one run:
//! 1. post a `pending` commit status
//! 2. build the baseline branch, then the change branch
//! 3. diff the two snapshots
//! 4. render the HTML report into the change working directory
//! 5. publish the report and raw data
//! 6. post `success` or `failure` depending on the size threshold
//!
//! Runs are independent; many may be in flight on one runtime. Runs that
//! share a working directory take turns.

pub mod error;
pub mod event;
pub mod locks;
pub mod orchestrator;
pub mod stage;
pub mod verdict;

pub use error::PipelineError;
pub use event::{PipelineRun, PullRequestEvent, ACCEPTED_ACTIONS};
pub use locks::DirectoryLocks;
pub use orchestrator::{accept, Orchestrator};
pub use stage::{CompletedRun, IgnoreReason, RunOutcome, RunState};
pub use verdict::Verdict;
