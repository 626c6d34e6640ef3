//! Background job status registry.

mod guard;
mod registry;
mod types;

pub(crate) use guard::RunGuard;
pub use registry::JobRegistry;
pub use types::{format_interval, JobStatus, BACKFILL_JOB, CHECKER_JOB};
