//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `TaskState`: where a fetch task is in its fetch → extract → write life cycle
//! - `DomainState`: per-domain concurrency permits and request pacing

mod domain_state;
mod task_state;

pub use domain_state::DomainState;
pub use task_state::TaskState;
