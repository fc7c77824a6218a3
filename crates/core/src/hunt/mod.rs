//! The hunt: sample wanted lists and trigger bounded searches.
//!
//! Each cycle, for every instance and enabled hunt kind:
//! 1. Count the wanted list and pick one page uniformly at random
//! 2. Drop unmonitored, unreleased and recently searched items
//! 3. Pick up to `limit` of the rest uniformly at random
//! 4. Trigger a search per item and record it in the ledger

mod runner;
mod sampler;
mod types;

pub use runner::HuntOrchestrator;
pub use sampler::{
    choose, choose_page, filter_monitored, filter_released, filter_unsearched, PagePlan, Sampler,
};
pub use types::*;
