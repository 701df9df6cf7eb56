//! CLI command handlers, one file per command.

mod drop_masks;
mod drop_unsegmented;
mod fetch;
mod prune;
mod stats;

pub use drop_masks::run_drop_masks;
pub use drop_unsegmented::run_drop_unsegmented;
pub use fetch::run_fetch;
pub use prune::run_prune;
pub use stats::run_stats;
