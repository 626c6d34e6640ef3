//! Debrid cache abstraction and the batched availability filter.

mod filter;
mod types;

pub use filter::{has_playable_scheme, retain_cached, AvailabilityFilter};
pub use types::*;
