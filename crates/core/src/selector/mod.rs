//! Best-stream selection: ranking, guard rules and upgrade decisions.

mod policy;
mod select;

pub use policy::{violated_guard, GuardRule, UpgradePolicy};
pub use select::{
    evaluate_upgrade, filter_by_minimum, pick_best, top_n, ScoredCandidate, StreamSelector,
    UpgradeDecision,
};
