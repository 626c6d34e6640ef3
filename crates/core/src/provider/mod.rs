//! Stream provider abstraction.
//!
//! Providers return raw, unscored candidates for a movie or an episode.
//! Concrete HTTP providers live in the server crate.

mod types;

pub use types::*;
