//! Application configuration: tick interval, library scanning options, cache
//! and store locations, key bindings and logging.
//!
//! Playback preferences are persisted separately by `crate::store`.

mod load;
mod schema;

pub use schema::*;

#[cfg(test)]
mod tests;
