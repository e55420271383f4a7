//! Application module: the model the TUI draws from.
//!
//! `App` lives in `app::model` and is fed by player events; it never talks to
//! the player itself.

mod model;

pub use model::*;
