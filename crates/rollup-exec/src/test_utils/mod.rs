//! Test utilities for the rollup execution layer.

mod backend;
mod state;
mod tx;

pub use backend::*;
pub use state::*;
pub use tx::*;
