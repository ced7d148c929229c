//! The execution-layer adapter of the rollup.
//!
//! The crate turns ordered inbox messages into executable blocks. It decodes raw messages into
//! segments, assembles each segment into a block against a read-only snapshot of the chain state,
//! wraps every transaction with the protocol gas hooks, finalizes the rollup bookkeeping after a
//! block is sealed and dispatches calls into the reserved precompiles.
//!
//! The state container, the bytecode interpreter and header construction are external
//! collaborators and are consumed through [`StateReader`], [`StateWriter`] and
//! [`ExecutionBackend`].
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod constants;

mod block;
pub use block::*;

mod config;
pub use config::*;

mod error;
pub use error::*;

mod executor;
pub use executor::*;

mod hooks;
pub use hooks::*;

mod message;
pub use message::*;

mod pipeline;
pub use pipeline::*;

mod precompiles;
pub use precompiles::*;

mod spec;
pub use spec::*;

mod state;
pub use state::*;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

mod transaction;
pub use transaction::*;
