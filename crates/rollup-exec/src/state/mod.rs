//! Access to the external state container.
//!
//! The pipeline never owns the account/storage state. It sees it through two traits:
//!
//! - [`StateReader`]: balance, nonce and storage reads. This is all the block assembler gets, via
//!   [`ReadOnlyState`].
//! - [`StateWriter`]: adds writes. Handed to the gas hooks, the execution backend, the precompiles
//!   and the block finalizer.

mod cache_db;
mod rollup;

pub use rollup::*;

use alloy_primitives::{Address, U256};
use auto_impl::auto_impl;
use delegate::delegate;

use crate::StateError;

/// Read access to account balances, nonces and storage slots.
#[auto_impl(&, &mut, Box)]
pub trait StateReader {
    /// The balance of `address`, zero for a missing account.
    fn balance(&self, address: Address) -> Result<U256, StateError>;

    /// The nonce of `address`, zero for a missing account.
    fn nonce(&self, address: Address) -> Result<u64, StateError>;

    /// The value of storage `slot` of `address`, zero when unset.
    fn storage(&self, address: Address, slot: U256) -> Result<U256, StateError>;
}

/// Write access to account balances, nonces and storage slots.
#[auto_impl(&mut, Box)]
pub trait StateWriter: StateReader {
    /// Sets the balance of `address`.
    fn set_balance(&mut self, address: Address, balance: U256) -> Result<(), StateError>;

    /// Sets the nonce of `address`.
    fn set_nonce(&mut self, address: Address, nonce: u64) -> Result<(), StateError>;

    /// Sets storage `slot` of `address` to `value`.
    fn set_storage(&mut self, address: Address, slot: U256, value: U256)
        -> Result<(), StateError>;
}

/// A read-only view of the state as of the end of the previous block.
///
/// The block assembler only ever receives this type, so assembling a block cannot mutate the
/// chain state even when the caller holds a writer.
#[derive(Debug)]
pub struct ReadOnlyState<'a, S: ?Sized> {
    inner: &'a S,
}

impl<'a, S: StateReader + ?Sized> ReadOnlyState<'a, S> {
    /// Wraps a shared borrow of the state.
    pub const fn new(inner: &'a S) -> Self {
        Self { inner }
    }
}

impl<S: ?Sized> Clone for ReadOnlyState<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: ?Sized> Copy for ReadOnlyState<'_, S> {}

impl<S: StateReader + ?Sized> StateReader for ReadOnlyState<'_, S> {
    delegate! {
        to self.inner {
            fn balance(&self, address: Address) -> Result<U256, StateError>;
            fn nonce(&self, address: Address) -> Result<u64, StateError>;
            fn storage(&self, address: Address, slot: U256) -> Result<U256, StateError>;
        }
    }
}
