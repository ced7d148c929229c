//! Typed access to the rollup bookkeeping kept in the storage of [`ROLLUP_STATE_ADDRESS`].

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};

use crate::{constants::ROLLUP_STATE_ADDRESS, ChainConfig, StateError, StateReader, StateWriter};

/// Storage slots of the rollup state account.
#[repr(u64)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RollupSlot {
    /// Non-zero once the bookkeeping has been initialized.
    Version = 0,
    BlockCount = 1,
    MessageCount = 2,
    LastBlockNumber = 3,
    LastBlockTimestamp = 4,
    L1PricePerUnit = 5,
    TotalSurchargeGas = 6,
    TotalGasUsed = 7,
    DepositCount = 8,
    LastBlockHash = 9,
    /// Inbox messages read since the last finalized block.
    PendingMessages = 10,
    /// Length in bytes of the encoded deferred segment, zero when none waits.
    DeferredSegmentLength = 11,
}

impl RollupSlot {
    fn key(self) -> U256 {
        U256::from(self as u64)
    }
}

/// Slot of the `index`-th 32-byte word of the encoded deferred segment.
fn deferred_segment_word(index: usize) -> U256 {
    let base = keccak256(RollupSlot::DeferredSegmentLength.key().to_be_bytes::<32>());
    U256::from_be_bytes(base.0).wrapping_add(U256::from(index))
}

/// The current layout version of the rollup state account.
pub const ROLLUP_STATE_VERSION: u64 = 1;

/// Typed view over the rollup bookkeeping.
///
/// `S` is any state accessor; use `RollupState::new(&state)` for reads and
/// `RollupState::new(&mut state)` for writes.
#[derive(Debug)]
pub struct RollupState<S> {
    state: S,
}

impl<S> RollupState<S> {
    /// Opens the rollup bookkeeping on top of `state`.
    pub const fn new(state: S) -> Self {
        Self { state }
    }

    /// The address holding the bookkeeping.
    pub const fn address(&self) -> Address {
        ROLLUP_STATE_ADDRESS
    }
}

impl<S: StateReader> RollupState<S> {
    fn read(&self, slot: RollupSlot) -> Result<U256, StateError> {
        self.state.storage(ROLLUP_STATE_ADDRESS, slot.key())
    }

    fn read_u64(&self, slot: RollupSlot) -> Result<u64, StateError> {
        Ok(self.read(slot)?.saturating_to())
    }

    /// Whether [`RollupState::initialize`] has run.
    pub fn is_initialized(&self) -> Result<bool, StateError> {
        Ok(!self.read(RollupSlot::Version)?.is_zero())
    }

    /// Number of blocks finalized so far, which is also the number of the next block.
    pub fn block_count(&self) -> Result<u64, StateError> {
        self.read_u64(RollupSlot::BlockCount)
    }

    /// Number of inbox messages consumed by finalized blocks.
    pub fn message_count(&self) -> Result<u64, StateError> {
        self.read_u64(RollupSlot::MessageCount)
    }

    /// Number of the last finalized block.
    pub fn last_block_number(&self) -> Result<u64, StateError> {
        self.read_u64(RollupSlot::LastBlockNumber)
    }

    /// Timestamp of the last finalized block.
    pub fn last_block_timestamp(&self) -> Result<u64, StateError> {
        self.read_u64(RollupSlot::LastBlockTimestamp)
    }

    /// Hash of the last finalized block, zero before the first one.
    pub fn last_block_hash(&self) -> Result<B256, StateError> {
        Ok(B256::from(self.read(RollupSlot::LastBlockHash)?.to_be_bytes::<32>()))
    }

    /// Number of inbox messages read since the last finalized block.
    pub fn pending_messages(&self) -> Result<u64, StateError> {
        self.read_u64(RollupSlot::PendingMessages)
    }

    /// The encoded segment waiting to become the next block, see [`MessageSegment::encode`].
    ///
    /// [`MessageSegment::encode`]: crate::MessageSegment::encode
    pub fn deferred_segment(&self) -> Result<Option<Bytes>, StateError> {
        let len = self.read_u64(RollupSlot::DeferredSegmentLength)? as usize;
        if len == 0 {
            return Ok(None);
        }
        let mut encoded = Vec::with_capacity(len.next_multiple_of(32));
        for index in 0..len.div_ceil(32) {
            let word = self.state.storage(ROLLUP_STATE_ADDRESS, deferred_segment_word(index))?;
            encoded.extend_from_slice(&word.to_be_bytes::<32>());
        }
        encoded.truncate(len);
        Ok(Some(encoded.into()))
    }

    /// Price in wei of one L1 data unit.
    pub fn l1_price_per_unit(&self) -> Result<U256, StateError> {
        self.read(RollupSlot::L1PricePerUnit)
    }

    /// Surcharge gas settled by the gas hooks over all finalized blocks.
    pub fn total_surcharge_gas(&self) -> Result<U256, StateError> {
        self.read(RollupSlot::TotalSurchargeGas)
    }

    /// Gas used over all finalized blocks.
    pub fn total_gas_used(&self) -> Result<U256, StateError> {
        self.read(RollupSlot::TotalGasUsed)
    }

    /// Number of deposits included in finalized blocks.
    pub fn deposit_count(&self) -> Result<u64, StateError> {
        self.read_u64(RollupSlot::DepositCount)
    }
}

impl<S: StateWriter> RollupState<S> {
    fn write(&mut self, slot: RollupSlot, value: U256) -> Result<(), StateError> {
        self.state.set_storage(ROLLUP_STATE_ADDRESS, slot.key(), value)
    }

    /// Writes the genesis values taken from `config`. Does nothing when the state is already
    /// initialized; returns whether anything was written.
    pub fn initialize(&mut self, config: &ChainConfig) -> Result<bool, StateError> {
        if self.is_initialized()? {
            return Ok(false);
        }
        self.write(RollupSlot::Version, U256::from(ROLLUP_STATE_VERSION))?;
        self.write(RollupSlot::L1PricePerUnit, config.initial_l1_price_per_unit)?;
        Ok(true)
    }

    /// Sets the number of finalized blocks.
    pub fn set_block_count(&mut self, count: u64) -> Result<(), StateError> {
        self.write(RollupSlot::BlockCount, U256::from(count))
    }

    /// Sets the number of consumed inbox messages.
    pub fn set_message_count(&mut self, count: u64) -> Result<(), StateError> {
        self.write(RollupSlot::MessageCount, U256::from(count))
    }

    /// Records the number and timestamp of the last finalized block.
    pub fn set_last_block(&mut self, number: u64, timestamp: u64) -> Result<(), StateError> {
        self.write(RollupSlot::LastBlockNumber, U256::from(number))?;
        self.write(RollupSlot::LastBlockTimestamp, U256::from(timestamp))
    }

    /// Records the hash of the last finalized block.
    pub fn set_last_block_hash(&mut self, hash: B256) -> Result<(), StateError> {
        self.write(RollupSlot::LastBlockHash, U256::from_be_bytes(hash.0))
    }

    /// Sets the number of inbox messages read since the last finalized block.
    pub fn set_pending_messages(&mut self, count: u64) -> Result<(), StateError> {
        self.write(RollupSlot::PendingMessages, U256::from(count))
    }

    /// Stores the encoded deferred segment, replacing any previous one.
    pub fn set_deferred_segment(&mut self, encoded: &[u8]) -> Result<(), StateError> {
        self.clear_deferred_segment()?;
        for (index, chunk) in encoded.chunks(32).enumerate() {
            let mut word = [0u8; 32];
            word[..chunk.len()].copy_from_slice(chunk);
            self.state.set_storage(
                ROLLUP_STATE_ADDRESS,
                deferred_segment_word(index),
                U256::from_be_bytes(word),
            )?;
        }
        self.write(RollupSlot::DeferredSegmentLength, U256::from(encoded.len()))
    }

    /// Removes the stored deferred segment.
    pub fn clear_deferred_segment(&mut self) -> Result<(), StateError> {
        let len = self.read_u64(RollupSlot::DeferredSegmentLength)? as usize;
        for index in 0..len.div_ceil(32) {
            self.state.set_storage(ROLLUP_STATE_ADDRESS, deferred_segment_word(index), U256::ZERO)?;
        }
        self.write(RollupSlot::DeferredSegmentLength, U256::ZERO)
    }

    /// Sets the price in wei of one L1 data unit.
    pub fn set_l1_price_per_unit(&mut self, price: U256) -> Result<(), StateError> {
        self.write(RollupSlot::L1PricePerUnit, price)
    }

    /// Sets the total settled surcharge gas.
    pub fn set_total_surcharge_gas(&mut self, gas: U256) -> Result<(), StateError> {
        self.write(RollupSlot::TotalSurchargeGas, gas)
    }

    /// Sets the total gas used.
    pub fn set_total_gas_used(&mut self, gas: U256) -> Result<(), StateError> {
        self.write(RollupSlot::TotalGasUsed, gas)
    }

    /// Sets the number of included deposits.
    pub fn set_deposit_count(&mut self, count: u64) -> Result<(), StateError> {
        self.write(RollupSlot::DepositCount, U256::from(count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MemoryState;

    #[test]
    fn test_initialize_is_idempotent() {
        let mut state = MemoryState::default();
        let config = ChainConfig::default();

        assert_eq!(RollupState::new(&mut state).initialize(&config), Ok(true));
        RollupState::new(&mut state).set_l1_price_per_unit(U256::from(7)).unwrap();
        assert_eq!(RollupState::new(&mut state).initialize(&config), Ok(false));

        let rollup = RollupState::new(&state);
        assert!(rollup.is_initialized().unwrap());
        assert_eq!(rollup.l1_price_per_unit(), Ok(U256::from(7)));
    }

    #[test]
    fn test_counters_default_to_zero() {
        let state = MemoryState::default();
        let rollup = RollupState::new(&state);
        assert!(!rollup.is_initialized().unwrap());
        assert_eq!(rollup.block_count(), Ok(0));
        assert_eq!(rollup.message_count(), Ok(0));
        assert_eq!(rollup.last_block_timestamp(), Ok(0));
        assert_eq!(rollup.total_surcharge_gas(), Ok(U256::ZERO));
        assert_eq!(rollup.last_block_hash(), Ok(B256::ZERO));
        assert_eq!(rollup.deferred_segment(), Ok(None));
    }

    #[test]
    fn test_deferred_segment_spans_words() {
        let mut state = MemoryState::default();
        let long: Vec<u8> = (0..70).collect();

        RollupState::new(&mut state).set_deferred_segment(&long).unwrap();
        assert_eq!(RollupState::new(&state).deferred_segment(), Ok(Some(long.into())));

        RollupState::new(&mut state).set_deferred_segment(&[0xab; 3]).unwrap();
        assert_eq!(RollupState::new(&state).deferred_segment(), Ok(Some(vec![0xab; 3].into())));
        assert_eq!(state.storage(ROLLUP_STATE_ADDRESS, deferred_segment_word(2)), Ok(U256::ZERO));

        RollupState::new(&mut state).clear_deferred_segment().unwrap();
        assert_eq!(RollupState::new(&state).deferred_segment(), Ok(None));
        assert_eq!(state.storage(ROLLUP_STATE_ADDRESS, deferred_segment_word(0)), Ok(U256::ZERO));
    }
}
