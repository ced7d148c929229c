//! Constants for the rollup execution layer.
//!
//! It groups the constants for different rollup specs as sub-modules.

use alloy_primitives::{address, Address};

/// The account whose storage holds the rollup bookkeeping (block count, message count, L1 price,
/// etc.). It has no code and is never the target of a transaction.
pub const ROLLUP_STATE_ADDRESS: Address = address!("0xA4B05FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF");

/// The offset added to an L1 contract address to obtain its aliased L2 sender address.
pub const L1_TO_L2_ALIAS_OFFSET: Address = address!("0x1111000000000000000000000000000000001111");

/// Maximum number of nested messages a single bundle message may carry.
pub const MAX_BUNDLE_MESSAGES: usize = 64;

/// Constants for the `ORIGIN` spec.
pub mod origin {
    use alloy_primitives::{address, Address};
    use revm::interpreter::gas;

    /// Constants inherited from `revm`.
    pub use gas::{CREATE, SSTORE_SET, STANDARD_TOKEN_COST};

    /// The base gas of every user transaction.
    pub const TX_BASE_GAS: u64 = 21_000;
    /// The gas charged per zero byte of transaction input.
    pub const TX_DATA_ZERO_GAS: u64 = STANDARD_TOKEN_COST;
    /// The gas charged per non-zero byte of transaction input.
    pub const TX_DATA_NON_ZERO_GAS: u64 = STANDARD_TOKEN_COST * 4;
    /// Number of L1 data units a single byte of an encoded transaction is billed for when it is
    /// posted to L1.
    pub const POSTER_UNITS_PER_BYTE: u64 = 16;

    /// The default per-block gas maximum of the chain.
    pub const DEFAULT_BLOCK_GAS_LIMIT: u64 = 32_000_000;
    /// The gas limit of a block carrying a single deposit.
    pub const DEPOSIT_BLOCK_GAS_LIMIT: u64 = 1_000_000;
    /// The default L2 base fee, 0.1 gwei.
    pub const DEFAULT_BASE_FEE: u128 = 100_000_000;
    /// The default L1 price per data unit, 50 gwei.
    pub const DEFAULT_L1_PRICE_PER_UNIT: u64 = 50_000_000_000;

    /// Flat gas charged by every precompile call.
    pub const PRECOMPILE_BASE_GAS: u64 = 100;
    /// Gas charged per 32-byte word of precompile input.
    pub const PRECOMPILE_WORD_GAS: u64 = 3;

    /// The address of the `RollupSys` precompile.
    pub const ROLLUP_SYS_ADDRESS: Address = address!("0x0000000000000000000000000000000000000064");
    /// The address of the `RollupUtil` precompile.
    pub const ROLLUP_UTIL_ADDRESS: Address = address!("0x0000000000000000000000000000000000000065");
    /// The address of the `GasInfo` precompile.
    pub const GAS_INFO_ADDRESS: Address = address!("0x000000000000000000000000000000000000006c");
}

/// Constants for the `CASCADE` spec.
pub mod cascade {
    use alloy_primitives::{address, Address};

    /// The address of the `CallerStore` precompile.
    pub const CALLER_STORE_ADDRESS: Address =
        address!("0x0000000000000000000000000000000000000066");
}
