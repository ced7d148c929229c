//! Address aliasing of L1-originated senders.
//!
//! An L1 contract and an L2 contract may share an address while being controlled by different
//! parties. Messages sent from L1 therefore appear on L2 from `l1_address + offset`, computed
//! modulo 2^160.

use alloy_primitives::{aliases::U160, Address};

use crate::constants::L1_TO_L2_ALIAS_OFFSET;

fn to_u160(address: Address) -> U160 {
    U160::from_be_bytes(address.0 .0)
}

fn from_u160(value: U160) -> Address {
    Address::from(value.to_be_bytes::<20>())
}

/// Returns the L2 sender of a message sent by `l1_address` on L1.
pub fn apply_l1_to_l2_alias(l1_address: Address) -> Address {
    from_u160(to_u160(l1_address).wrapping_add(to_u160(L1_TO_L2_ALIAS_OFFSET)))
}

/// Recovers the L1 address from an aliased L2 sender.
pub fn undo_l1_to_l2_alias(l2_address: Address) -> Address {
    from_u160(to_u160(l2_address).wrapping_sub(to_u160(L1_TO_L2_ALIAS_OFFSET)))
}
