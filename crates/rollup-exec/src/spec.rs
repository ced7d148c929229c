use core::str::FromStr;

use revm::primitives::hardfork::UnknownHardfork;
use serde::{Deserialize, Serialize};

/// Rollup spec id. Each spec enables the protocol features of all specs before it.
#[repr(u8)]
#[derive(
    Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[allow(non_camel_case_types, clippy::upper_case_acronyms)]
pub enum RollupSpecId {
    /// The genesis spec: message decoding, gas hooks, `RollupSys`, `RollupUtil` and `GasInfo`.
    #[default]
    #[serde(rename = "Origin")]
    ORIGIN,
    /// Adds the `CallerStore` precompile.
    #[serde(rename = "Cascade")]
    CASCADE,
}

/// String identifiers for rollup specs.
#[allow(missing_docs)]
pub mod name {
    pub const ORIGIN: &str = "Origin";
    pub const CASCADE: &str = "Cascade";
}

impl RollupSpecId {
    /// Checks if one [`RollupSpecId`] is enabled in another.
    ///
    /// Specs are backward compatible, so a higher spec always enables the features of a lower
    /// one.
    pub const fn is_enabled_in(self, other: Self) -> bool {
        other as u8 <= self as u8
    }

    /// The human readable name of the spec.
    pub const fn name(self) -> &'static str {
        match self {
            Self::ORIGIN => name::ORIGIN,
            Self::CASCADE => name::CASCADE,
        }
    }
}

impl From<RollupSpecId> for &'static str {
    fn from(spec_id: RollupSpecId) -> Self {
        spec_id.name()
    }
}

impl FromStr for RollupSpecId {
    type Err = UnknownHardfork;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            name::ORIGIN => Ok(Self::ORIGIN),
            name::CASCADE => Ok(Self::CASCADE),
            _ => Err(UnknownHardfork),
        }
    }
}

impl core::fmt::Display for RollupSpecId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_ordering() {
        assert!(RollupSpecId::CASCADE.is_enabled_in(RollupSpecId::ORIGIN));
        assert!(RollupSpecId::CASCADE.is_enabled_in(RollupSpecId::CASCADE));
        assert!(!RollupSpecId::ORIGIN.is_enabled_in(RollupSpecId::CASCADE));
    }

    #[test]
    fn test_spec_names_round_trip() {
        for spec in [RollupSpecId::ORIGIN, RollupSpecId::CASCADE] {
            assert_eq!(spec.name().parse::<RollupSpecId>().ok(), Some(spec));
        }
        assert!("Unknown".parse::<RollupSpecId>().is_err());
    }
}
