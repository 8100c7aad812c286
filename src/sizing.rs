//! Converts requested capacities into billable allocation units.

use bytesize::ByteSize;

/// Allocation unit used by the provider for volume sizes.
pub const ALLOCATION_UNIT: ByteSize = ByteSize::mib(1);

/// Number of `unit`-sized blocks needed to hold `bytes`, rounding up.
///
/// A zero `unit` yields zero rather than panicking.
#[must_use]
pub const fn size_in_units(bytes: u64, unit: u64) -> u64 {
    if unit == 0 {
        return 0;
    }
    bytes.div_ceil(unit)
}

/// Minimum-size floor applied to small claims when rounding is enabled.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MinimumSizePolicy {
    /// Whether undersized requests are enlarged to the floor.
    pub rounding_enabled: bool,
    /// Smallest capacity the provider will create.
    pub floor: ByteSize,
}

/// Size chosen for a claim after the minimum-size policy ran.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BillableSize {
    /// Size in [`ALLOCATION_UNIT`] blocks sent to the provider.
    pub units: u64,
    /// Capacity reported back to the orchestrator.
    pub capacity: ByteSize,
    /// Whether the request was enlarged to the floor.
    pub rounded: bool,
}

impl MinimumSizePolicy {
    /// Computes the billable size for a requested capacity.
    ///
    /// The floor only applies when the request is strictly smaller than it;
    /// a request of exactly the floor is left alone.
    #[must_use]
    pub fn apply(&self, requested: ByteSize) -> BillableSize {
        let unit = ALLOCATION_UNIT.as_u64();
        if self.rounding_enabled && requested < self.floor {
            tracing::warn!(
                "claim requested {requested} which is less than {}; rounding up to ensure volume creation",
                self.floor
            );
            return BillableSize {
                units: size_in_units(self.floor.as_u64(), unit),
                capacity: self.floor,
                rounded: true,
            };
        }
        BillableSize {
            units: size_in_units(requested.as_u64(), unit),
            capacity: requested,
            rounded: false,
        }
    }
}
