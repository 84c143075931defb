//! Unsigned integer type alias for bucket rates, capacities and token counts.

/// Alias for the unsigned integer type used for rates, capacities and tokens.
///
/// Maps to [`u64`], which leaves enough headroom that refill arithmetic can
/// saturate instead of overflowing even for very long idle periods.
pub type Uint = u64;
