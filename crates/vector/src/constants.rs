/// Factor by which capacity grows whenever a full `Vector` needs room for one more value.
pub const GROWTH_FACTOR: usize = 2;
/// Capacity of the first allocation made by an empty `Vector`.
pub const MIN_NON_ZERO_CAPACITY: usize = 1;
