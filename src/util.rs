//! Utility functions for passing a pointer-sized value through the context
//! entry point.
//!
//! The entry convention of the context primitive only carries word-sized
//! integer arguments, so on 64-bit targets a pointer does not fit in one of
//! them. The value is split into two 32-bit halves when the entry point is
//! installed and reassembled inside it. On 32-bit targets the high half is
//! simply zero.

/// Splits a pointer-sized value into `(low, high)` halves.
pub fn split_ptr(addr: usize) -> (u32, u32) {
    let addr = addr as u64;
    (addr as u32, (addr >> 32) as u32)
}

/// Reassembles a value produced by [`split_ptr`].
pub fn join_ptr(low: u32, high: u32) -> usize {
    (u64::from(high) << 32 | u64::from(low)) as usize
}
