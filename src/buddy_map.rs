//! One-bit-per-buddy-pair bitmap.
//!
//! A specialization of [`BitVec`] keyed by `(base, address, order)` rather
//! than a raw index. A set bit means exactly one of the two buddies in that
//! pair is currently free at that order; a clear bit means both are free (a
//! transient state that never survives an allocator operation) or both are
//! in use/split. Halving the bits-per-block this way (versus one bit per
//! block) is what makes merge decisions at `free` time branch-free: the
//! caller never needs to separately track "is my buddy allocated" and "is my
//! buddy further split," just this one parity bit.

use crate::arithmetic;
use crate::bit_vec::BitVec;
use crate::error::OsMapError;

pub struct BuddyMap
{
    bits: BitVec,
}

impl BuddyMap
{
    /// Creates a buddy-pair bitmap for a region of `region_size` bytes at
    /// order `e`: one bit per pair of order-`e` blocks.
    pub fn create(region_size: usize, e: u32) -> Result<Self, OsMapError>
    {
        let block_size = arithmetic::size_of_order(e);
        let blocks = region_size.div_ceil(block_size);
        let pairs = blocks.div_ceil(2);

        Ok(Self { bits: BitVec::create(pairs)? })
    }

    #[inline]
    fn index(&self, base: usize, p: usize, e: u32) -> usize
    {
        let pair_start = arithmetic::pair_start(base, p, e);
        (pair_start - base) / arithmetic::size_of_order(e + 1)
    }

    pub fn set(&mut self, base: usize, p: usize, e: u32)
    {
        let i = self.index(base, p, e);
        self.bits.set(i);
    }

    pub fn clear(&mut self, base: usize, p: usize, e: u32)
    {
        let i = self.index(base, p, e);
        self.bits.clear(i);
    }

    pub fn test(&self, base: usize, p: usize, e: u32) -> bool
    {
        let i = self.index(base, p, e);
        self.bits.test(i)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn buddies_in_the_same_pair_share_an_index()
    {
        let base = 0x1000;
        let e = 4;
        let mut map = BuddyMap::create(4096, e).unwrap();

        let lower = base;
        let upper = base + arithmetic::size_of_order(e);

        map.set(base, lower, e);
        assert!(map.test(base, upper, e));

        map.clear(base, upper, e);
        assert!(!map.test(base, lower, e));
    }

    #[test]
    fn distinct_pairs_have_distinct_indices()
    {
        let base = 0x2000;
        let e = 4;
        let mut map = BuddyMap::create(4096, e).unwrap();

        let pair0 = base;
        let pair1 = base + 2 * arithmetic::size_of_order(e);

        map.set(base, pair0, e);
        assert!(map.test(base, pair0, e));
        assert!(!map.test(base, pair1, e));
    }
}
