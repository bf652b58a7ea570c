//! Per-order free lists: the split/coalesce state machine.
//!
//! Free blocks are threaded through their own first machine word — there is
//! no separate list-node allocation, because the memory backing the node IS
//! the free block. [`BuddyMap`] tracks, per order, whether exactly one half
//! of a buddy pair is free (letting `free` decide in O(1) whether it may
//! coalesce); [`BitVec`]-backed `alloc_map`s track which slots are currently
//! live allocations of a given order, which is how [`FreeList::sizeof_ptr`]
//! recovers the order of an arbitrary live pointer.

use std::ptr::NonNull;

use crate::arithmetic;
use crate::bit_vec::BitVec;
use crate::buddy_map::BuddyMap;
use crate::error::{self, OsMapError};

/// Reads the intrusive "next" word stored at the start of a free block.
///
/// # Safety
///
/// `block` must point to at least `size_of::<*mut u8>()` writable, readable
/// bytes that are not currently part of a live allocation.
#[inline]
unsafe fn read_next(block: *mut u8) -> *mut u8
{
    unsafe { *(block as *const *mut u8) }
}

/// Writes the intrusive "next" word stored at the start of a free block.
///
/// # Safety
///
/// Same preconditions as [`read_next`].
#[inline]
unsafe fn write_next(block: *mut u8, next: *mut u8)
{
    unsafe { (block as *mut *mut u8).write(next) };
}

pub struct FreeList
{
    l: u32,
    u: u32,
    /// Indexed by `order - l`. A null entry means the list for that order is
    /// empty.
    heads: Vec<*mut u8>,
    buddy_maps: Vec<BuddyMap>,
    alloc_maps: Vec<BitVec>,
}

impl FreeList
{
    /// Builds a `FreeList` sized for a region of `region_size` bytes spanning
    /// orders `[l, u]`. The lists themselves start empty; [`Pool::create`]
    /// seeds them by calling [`FreeList::free`] for each tile.
    ///
    /// [`Pool::create`]: crate::pool::Pool::create
    pub fn create(region_size: usize, l: u32, u: u32) -> Result<Self, OsMapError>
    {
        let order_count = (u - l + 1) as usize;
        let mut buddy_maps = Vec::with_capacity(order_count);
        let mut alloc_maps = Vec::with_capacity(order_count);

        for e in l..=u
        {
            buddy_maps.push(BuddyMap::create(region_size, e)?);
            let slots = region_size.div_ceil(arithmetic::size_of_order(e));
            alloc_maps.push(BitVec::create(slots)?);
        }

        Ok(Self {
            l,
            u,
            heads: vec![std::ptr::null_mut(); order_count],
            buddy_maps,
            alloc_maps,
        })
    }

    #[inline]
    fn idx(&self, e: u32) -> usize
    {
        (e - self.l) as usize
    }

    /// Finds the smallest order `>= e` with a free block, splits it down to
    /// `e`, and returns the result. `None` if no order in `[e, u]` has a free
    /// block.
    pub fn alloc(&mut self, base: usize, e: u32) -> Option<NonNull<u8>>
    {
        let mut k = e;
        while k <= self.u && self.heads[self.idx(k)].is_null()
        {
            k += 1;
        }
        if k > self.u
        {
            return None;
        }

        let block = self.heads[self.idx(k)];
        // SAFETY: `block` is a live free-list head, so its next word is valid.
        self.heads[self.idx(k)] = unsafe { read_next(block) };

        while k > e
        {
            k -= 1;
            // SAFETY: `block` is naturally aligned to order `k + 1`, so
            // `block + 2^k` is the in-bounds upper half of its pair.
            let buddy = unsafe { block.add(arithmetic::size_of_order(k)) };

            // SAFETY: `buddy` is free memory within the pool region; we are
            // about to own its first word as a free-list link.
            unsafe { write_next(buddy, self.heads[self.idx(k)]) };
            self.heads[self.idx(k)] = buddy;

            let bm = &mut self.buddy_maps[self.idx(k)];
            if bm.test(base, block as usize, k)
            {
                bm.clear(base, block as usize, k);
            }
            else
            {
                bm.set(base, block as usize, k);
            }

            log::debug!("free_list: split order {} -> order {k}", k + 1);
        }

        let slot = (block as usize - base) >> e;
        self.alloc_maps[self.idx(e)].set(slot);

        log::debug!("free_list: alloc order {e} at {block:p}");
        Some(NonNull::new(block).unwrap_or_else(|| error::fatal("alloc produced a null block")))
    }

    /// Returns `mem` (a block of order `e`) to the free lists, coalescing
    /// with its buddy repeatedly while the buddy-pair bitmap says it's legal.
    pub fn free(&mut self, base: usize, mem: NonNull<u8>, e: u32)
    {
        let slot = (mem.as_ptr() as usize - base) >> e;
        self.alloc_maps[self.idx(e)].clear(slot);

        let mut curr = mem.as_ptr();
        let mut k = e;

        while k < self.u
        {
            let bm = &mut self.buddy_maps[self.idx(k)];

            if !bm.test(base, curr as usize, k)
            {
                bm.set(base, curr as usize, k);
                break;
            }

            bm.clear(base, curr as usize, k);

            let buddy_addr = arithmetic::buddy(base, curr as usize, k);
            let buddy = buddy_addr as *mut u8;

            if !self.unlink(k, buddy)
            {
                // The bit said the buddy was free, but it isn't on the
                // free list at this order. This should be unreachable under
                // correct usage; treat it as non-mergeable rather than
                // corrupting state further.
                log::warn!(
                    "free_list: buddy {buddy:p} for order {k} not found on its free list; not merging"
                );
                self.buddy_maps[self.idx(k)].set(base, curr as usize, k);
                break;
            }

            curr = if (buddy as usize) < (curr as usize) { buddy } else { curr };
            k += 1;

            log::debug!("free_list: merged up to order {k} at {curr:p}");
        }

        // SAFETY: `curr` is a free block we exclusively own at this point.
        unsafe { write_next(curr, self.heads[self.idx(k)]) };
        self.heads[self.idx(k)] = curr;
    }

    /// Splices `target` out of the order-`k` free list via a linear scan.
    /// Returns `false` if `target` was not found.
    fn unlink(&mut self, k: u32, target: *mut u8) -> bool
    {
        let idx = self.idx(k);

        if self.heads[idx] == target
        {
            // SAFETY: `target` is the current head, so its next word is valid.
            self.heads[idx] = unsafe { read_next(target) };
            return true;
        }

        let mut curr = self.heads[idx];
        while !curr.is_null()
        {
            // SAFETY: `curr` is a live node on this free list.
            let next = unsafe { read_next(curr) };
            if next == target
            {
                // SAFETY: `target` is a live node on this free list.
                let after_target = unsafe { read_next(target) };
                // SAFETY: `curr` is a live node whose next word we own.
                unsafe { write_next(curr, after_target) };
                return true;
            }
            curr = next;
        }

        false
    }

    /// Scans orders `l..=u` for the first order at which `p`'s slot is
    /// marked live. `None` for an unknown pointer (never returned by
    /// `alloc`, already freed, or outside the region).
    pub fn sizeof_ptr(&self, base: usize, p: usize) -> Option<u32>
    {
        for e in self.l..=self.u
        {
            let alloc_map = &self.alloc_maps[self.idx(e)];
            let slot = match (p.checked_sub(base), arithmetic::size_of_order(e))
            {
                (Some(offset), size) => offset / size,
                (None, _) => continue,
            };

            if slot < alloc_map.len() && alloc_map.test(slot)
            {
                return Some(e);
            }
        }
        None
    }

    /// Diagnostic textual dump of every free list, largest block first.
    pub fn print(&self) -> String
    {
        let mut out = String::new();
        for e in self.l..=self.u
        {
            out.push_str(&format!("order {e:2}: "));
            let mut curr = self.heads[self.idx(e)];
            while !curr.is_null()
            {
                out.push_str(&format!("{curr:p} "));
                // SAFETY: `curr` is a live node on this free list.
                curr = unsafe { read_next(curr) };
            }
            out.push('\n');
        }
        out
    }
}

impl std::fmt::Display for FreeList
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {
        write!(f, "{}", self.print())
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    const PAGE: usize = 4096;

    fn seed(fl: &mut FreeList, base: usize, size: usize, l: u32, u: u32)
    {
        let mut curr = base;
        let mut remaining = size;
        for e in (l..=u).rev()
        {
            let block_size = arithmetic::size_of_order(e);
            while remaining >= block_size
            {
                let ptr = NonNull::new(curr as *mut u8).unwrap();
                fl.free(base, ptr, e);
                curr += block_size;
                remaining -= block_size;
            }
        }
    }

    #[test]
    fn alloc_then_free_returns_to_a_single_top_block()
    {
        let base = 0x10000;
        let size = 1024usize;
        let (l, u) = (4, 10);
        let mut fl = FreeList::create(size, l, u).unwrap();
        seed(&mut fl, base, size, l, u);

        let p = fl.alloc(base, l).unwrap();
        assert_eq!(p.as_ptr() as usize, base);
        for e in l..u
        {
            assert!(!fl.heads[fl.idx(e)].is_null(), "order {e} should hold the split-off buddy");
        }

        fl.free(base, p, l);
        for e in l..u
        {
            assert!(fl.heads[fl.idx(e)].is_null(), "order {e} should be empty again");
        }
        assert_eq!(fl.heads[fl.idx(u)], base as *mut u8);
    }

    #[test]
    fn sizeof_ptr_tracks_live_allocations()
    {
        let base = 0x20000;
        let size = PAGE;
        let (l, u) = (4, 12);
        let mut fl = FreeList::create(size, l, u).unwrap();
        seed(&mut fl, base, size, l, u);

        let p = fl.alloc(base, 6).unwrap();
        assert_eq!(fl.sizeof_ptr(base, p.as_ptr() as usize), Some(6));

        fl.free(base, p, 6);
        assert_eq!(fl.sizeof_ptr(base, p.as_ptr() as usize), None);
    }

    #[test]
    fn unknown_pointer_is_reported_as_none()
    {
        let base = 0x30000;
        let size = PAGE;
        let (l, u) = (4, 12);
        let mut fl = FreeList::create(size, l, u).unwrap();
        seed(&mut fl, base, size, l, u);

        assert_eq!(fl.sizeof_ptr(base, base + size * 4), None);
        assert_eq!(fl.sizeof_ptr(base, base.wrapping_sub(PAGE)), None);
    }

    #[test]
    fn merge_restores_full_region_in_order() {
        let base = 0x40000;
        let size = 64usize;
        let (l, u) = (4, 6);
        let mut fl = FreeList::create(size, l, u).unwrap();
        seed(&mut fl, base, size, l, u);

        let a = fl.alloc(base, l).unwrap();
        let b = fl.alloc(base, l).unwrap();
        let c = fl.alloc(base, l).unwrap();
        let d = fl.alloc(base, l).unwrap();
        assert!(fl.alloc(base, l).is_none());

        fl.free(base, a, l);
        fl.free(base, b, l);
        fl.free(base, c, l);
        fl.free(base, d, l);

        assert!(fl.heads[fl.idx(l)].is_null());
        assert!(fl.heads[fl.idx(l + 1)].is_null());
        assert_eq!(fl.heads[fl.idx(u)], base as *mut u8);
    }
}
