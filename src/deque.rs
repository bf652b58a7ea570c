//! A generic doubly-linked deque.
//!
//! This is a plain client of the ordinary Rust heap (`Box`-owned nodes) —
//! unlike [`crate::free_list::FreeList`], it does not thread itself through
//! [`crate::os_map`]-backed memory, and it is not part of the allocator's
//! testable core. It exists as the allocator's supplementary collaborator
//! surface: symmetric head/tail `put`/`get`/`ith`/`remove`, plus a `map` over
//! the elements head-to-tail.
//!
//! The symmetry comes from keeping one array of two neighbor pointers per
//! node, indexed by [`End`], rather than separate `prev`/`next` fields: the
//! head-side operations and tail-side operations are the same code with
//! `Head`/`Tail` swapped, so there is exactly one `put`, one `get`, one
//! `ith`, and one `remove` implementation instead of four.

use std::ptr::NonNull;

/// Which end of the deque an operation addresses.
#[derive(Clone, Copy, PartialEq, Eq)]
enum End
{
    Head = 0,
    Tail = 1,
}

impl End
{
    #[inline]
    const fn other(self) -> Self
    {
        match self
        {
            End::Head => End::Tail,
            End::Tail => End::Head,
        }
    }
}

struct Node<T>
{
    /// `np[Head]` points toward the head end, `np[Tail]` toward the tail end.
    np: [Option<NonNull<Node<T>>>; 2],
    data: T,
}

/// A generic doubly-linked deque with symmetric operations on both ends.
pub struct Deque<T>
{
    ht: [Option<NonNull<Node<T>>>; 2],
    len: usize,
}

impl<T> Deque<T>
{
    pub fn new() -> Self
    {
        Self { ht: [None, None], len: 0 }
    }

    pub fn len(&self) -> usize
    {
        self.len
    }

    pub fn is_empty(&self) -> bool
    {
        self.len == 0
    }

    /// Adds `data` at end `e`.
    fn put(&mut self, e: End, data: T)
    {
        let mut node = Box::new(Node { np: [None, None], data });
        node.np[e as usize] = None;
        node.np[e.other() as usize] = self.ht[e as usize];

        // SAFETY: `Box::into_raw` always yields a non-null pointer.
        let node = unsafe { NonNull::new_unchecked(Box::into_raw(node)) };

        if self.len == 0
        {
            self.ht[End::Head as usize] = Some(node);
            self.ht[End::Tail as usize] = Some(node);
        }
        else
        {
            // SAFETY: the current end node is a live, exclusively-owned node.
            unsafe { (*self.ht[e as usize].unwrap().as_ptr()).np[e as usize] = Some(node) };
            self.ht[e as usize] = Some(node);
        }
        self.len += 1;
    }

    /// Removes and returns the element at end `e`.
    fn get(&mut self, e: End) -> Option<T>
    {
        let node = self.ht[e as usize]?;
        // SAFETY: `node` is a live, uniquely-owned node taken back from the
        // list below; we never touch it again through `self`.
        let boxed = unsafe { Box::from_raw(node.as_ptr()) };

        if self.len == 1
        {
            self.ht[End::Head as usize] = None;
            self.ht[End::Tail as usize] = None;
        }
        else
        {
            let inward = boxed.np[e.other() as usize].unwrap();
            self.ht[e as usize] = Some(inward);
            // SAFETY: `inward` is a live node; it becomes the new end.
            unsafe { (*inward.as_ptr()).np[e as usize] = None };
        }
        self.len -= 1;
        Some(boxed.data)
    }

    /// Returns a reference to the `i`-th element counting inward from end
    /// `e`, `0`-indexed. Panics if `i` is out of bounds.
    fn ith(&self, e: End, i: usize) -> &T
    {
        assert!(i < self.len, "deque index out of bounds: {i} >= {}", self.len);

        let mut curr = self.ht[e as usize].expect("non-empty deque has an end node");
        for _ in 0..i
        {
            // SAFETY: bounds already checked against `self.len`.
            curr = unsafe { (*curr.as_ptr()).np[e.other() as usize].unwrap() };
        }
        // SAFETY: `curr` is a live node owned by `self`.
        unsafe { &(*curr.as_ptr()).data }
    }

    pub fn head_put(&mut self, data: T)
    {
        self.put(End::Head, data)
    }
    pub fn head_get(&mut self) -> Option<T>
    {
        self.get(End::Head)
    }
    pub fn head_ith(&self, i: usize) -> &T
    {
        self.ith(End::Head, i)
    }

    pub fn tail_put(&mut self, data: T)
    {
        self.put(End::Tail, data)
    }
    pub fn tail_get(&mut self) -> Option<T>
    {
        self.get(End::Tail)
    }
    pub fn tail_ith(&self, i: usize) -> &T
    {
        self.ith(End::Tail, i)
    }

    /// Removes the first element equal to `data`, searching inward from end
    /// `e`. Returns the removed value if found.
    fn rem(&mut self, e: End, data: &T) -> Option<T>
    where
        T: PartialEq,
    {
        let mut curr = self.ht[e as usize];
        while let Some(node) = curr
        {
            // SAFETY: `node` is a live node owned by `self`.
            let node_ref = unsafe { &*node.as_ptr() };
            if &node_ref.data == data
            {
                let outward = node_ref.np[e as usize];
                let inward = node_ref.np[e.other() as usize];

                match outward
                {
                    // SAFETY: `outward` is a live node.
                    Some(o) => unsafe { (*o.as_ptr()).np[e.other() as usize] = inward },
                    None => self.ht[e as usize] = inward,
                }
                match inward
                {
                    // SAFETY: `inward` is a live node.
                    Some(n) => unsafe { (*n.as_ptr()).np[e as usize] = outward },
                    None => self.ht[e.other() as usize] = outward,
                }

                // SAFETY: `node` has just been unlinked from both ends.
                let boxed = unsafe { Box::from_raw(node.as_ptr()) };
                self.len -= 1;
                return Some(boxed.data);
            }
            curr = node_ref.np[e.other() as usize];
        }
        None
    }

    pub fn head_rem(&mut self, data: &T) -> Option<T>
    where
        T: PartialEq,
    {
        self.rem(End::Head, data)
    }
    pub fn tail_rem(&mut self, data: &T) -> Option<T>
    where
        T: PartialEq,
    {
        self.rem(End::Tail, data)
    }

    /// Calls `f` on every element, head to tail.
    pub fn map(&self, mut f: impl FnMut(&T))
    {
        let mut curr = self.ht[End::Head as usize];
        while let Some(node) = curr
        {
            // SAFETY: `node` is a live node owned by `self`.
            let node_ref = unsafe { &*node.as_ptr() };
            f(&node_ref.data);
            curr = node_ref.np[End::Tail as usize];
        }
    }
}

impl<T> Default for Deque<T>
{
    fn default() -> Self
    {
        Self::new()
    }
}

impl<T> Drop for Deque<T>
{
    fn drop(&mut self)
    {
        while self.get(End::Head).is_some() {}
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn put_and_get_are_symmetric()
    {
        let mut q: Deque<&str> = Deque::new();
        q.head_put("First");
        q.tail_put("Last");
        q.head_put("NewHead");

        assert_eq!(q.len(), 3);
        assert_eq!(q.head_ith(0), &"NewHead");
        assert_eq!(q.tail_ith(0), &"Last");
    }

    #[test]
    fn get_drains_in_lifo_order_from_each_end()
    {
        let mut q: Deque<i32> = Deque::new();
        for v in 1..=4
        {
            q.tail_put(v);
        }
        assert_eq!(q.head_get(), Some(1));
        assert_eq!(q.tail_get(), Some(4));
        assert_eq!(q.head_get(), Some(2));
        assert_eq!(q.tail_get(), Some(3));
        assert_eq!(q.head_get(), None);
        assert!(q.is_empty());
    }

    #[test]
    fn rem_unlinks_from_the_middle()
    {
        let mut q: Deque<i32> = Deque::new();
        q.tail_put(1);
        q.tail_put(2);
        q.tail_put(3);

        assert_eq!(q.head_rem(&2), Some(2));
        assert_eq!(q.len(), 2);
        assert_eq!(q.head_ith(0), &1);
        assert_eq!(q.head_ith(1), &3);
        assert_eq!(q.head_rem(&99), None);
    }

    #[test]
    fn map_visits_head_to_tail()
    {
        let mut q: Deque<i32> = Deque::new();
        q.tail_put(1);
        q.tail_put(2);
        q.tail_put(3);

        let mut seen = Vec::new();
        q.map(|v| seen.push(*v));
        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[test]
    fn drop_releases_all_nodes()
    {
        let mut q: Deque<Box<i32>> = Deque::new();
        for v in 0..100
        {
            q.tail_put(Box::new(v));
        }
        drop(q);
    }
}
