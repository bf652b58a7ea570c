//! A pool-based buddy-system memory allocator.
//!
//! A [`Pool`] partitions one OS-mapped virtual memory region into
//! power-of-two sized blocks (`2^l ..= 2^u` bytes), splitting larger free
//! blocks to satisfy smaller requests and coalescing adjacent "buddy"
//! blocks back together on release. Each pool is single-threaded,
//! self-contained, and owns every byte it uses — including its own
//! bookkeeping bitmaps — so it never recurses into a general-purpose heap.
//!
//! ```
//! use buddy_pool::Pool;
//!
//! let mut pool = Pool::create(64 * 1024, 4, 12).expect("mmap should succeed");
//! let p = pool.allocate(100).expect("pool has room");
//! assert_eq!(pool.sizeof(p.as_ptr()), 128);
//! pool.release(p.as_ptr());
//! ```

mod arithmetic;
mod bit_vec;
mod buddy_map;
pub mod deque;
pub mod error;
mod free_list;
pub mod logger;
mod os_map;
mod pool;

pub use error::{OsMapError, PoolError};
pub use pool::Pool;
