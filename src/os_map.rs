//! The exclusive interface for acquiring and releasing OS-backed virtual
//! memory.
//!
//! Every byte the allocator manages — the user region, the buddy bitmaps,
//! the allocation bitmaps — comes from here and only from here, so the
//! allocator never recursively depends on a general-purpose heap (not even
//! Rust's own `#[global_allocator]`).

use std::io;
use std::ptr::NonNull;

use crate::error::OsMapError;

/// Obtains a private, anonymous, read/write, zero-initialized virtual region
/// of `bytes` bytes.
///
/// `bytes` of `0` still issues the underlying `mmap` call (the kernel is free
/// to reject it); callers in this crate never ask for a zero-byte mapping.
pub fn acquire(bytes: usize) -> Result<NonNull<u8>, OsMapError>
{
    // SAFETY: a fixed set of well-understood flags requesting a fresh,
    // anonymous (not file-backed) mapping; the kernel chooses the address.
    let addr = unsafe {
        libc::mmap(
            std::ptr::null_mut(),
            bytes,
            libc::PROT_READ | libc::PROT_WRITE,
            libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
            -1,
            0,
        )
    };

    if addr == libc::MAP_FAILED
    {
        let err = io::Error::last_os_error();
        log::error!("mmap({bytes}) failed: {err}");
        return Err(OsMapError::Mmap(err));
    }

    log::debug!("mmap acquired {bytes} bytes at {addr:p}");

    // mmap with MAP_ANONYMOUS is documented to zero-fill; NonNull::new cannot
    // fail here since we already rejected MAP_FAILED (the only sentinel).
    Ok(NonNull::new(addr as *mut u8).unwrap_or_else(|| crate::error::fatal("mmap returned null without MAP_FAILED")))
}

/// Returns a region previously obtained from [`acquire`] to the OS.
///
/// # Safety
///
/// `addr` must be a pointer returned by [`acquire`] with the same `bytes`,
/// not already released, and not in use anywhere else.
pub unsafe fn release(addr: NonNull<u8>, bytes: usize)
{
    // SAFETY: caller guarantees `addr`/`bytes` match a live `acquire` mapping.
    let rc = unsafe { libc::munmap(addr.as_ptr() as *mut libc::c_void, bytes) };

    if rc != 0
    {
        let err = io::Error::last_os_error();
        log::error!("munmap({addr:p}, {bytes}) failed: {err}");
    }
    else
    {
        log::debug!("munmap released {bytes} bytes at {addr:p}");
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn acquire_returns_zeroed_memory()
    {
        let region = acquire(4096).expect("mmap should succeed");

        // SAFETY: just-mapped region of at least 4096 bytes.
        let bytes = unsafe { std::slice::from_raw_parts(region.as_ptr(), 4096) };
        assert!(bytes.iter().all(|&b| b == 0));

        // SAFETY: releasing the same region/size we just acquired.
        unsafe { release(region, 4096) };
    }

    #[test]
    fn acquire_and_release_round_trip_repeatedly()
    {
        for _ in 0..8
        {
            let region = acquire(8192).expect("mmap should succeed");
            // SAFETY: releasing the same region/size we just acquired.
            unsafe { release(region, 8192) };
        }
    }
}
