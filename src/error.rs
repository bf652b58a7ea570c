//! Typed, in-band errors for recoverable conditions, plus a fatal path for
//! invariant violations.
//!
//! Recoverable failures (OS mapping failure, capacity exhaustion, an unknown
//! pointer) are never routed through [`fatal`] — they are reported in-band as
//! `Result`/`Option`/`0`, per the allocator's propagation policy. `fatal` is
//! reserved for states that mean the allocator's own bookkeeping has already
//! gone wrong (a bitmap index out of range, a double-destroy) and which this
//! crate treats as unreachable rather than user-recoverable.

use core::fmt;
use std::io;

/// Failure acquiring or releasing OS-backed virtual memory.
#[derive(Debug)]
pub enum OsMapError
{
    /// The underlying `mmap`/`munmap` call failed; `source` is the OS error.
    Mmap(io::Error),
}

impl fmt::Display for OsMapError
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self
        {
            Self::Mmap(err) => write!(f, "OS memory mapping failed: {err}"),
        }
    }
}

impl std::error::Error for OsMapError
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)>
    {
        match self
        {
            Self::Mmap(err) => Some(err),
        }
    }
}

/// Failure creating a [`crate::pool::Pool`].
#[derive(Debug)]
pub enum PoolError
{
    /// `l > u`, `u` too large for the machine word, or `size < 2^l`.
    InvalidBounds
    {
        l: u32, u: u32, size: usize,
    },
    /// The OS region (or a bitmap backing it) could not be mapped.
    Mapping(OsMapError),
}

impl fmt::Display for PoolError
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self
        {
            Self::InvalidBounds { l, u, size } => write!(
                f,
                "invalid pool bounds: l={l}, u={u}, size={size} (need 0 <= l <= u < usize::BITS and size >= 2^l)"
            ),
            Self::Mapping(err) => write!(f, "pool creation failed: {err}"),
        }
    }
}

impl std::error::Error for PoolError
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)>
    {
        match self
        {
            Self::InvalidBounds { .. } => None,
            Self::Mapping(err) => Some(err),
        }
    }
}

impl From<OsMapError> for PoolError
{
    fn from(err: OsMapError) -> Self
    {
        Self::Mapping(err)
    }
}

/// Logs `message` at `error` level and terminates the process.
///
/// Reserved for contract violations inside the allocator's own bookkeeping
/// (out-of-range bitmap index, a freelist that disagrees with its bitmap).
/// There is no recovery path for these: by the time this is called, the
/// invariants this crate relies on elsewhere have already been broken.
///
/// Implemented as a panic rather than a direct `process::abort()` so that a
/// `panic = "abort"` release profile (recommended in this crate's
/// `Cargo.toml`) terminates the process exactly as the source's `exit(1)`
/// did, while the default unwinding profile used by `cargo test` still lets
/// `#[should_panic]` tests observe the failure.
#[cold]
#[inline(never)]
pub fn fatal(message: &str) -> !
{
    log::error!("fatal allocator error: {message}");
    panic!("buddy-pool: fatal allocator error: {message}");
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn pool_error_displays_bounds()
    {
        let err = PoolError::InvalidBounds { l: 12, u: 4, size: 64 };
        let text = err.to_string();
        assert!(text.contains("l=12"));
        assert!(text.contains("u=4"));
    }

    #[test]
    fn os_map_error_wraps_io_error()
    {
        let io_err = io::Error::from_raw_os_error(libc::ENOMEM);
        let err: PoolError = OsMapError::Mmap(io_err).into();
        assert!(matches!(err, PoolError::Mapping(_)));
    }
}
