//! Page provider. Whole pages of anonymous memory straight from the kernel,
//! with no allocator in between.

use std::{io, ptr::NonNull, sync::OnceLock};

use tracing::{trace, warn};

use crate::error::{CatalogError, Result};

/// Virtual memory page size of the computer. This is usually 4096.
/// We can't know it at compile time so it is queried once and cached.
static PAGE_SIZE: OnceLock<usize> = OnceLock::new();

/// Marker type the platform specific memory operations hang off.
pub(crate) struct Kernel;

/// This trait provides an abstraction to handle low level memory operations
/// and syscalls. The catalog has nothing to do with the concrete APIs
/// offered by each kernel.
trait PlatformMemory {
    /// Name of the syscall behind [`PlatformMemory::request_memory`], for logs.
    const REQUEST_CALL: &'static str;

    /// Name of the syscall behind [`PlatformMemory::return_memory`].
    const RETURN_CALL: &'static str;

    /// Request a memory region of size `len`. It returns a pointer to the
    /// given location or None if the underlying syscall fails.
    unsafe fn request_memory(len: usize) -> Option<NonNull<u8>>;

    /// Returns the memory of size `len` starting from `addr` back to the kernel.
    /// Returns `false` if the kernel refused.
    unsafe fn return_memory(addr: NonNull<u8>, len: usize) -> bool;

    /// Returns the virtual memory page size of the computer in bytes.
    unsafe fn page_size() -> usize;
}

/// Native page size, cached for the lifetime of the process.
#[inline]
pub fn system_page_size() -> usize {
    *PAGE_SIZE.get_or_init(|| unsafe { Kernel::page_size() })
}

fn region_len(units: usize, page_size: usize) -> Option<usize> {
    match units.checked_mul(page_size) {
        Some(0) | None => None,
        Some(len) => Some(len),
    }
}

/// Maps `units * page_size` bytes of private anonymous memory and fills it
/// with zeroes.
///
/// The returned region belongs to the caller until it is handed back through
/// [`release`].
pub fn acquire(units: usize, page_size: usize) -> Result<NonNull<u8>> {
    let Some(len) = region_len(units, page_size) else {
        warn!(units, page_size, "refusing to map an empty or overflowing region");
        return Err(CatalogError::AllocationFailed {
            bytes: units.saturating_mul(page_size),
        });
    };

    let Some(addr) = (unsafe { Kernel::request_memory(len) }) else {
        let error = io::Error::last_os_error();
        warn!(call = Kernel::REQUEST_CALL, bytes = len, %error, "failed to map pages");
        return Err(CatalogError::AllocationFailed { bytes: len });
    };

    // Anonymous mappings already come zeroed on every platform we support,
    // but the catalog relies on it so we don't take it for granted.
    unsafe { addr.as_ptr().write_bytes(0, len) };

    trace!(bytes = len, ?addr, "mapped pages");
    Ok(addr)
}

/// Gives a region obtained from [`acquire`] back to the kernel.
///
/// # Safety
///
/// `addr` must come from [`acquire`] with the same `units` and `page_size`,
/// and nothing may touch the region afterwards.
pub unsafe fn release(addr: NonNull<u8>, units: usize, page_size: usize) -> Result<()> {
    let bytes = units.saturating_mul(page_size);

    if unsafe { Kernel::return_memory(addr, bytes) } {
        trace!(bytes, ?addr, "unmapped pages");
        Ok(())
    } else {
        let error = io::Error::last_os_error();
        warn!(call = Kernel::RETURN_CALL, bytes, ?addr, %error, "failed to unmap pages");
        Err(CatalogError::ReleaseFailed { bytes })
    }
}

#[cfg(unix)]
mod unix {
    use super::{Kernel, PlatformMemory};

    use libc::{mmap, munmap, off_t, size_t};

    use std::{
        os::raw::{c_int, c_void},
        ptr::NonNull,
    };

    impl PlatformMemory for Kernel {
        const REQUEST_CALL: &'static str = "mmap";
        const RETURN_CALL: &'static str = "munmap";

        unsafe fn request_memory(len: usize) -> Option<NonNull<u8>> {
            // mmap parameters.
            const ADDR: *mut c_void = std::ptr::null_mut::<c_void>();
            // Read-Write only memory.
            const PROT: c_int = libc::PROT_READ | libc::PROT_WRITE;
            const FLAGS: c_int = libc::MAP_PRIVATE | libc::MAP_ANONYMOUS;
            const FD: c_int = -1;
            const OFFSET: off_t = 0;

            let addr = unsafe { mmap(ADDR, len as size_t, PROT, FLAGS, FD, OFFSET) };

            if addr == libc::MAP_FAILED {
                return None;
            }

            NonNull::new(addr.cast::<u8>())
        }

        unsafe fn return_memory(addr: NonNull<u8>, len: usize) -> bool {
            unsafe { munmap(addr.as_ptr().cast::<c_void>(), len as size_t) == 0 }
        }

        unsafe fn page_size() -> usize {
            unsafe { libc::sysconf(libc::_SC_PAGE_SIZE) as usize }
        }
    }
}

#[cfg(windows)]
mod windows {
    use std::{mem::MaybeUninit, os::raw::c_void, ptr::NonNull};

    use crate::kernel::{Kernel, PlatformMemory};

    use windows::Win32::System::{Memory, SystemInformation};

    impl PlatformMemory for Kernel {
        const REQUEST_CALL: &'static str = "VirtualAlloc";
        const RETURN_CALL: &'static str = "VirtualFree";

        unsafe fn request_memory(len: usize) -> Option<NonNull<u8>> {
            // Read-Write only.
            let protection = Memory::PAGE_READWRITE;

            let flags = Memory::MEM_RESERVE | Memory::MEM_COMMIT;

            unsafe {
                let addr = Memory::VirtualAlloc(None, len, flags, protection);

                NonNull::new(addr.cast())
            }
        }

        unsafe fn return_memory(addr: NonNull<u8>, _len: usize) -> bool {
            unsafe {
                Memory::VirtualFree(addr.as_ptr().cast::<c_void>(), 0, Memory::MEM_RELEASE).is_ok()
            }
        }

        unsafe fn page_size() -> usize {
            unsafe {
                let mut system_info = MaybeUninit::uninit();
                SystemInformation::GetSystemInfo(system_info.as_mut_ptr());

                system_info.assume_init().dwPageSize as usize
            }
        }
    }
}
