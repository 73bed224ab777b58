use std::io::{Error, Result};
use std::ptr;

use super::MIN_STACK_SIZE;

fn page_size() -> usize {
    let pagesize = unsafe { libc::sysconf(libc::_SC_PAGESIZE) } as usize;
    assert!(pagesize.is_power_of_two());
    pagesize
}

/// Shared stack implementation which uses `mmap`.
pub struct SharedStack {
    mmap: *mut u8,
    mmap_len: usize,
}

impl SharedStack {
    /// Allocates a stack region of at least the given size, rounded up to a
    /// page boundary. The whole region is readable and writable; snapshots
    /// restored by the scheduler land at its top.
    pub fn new(size: usize) -> Result<Self> {
        let size = size.max(MIN_STACK_SIZE);

        let page_size = page_size();
        let mmap_len = size
            .checked_add(page_size - 1)
            .expect("integer overflow while calculating stack size")
            & !(page_size - 1);

        unsafe {
            let mmap = libc::mmap(
                ptr::null_mut(),
                mmap_len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_ANONYMOUS | libc::MAP_PRIVATE,
                -1,
                0,
            );
            if mmap == libc::MAP_FAILED {
                return Err(Error::last_os_error());
            }

            Ok(Self {
                mmap: mmap.cast(),
                mmap_len,
            })
        }
    }

    /// Returns the base address of the stack. This is the highest address
    /// since the stack grows downwards.
    #[inline]
    pub fn base(&self) -> *mut u8 {
        unsafe { self.mmap.add(self.mmap_len) }
    }

    /// Returns the limit address of the stack. This is the lowest address.
    #[inline]
    pub fn limit(&self) -> *mut u8 {
        self.mmap
    }

    /// Usable size of the region in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.mmap_len
    }
}

impl Drop for SharedStack {
    fn drop(&mut self) {
        unsafe {
            let ret = libc::munmap(self.mmap.cast(), self.mmap_len);
            debug_assert_eq!(ret, 0);
        }
    }
}
