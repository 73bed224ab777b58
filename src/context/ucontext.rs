//! Context switching through the ucontext family.
//!
//! `getcontext`/`makecontext` build a context that starts an entry function
//! on a caller-chosen stack region, with a successor context that is resumed
//! when the entry function returns. `swapcontext` atomically saves the
//! current execution state into one context and activates another.
//!
//! A `Context` must not move between the moment it captures an execution
//! state and the moment that state is resumed: on several targets the
//! saved state contains pointers into the `ucontext_t` itself (glibc's
//! x86_64 FPU save area is the classic case). The scheduler guarantees this
//! by keeping every container behind a stable heap allocation.

use std::mem;

use libc::c_int;

use super::Entry;
use crate::util;

/// An opaque container for a suspended execution state.
pub struct Context {
    inner: libc::ucontext_t,
}

impl Context {
    /// Creates an empty container. It holds no meaningful state until it is
    /// either the target of [`Context::prepare`] or the save side of a
    /// [`Context::swap`].
    pub fn new() -> Self {
        Self {
            inner: unsafe { mem::zeroed() },
        }
    }

    /// Arranges for this context to start executing `entry(arg)` on the
    /// given stack region when it is next activated. When `entry` returns,
    /// control transfers to `link`.
    ///
    /// # Safety
    ///
    /// `stack_limit..stack_limit + stack_size` must be a writable region not
    /// in use by any live execution, and `link` must outlive any activation
    /// of this context.
    pub unsafe fn prepare(
        &mut self,
        stack_limit: *mut u8,
        stack_size: usize,
        link: *mut Context,
        entry: Entry,
        arg: usize,
    ) {
        let ret = libc::getcontext(&mut self.inner);
        assert_eq!(ret, 0, "getcontext failed");

        self.inner.uc_stack.ss_sp = stack_limit.cast();
        self.inner.uc_stack.ss_size = stack_size;
        self.inner.uc_stack.ss_flags = 0;
        self.inner.uc_link = &mut (*link).inner;

        // The entry convention carries int arguments only; the pointer-sized
        // argument travels as two halves.
        let (low, high) = util::split_ptr(arg);
        let entry: extern "C" fn() = mem::transmute(entry);
        libc::makecontext(&mut self.inner, entry, 2, low as c_int, high as c_int);
    }

    /// Saves the current execution state into `save` and resumes `load`.
    /// Returns when `save` is next activated.
    ///
    /// Inlined so that the saved state resumes directly into the caller's
    /// frame; a wrapper frame would not survive a stack snapshot taken by
    /// the caller.
    ///
    /// # Safety
    ///
    /// `load` must hold a valid execution state, and the stack that state
    /// runs on must be ready for it (for a snapshotted coroutine, the
    /// snapshot must already be copied back).
    #[inline(always)]
    pub unsafe fn swap(save: *mut Context, load: *const Context) {
        let ret = libc::swapcontext(&mut (*save).inner, &(*load).inner);
        assert_eq!(ret, 0, "swapcontext failed");
    }
}
