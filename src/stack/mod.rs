//! The shared execution stack.
//!
//! Every coroutine of a scheduler runs on the same fixed-size region while
//! it holds the CPU; its live bytes are copied out to a private snapshot
//! when it yields and copied back when it resumes. The region is therefore
//! scratch memory whenever no coroutine is running.
//!
//! There are no guard pages and no stack growth: overflow is detected after
//! the fact, when a coroutine yields.

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        mod unix;
        pub use self::unix::SharedStack;
    } else {
        compile_error!("costack requires mmap to allocate the shared stack");
    }
}

/// Size of the shared execution stack allocated by `Scheduler::new`.
pub const DEFAULT_STACK_SIZE: usize = 1024 * 1024;

/// Minimum size of the shared execution stack.
pub const MIN_STACK_SIZE: usize = 4096;
