//! The machine-context primitive that all control transfers go through.
//!
//! A [`Context`] is an opaque value sufficient to resume a suspended
//! execution: program counter, stack pointer and callee-saved registers.
//! The core operations are:
//! - `prepare` to install an entry function on a stack region for the first
//!   resume, together with a successor context that receives control when
//!   the entry function returns.
//! - `swap` to save the current state into one container and resume another.
//!
//! The successor semantics are essential to the scheduler: when a coroutine
//! returns from its entry function, control transfers back to the main
//! context with no further action on the coroutine side.

cfg_if::cfg_if! {
    if #[cfg(all(target_os = "linux", target_env = "gnu"))] {
        mod ucontext;
        pub use self::ucontext::Context;
    } else {
        compile_error!(
            "costack needs a context primitive that can redirect the stack \
             region before first entry; only the ucontext family provides \
             one on supported targets"
        );
    }
}

/// Signature of a context entry point.
///
/// The two arguments are the halves of a pointer-sized value, see
/// [`crate::util::split_ptr`].
pub type Entry = extern "C" fn(u32, u32);
