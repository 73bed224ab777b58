//! ## Overview
//!
//! This crate provides a single-threaded, cooperative coroutine runtime
//! built around a stack-copying strategy. Every coroutine of a
//! [`Scheduler`] executes on one shared, fixed-size stack; when a coroutine
//! yields, the stack bytes it was actually using are copied out into a
//! private heap buffer, and when it is resumed they are copied back. This
//! trades a memcpy per switch for very low per-coroutine memory overhead:
//! an idle coroutine holds exactly its live bytes, not a reserved stack
//! region.
//!
//! Coroutines are identified by small integer ids. The caller — always
//! running on the scheduler's main context — drives execution explicitly
//! with [`Scheduler::resume`]; a coroutine hands the CPU back with
//! [`Yielder::suspend`]. There is no preemption and no background progress:
//! between two calls into the scheduler, nothing moves.
//!
//! ## Example
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use costack::{Scheduler, Status};
//!
//! let log = Rc::new(RefCell::new(Vec::new()));
//!
//! let mut scheduler = Scheduler::new();
//! let pair: Vec<usize> = ["ping", "pong"]
//!     .iter()
//!     .map(|&name| {
//!         let log = log.clone();
//!         scheduler.spawn(move |yielder| {
//!             for round in 1..=2 {
//!                 log.borrow_mut().push(format!("{name} {round}"));
//!                 yielder.suspend();
//!             }
//!         })
//!     })
//!     .collect();
//!
//! while !scheduler.is_empty() {
//!     for &id in &pair {
//!         if scheduler.status(id) != Status::Dead {
//!             scheduler.resume(id);
//!         }
//!     }
//! }
//!
//! assert_eq!(
//!     log.borrow().as_slice(),
//!     ["ping 1", "pong 1", "ping 2", "pong 2"],
//! );
//! ```
//!
//! ## Supported targets
//!
//! The runtime needs a context primitive that can point a fresh context at
//! a caller-chosen stack region and that activates a successor context when
//! the entry function returns. It currently uses the ucontext family, which
//! restricts it to Linux with glibc. The save/restore machinery assumes a
//! descending stack.
//!
//! ## Caveats
//!
//! - A coroutine that blocks, blocks every coroutine of its scheduler.
//! - There is no cancellation. A suspended coroutine that is never resumed
//!   is destroyed with the scheduler, but its saved stack is not unwound;
//!   see the [`Scheduler`] docs for the leak this implies.
//! - Panics inside a coroutine are caught at its root and resume unwinding
//!   from the `resume` call that was driving it.

#![warn(missing_docs)]

mod context;
mod coroutine;
mod scheduler;
mod stack;
mod unwind;
mod util;

pub use coroutine::{Status, Yielder};
pub use scheduler::Scheduler;
pub use stack::DEFAULT_STACK_SIZE;

#[cfg(test)]
mod tests;
