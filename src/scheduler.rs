use std::io;
use std::mem;

use crate::context::Context;
use crate::coroutine::{Coroutine, Status, Yielder};
use crate::stack::{SharedStack, DEFAULT_STACK_SIZE};
use crate::unwind::{self, CaughtPanic};
use crate::util;

/// Initial capacity of the coroutine table.
const INITIAL_COROUTINES: usize = 16;

/// Scheduler state shared between the main context and the launcher.
///
/// Boxed behind [`Scheduler`] so its address is stable: the launcher and
/// every [`Yielder`] reach it through a raw pointer, and the main context
/// container must not move while a coroutine holds a reference to it as its
/// successor.
pub(crate) struct Sched {
    pub(crate) stack: SharedStack,
    pub(crate) main_ctx: Context,
    pub(crate) slots: Vec<Option<Box<Coroutine>>>,
    pub(crate) count: usize,
    pub(crate) running: Option<usize>,
    pub(crate) pending_panic: Option<CaughtPanic>,
}

/// A single-threaded, cooperative coroutine scheduler.
///
/// All coroutines of a scheduler execute on one shared stack. When a
/// coroutine yields, the bytes it was actually using are copied out into a
/// private heap snapshot; when it is resumed, they are copied back. Idle
/// coroutines therefore cost only their live bytes, not a reserved stack
/// region.
///
/// Control moves only at explicit points: [`resume`](Scheduler::resume)
/// suspends the caller until the coroutine yields or returns, and
/// [`Yielder::suspend`] hands the CPU back. There is no preemption, no
/// ready-queue and no inter-coroutine switch; the caller decides which
/// coroutine runs next.
///
/// # Dropping a scheduler
///
/// Dropping a scheduler destroys every remaining coroutine record. A
/// coroutine that is suspended at that point is *not* resumed or unwound:
/// its entry closure's captured environment and its snapshot buffer are
/// freed, but destructors of locals that were live at its yield point do
/// not run. Resources owned by such locals leak unless the coroutine is
/// driven to completion first.
///
/// # Threads
///
/// A scheduler is owned by exactly one thread; it is neither `Send` nor
/// `Sync`:
///
/// ```compile_fail
/// fn send<T: Send>() {}
/// send::<costack::Scheduler>();
/// ```
pub struct Scheduler {
    pub(crate) inner: Box<Sched>,
}

impl Scheduler {
    /// Creates a scheduler with the default 1 MiB shared stack.
    ///
    /// # Panics
    ///
    /// Panics if the stack region cannot be allocated.
    pub fn new() -> Self {
        Self::with_stack_size(DEFAULT_STACK_SIZE).expect("failed to allocate the shared stack")
    }

    /// Creates a scheduler whose shared stack has at least the given size.
    ///
    /// The size bounds the total live stack of any single coroutine; a
    /// coroutine that grows past it is caught by an assertion when it next
    /// yields.
    pub fn with_stack_size(size: usize) -> io::Result<Self> {
        Ok(Self {
            inner: Box::new(Sched {
                stack: SharedStack::new(size)?,
                main_ctx: Context::new(),
                slots: (0..INITIAL_COROUTINES).map(|_| None).collect(),
                count: 0,
                running: None,
                pending_panic: None,
            }),
        })
    }

    /// Creates a coroutine that will execute `f` when first resumed.
    ///
    /// Returns the coroutine's id: a small integer that stays valid until
    /// the coroutine finishes, after which it may be reused by a later
    /// spawn. The entry function is not invoked here; the new coroutine is
    /// [`Status::Ready`].
    pub fn spawn<F>(&mut self, f: F) -> usize
    where
        F: FnOnce(&Yielder) + 'static,
    {
        let sched = &mut *self.inner;
        let co = Box::new(Coroutine::new(Box::new(f)));

        let capacity = sched.slots.len();
        if sched.count == capacity {
            // Full table: double it and take the first fresh slot.
            sched.slots.resize_with(capacity * 2, || None);
            sched.slots[capacity] = Some(co);
            sched.count += 1;
            return capacity;
        }

        // Scan for a free slot starting at the live count, wrapping.
        for i in 0..capacity {
            let id = (i + sched.count) % capacity;
            if sched.slots[id].is_none() {
                sched.slots[id] = Some(co);
                sched.count += 1;
                return id;
            }
        }
        unreachable!("live count below capacity but no free slot");
    }

    /// Transfers control to the coroutine `id` until it yields or returns.
    ///
    /// Resuming a dead id is a no-op. On return the coroutine is either
    /// [`Status::Suspended`] or [`Status::Dead`]; nothing runs in the
    /// background.
    ///
    /// If the coroutine panicked, its record is destroyed and the panic
    /// resumes unwinding from this call.
    ///
    /// # Panics
    ///
    /// Panics if called while a coroutine is running (resume is only valid
    /// from the main context) or if `id` is outside the table.
    pub fn resume(&mut self, id: usize) {
        let sched: *mut Sched = &mut *self.inner;
        unsafe {
            assert!(
                (*sched).running.is_none(),
                "resume called while a coroutine is running"
            );
            assert!(id < (*sched).slots.len(), "coroutine id out of range");

            let co: *mut Coroutine = match (&mut (*sched).slots)[id].as_deref_mut() {
                Some(co) => co,
                // Empty slot: the coroutine is dead and resume is a no-op.
                None => return,
            };

            match (*co).status {
                Status::Ready => {
                    // First entry: install the launcher on the shared stack
                    // with the main context as successor, so a returning
                    // entry function transfers straight back here.
                    (*co).ctx.prepare(
                        (*sched).stack.limit(),
                        (*sched).stack.size(),
                        &mut (*sched).main_ctx,
                        launch,
                        sched as usize,
                    );
                    (*co).status = Status::Running;
                    (*sched).running = Some(id);
                    Context::swap(&mut (*sched).main_ctx, &(*co).ctx);
                }
                Status::Suspended => {
                    // The snapshot goes back to the top of the shared stack
                    // before the switch; the coroutine wakes up inside the
                    // suspend that saved it.
                    (*co).snapshot.restore_to((*sched).stack.base());
                    (*co).status = Status::Running;
                    (*sched).running = Some(id);
                    Context::swap(&mut (*sched).main_ctx, &(*co).ctx);
                }
                Status::Running | Status::Dead => {
                    unreachable!("coroutine record in impossible state");
                }
            }
        }

        // Back on the main context: the coroutine yielded or finished. A
        // panic caught at its root continues unwinding here.
        unwind::maybe_resume_unwind(self.inner.pending_panic.take());
    }

    /// Returns the status of the coroutine `id`.
    ///
    /// Ids that were never spawned, have finished, or lie outside the table
    /// all answer [`Status::Dead`].
    pub fn status(&self, id: usize) -> Status {
        match self.inner.slots.get(id) {
            Some(Some(co)) => co.status,
            _ => Status::Dead,
        }
    }

    /// Returns the id of the currently running coroutine, or `None` when
    /// the main context holds the CPU.
    pub fn running(&self) -> Option<usize> {
        self.inner.running
    }

    /// Number of live coroutines (ready, running or suspended).
    pub fn len(&self) -> usize {
        self.inner.count
    }

    /// Whether no coroutines are live.
    pub fn is_empty(&self) -> bool {
        self.inner.count == 0
    }

    /// Current capacity of the coroutine table. Starts at 16 and doubles
    /// whenever a spawn finds the table full; ids are never renumbered by
    /// growth.
    pub fn capacity(&self) -> usize {
        self.inner.slots.len()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        assert!(
            self.inner.running.is_none(),
            "scheduler dropped while a coroutine is running"
        );

        // Destroying a record only frees its entry closure and snapshot;
        // suspended stacks are never unwound. A panic out of a captured
        // environment's drop must not escape a Drop impl, force an abort
        // using a double-panic.
        let guard = scopeguard::guard((), |()| {
            panic!("panic while destroying coroutines");
        });
        self.inner.slots.clear();
        self.inner.count = 0;
        mem::forget(guard);
    }
}

/// Entry point of every coroutine, running on the shared stack.
///
/// Receives the scheduler pointer split across the two integer arguments of
/// the context entry convention. Runs the user's entry function, then
/// destroys the record and clears the slot; the successor context installed
/// by `prepare` returns control to the main context once this function
/// returns.
extern "C" fn launch(low: u32, high: u32) {
    let sched = util::join_ptr(low, high) as *mut Sched;
    unsafe {
        let id = (*sched)
            .running
            .expect("launcher entered with no running coroutine");
        let entry = (&mut (*sched).slots)[id]
            .as_deref_mut()
            .expect("running slot is empty")
            .entry
            .take()
            .expect("coroutine entered twice");

        let yielder = Yielder::new(sched, id);
        if let Err(payload) = unwind::catch_unwind_at_root(move || entry(&yielder)) {
            (*sched).pending_panic = Some(payload);
        }

        (&mut (*sched).slots)[id] = None;
        (*sched).count -= 1;
        (*sched).running = None;
    }
}
