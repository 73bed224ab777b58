use std::hint;
use std::ptr;

use crate::context::Context;
use crate::scheduler::Sched;

/// Execution state of a coroutine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Status {
    /// Spawned but never resumed.
    Ready,
    /// Currently executing on the shared stack.
    Running,
    /// Yielded; the live stack bytes are held in a private snapshot.
    Suspended,
    /// Finished executing, or no coroutine exists at the queried id.
    Dead,
}

/// Entry function of a coroutine.
pub type EntryFn = Box<dyn FnOnce(&Yielder)>;

/// Per-coroutine record.
///
/// Records are boxed by the scheduler so that `ctx` never moves between the
/// moment an execution state is saved into it and the moment that state is
/// resumed.
pub struct Coroutine {
    /// Taken on first entry; `None` once the coroutine has started.
    pub(crate) entry: Option<EntryFn>,
    pub(crate) ctx: Context,
    pub(crate) snapshot: Snapshot,
    pub(crate) status: Status,
}

impl Coroutine {
    pub fn new(entry: EntryFn) -> Self {
        Self {
            entry: Some(entry),
            ctx: Context::new(),
            snapshot: Snapshot::new(),
            status: Status::Ready,
        }
    }
}

/// A coroutine's saved stack bytes while it is suspended.
///
/// The buffer's capacity only ever grows: when a save needs more room than
/// the current allocation, the old buffer is replaced by one of exactly the
/// needed size. Idle coroutines thus retain only the bytes they were
/// actually using at their deepest yield so far.
pub struct Snapshot {
    buf: Vec<u8>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Copies the `len` live bytes starting at `top` into the buffer.
    ///
    /// # Safety
    ///
    /// `top..top + len` must be readable.
    pub unsafe fn save(&mut self, top: *const u8, len: usize) {
        if self.buf.capacity() < len {
            self.buf = Vec::with_capacity(len);
        }
        ptr::copy_nonoverlapping(top, self.buf.as_mut_ptr(), len);
        self.buf.set_len(len);
    }

    /// Copies the saved bytes back to the top of a stack whose base (highest
    /// address) is `base`.
    ///
    /// # Safety
    ///
    /// The `len()` bytes below `base` must be writable and not in use by any
    /// live execution.
    pub unsafe fn restore_to(&self, base: *mut u8) {
        let top = base.sub(self.buf.len());
        ptr::copy_nonoverlapping(self.buf.as_ptr(), top, self.buf.len());
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }
}

/// `Yielder` is an interface provided to a coroutine which allows it to
/// suspend itself.
///
/// It is handed by reference to the entry function and cannot be obtained
/// any other way, so only code running inside a coroutine can yield.
pub struct Yielder {
    sched: *mut Sched,
    id: usize,
}

impl Yielder {
    pub(crate) fn new(sched: *mut Sched, id: usize) -> Self {
        Self { sched, id }
    }

    /// Suspends the currently running coroutine.
    ///
    /// The coroutine's live stack bytes are copied into its private snapshot
    /// and control switches back to the caller of `Scheduler::resume`. This
    /// function returns once `resume` is called again for this coroutine,
    /// with every local that was live at the call site restored bitwise.
    ///
    /// # Panics
    ///
    /// Panics if the calling code is not executing on the shared stack of
    /// the owning scheduler, or if the live stack extent exceeds the shared
    /// stack size (overflow detected after the fact).
    pub fn suspend(&self) {
        unsafe {
            let sched = self.sched;
            let id = (*sched)
                .running
                .expect("suspend called while no coroutine is running");
            assert_eq!(id, self.id, "suspend called through a stale yielder");

            save_live_stack(sched, id);

            let co = (&mut (*sched).slots)[id]
                .as_deref_mut()
                .expect("running slot is empty");
            co.status = Status::Suspended;
            (*sched).running = None;
            Context::swap(&mut co.ctx, &(*sched).main_ctx);
        }
    }
}

/// Measures the live extent of the shared stack and saves it into the
/// running coroutine's snapshot.
///
/// The extent is the distance from the stack base down to a local variable
/// of this function. Two things make that a sound proxy for the stack
/// pointer: `black_box` forces the marker into memory, and `inline(never)`
/// keeps the marker in a frame below the caller's, so the caller's full
/// frame lands inside the saved region and survives the restore.
#[inline(never)]
unsafe fn save_live_stack(sched: *mut Sched, id: usize) {
    let mut marker: u8 = 0;
    let top: *mut u8 = hint::black_box(&mut marker);

    let base = (*sched).stack.base();
    let limit = (*sched).stack.limit();
    assert!(
        (top as usize) < (base as usize),
        "suspend must execute on the shared stack"
    );
    assert!(
        (top as usize) >= (limit as usize),
        "coroutine overflowed the shared stack"
    );

    let live = base as usize - top as usize;
    let co = (&mut (*sched).slots)[id]
        .as_deref_mut()
        .expect("running slot is empty");
    co.snapshot.save(top, live);
}
