use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use crate::{Scheduler, Status};

#[test]
fn spawn_leaves_coroutine_ready() {
    let mut sched = Scheduler::new();
    assert!(sched.is_empty());
    let id = sched.spawn(|_| {});
    assert_eq!(sched.status(id), Status::Ready);
    assert_eq!(sched.running(), None);
    assert_eq!(sched.len(), 1);
}

#[test]
fn single_coroutine_runs_in_three_legs() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut sched = Scheduler::new();
    let log2 = log.clone();
    let id = sched.spawn(move |y| {
        log2.borrow_mut().push("A");
        y.suspend();
        log2.borrow_mut().push("B");
        y.suspend();
        log2.borrow_mut().push("C");
    });

    sched.resume(id);
    assert_eq!(log.borrow().as_slice(), ["A"]);
    assert_eq!(sched.status(id), Status::Suspended);
    assert_eq!(sched.running(), None);

    sched.resume(id);
    assert_eq!(log.borrow().as_slice(), ["A", "B"]);
    assert_eq!(sched.status(id), Status::Suspended);

    sched.resume(id);
    assert_eq!(log.borrow().as_slice(), ["A", "B", "C"]);
    assert_eq!(sched.status(id), Status::Dead);
    assert!(sched.is_empty());
}

#[test]
fn two_coroutines_interleave() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut sched = Scheduler::new();

    let mut spawn_worker = |tag: &'static str| {
        let log = log.clone();
        sched.spawn(move |y| {
            log.borrow_mut().push(format!("{tag}1"));
            y.suspend();
            log.borrow_mut().push(format!("{tag}2"));
            y.suspend();
            log.borrow_mut().push(format!("{tag}3"));
        })
    };
    let p = spawn_worker("P");
    let q = spawn_worker("Q");

    for _ in 0..3 {
        sched.resume(p);
        sched.resume(q);
        assert_eq!(sched.running(), None);
    }

    assert_eq!(
        log.borrow().as_slice(),
        ["P1", "Q1", "P2", "Q2", "P3", "Q3"],
    );
    assert_eq!(sched.status(p), Status::Dead);
    assert_eq!(sched.status(q), Status::Dead);
    assert!(sched.is_empty());
}

#[test]
fn never_spawned_ids_are_dead() {
    let sched = Scheduler::new();
    for id in 0..sched.capacity() {
        assert_eq!(sched.status(id), Status::Dead);
    }
    // Out-of-range ids are just as dead.
    assert_eq!(sched.status(10_000), Status::Dead);
}

#[test]
fn ids_are_distinct_and_in_range() {
    let mut sched = Scheduler::new();
    let ids: Vec<usize> = (0..10).map(|_| sched.spawn(|y| y.suspend())).collect();

    let mut sorted = ids.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(sorted.len(), ids.len());
    assert!(ids.iter().all(|&id| id < sched.capacity()));
}

#[test]
fn id_reuse_after_death() {
    let mut sched = Scheduler::new();
    let a = sched.spawn(|_| {});
    sched.resume(a);
    assert_eq!(sched.status(a), Status::Dead);

    let b = sched.spawn(|_| {});
    assert_eq!(b, a);
    assert_eq!(sched.status(b), Status::Ready);
}

#[test]
fn slot_scan_starts_at_live_count() {
    let mut sched = Scheduler::new();
    let a = sched.spawn(|_| {});
    let b = sched.spawn(|_| {});
    sched.resume(a);
    assert_eq!(sched.status(a), Status::Dead);

    // One coroutine is live, so the scan starts at slot 1 and settles on
    // the slot after `b` rather than immediately recycling `a`.
    let c = sched.spawn(|_| {});
    assert_eq!(c, b + 1);
}

#[test]
fn table_growth_preserves_ids() {
    let mut sched = Scheduler::new();
    let ids: Vec<usize> = (0..20).map(|_| sched.spawn(|y| y.suspend())).collect();

    let mut sorted = ids.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(sorted.len(), 20);
    assert!(sched.capacity() >= 20);
    assert!(sched.capacity().is_power_of_two());
    assert!(ids.iter().all(|&id| id < sched.capacity()));
    assert_eq!(sched.len(), 20);

    for &id in &ids {
        sched.resume(id);
        assert_eq!(sched.status(id), Status::Suspended);
    }
    for &id in &ids {
        sched.resume(id);
        assert_eq!(sched.status(id), Status::Dead);
    }
    assert!(sched.is_empty());
}

#[test]
fn resume_of_a_dead_id_is_a_noop() {
    let mut sched = Scheduler::new();
    sched.resume(3);
    assert_eq!(sched.status(3), Status::Dead);

    let id = sched.spawn(|_| {});
    sched.resume(id);
    sched.resume(id);
    assert_eq!(sched.status(id), Status::Dead);
    assert!(sched.is_empty());
}

#[test]
#[should_panic(expected = "coroutine id out of range")]
fn resume_out_of_range_asserts() {
    let mut sched = Scheduler::new();
    let id = sched.capacity();
    sched.resume(id);
}

#[test]
fn with_stack_size_round_trips() {
    let hit = Rc::new(Cell::new(false));
    let mut sched = Scheduler::with_stack_size(64 * 1024).unwrap();
    let hit2 = hit.clone();
    let id = sched.spawn(move |y| {
        y.suspend();
        hit2.set(true);
    });
    sched.resume(id);
    sched.resume(id);
    assert!(hit.get());
}

#[test]
#[should_panic(expected = "boom")]
fn panics_propagated() {
    let dropped = Rc::new(Cell::new(false));
    let sentinel = SetOnDrop(dropped.clone());
    let mut sched = Scheduler::new();
    let id = sched.spawn(move |_| {
        let _ = &sentinel;
        panic!("boom");
    });

    let result = panic::catch_unwind(AssertUnwindSafe(|| sched.resume(id)));
    assert!(result.is_err());
    assert!(dropped.get());
    assert_eq!(sched.status(id), Status::Dead);
    assert_eq!(sched.running(), None);
    assert!(sched.is_empty());
    panic::resume_unwind(result.unwrap_err());

    struct SetOnDrop(Rc<Cell<bool>>);

    impl Drop for SetOnDrop {
        fn drop(&mut self) {
            self.0.set(true);
        }
    }
}

#[test]
fn dropping_ready_coroutine_drops_environment() {
    let payload = Rc::new(());
    let mut sched = Scheduler::new();
    let keep = payload.clone();
    sched.spawn(move |_| {
        let _keep = keep;
    });
    assert_eq!(Rc::strong_count(&payload), 2);

    drop(sched);
    assert_eq!(Rc::strong_count(&payload), 1);
}

#[test]
fn dropping_suspended_coroutine_skips_stack_cleanup() {
    let payload = Rc::new(());
    let mut sched = Scheduler::new();
    let keep = payload.clone();
    let id = sched.spawn(move |y| {
        let keep = keep;
        y.suspend();
        drop(keep);
    });
    sched.resume(id);
    assert_eq!(sched.status(id), Status::Suspended);

    // The clone now lives on the coroutine's saved stack. Destroying the
    // record frees the snapshot bytes without unwinding them, so the clone
    // is leaked rather than dropped.
    drop(sched);
    assert_eq!(Rc::strong_count(&payload), 2);
}
