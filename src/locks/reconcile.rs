//! Derive held and awaited locks from a thread's trace.

use crate::dump::{DashKind, Dump, LockRef, Thread, TraceEntry};

/// Fill in [`Thread::locked`] and [`Thread::waiting_on`] for every thread.
pub fn reconcile_dump(dump: &mut Dump) {
    for thread in &mut dump.threads {
        reconcile(thread);
    }
}

/// Recompute `locked` and `waiting_on` from `trace` alone.
///
/// The trace is newest frame first, so it is walked from the bottom: locks
/// accumulate in acquisition order, and the most recent wait wins. A
/// `waiting on` line inside `Object.wait()` releases the monitor it names.
pub fn reconcile(thread: &mut Thread) {
    let (locked, waiting_on) = locks_of(&thread.trace);
    thread.locked = locked;
    thread.waiting_on = waiting_on;
}

pub fn locks_of(trace: &[TraceEntry]) -> (Vec<LockRef>, Option<LockRef>) {
    let mut locks: Vec<LockRef> = Vec::new();
    let mut waiting_on = None;

    for entry in trace.iter().rev() {
        let TraceEntry::Dash(event) = entry else {
            continue;
        };
        let Some(lock) = event.lock_ref() else {
            continue;
        };
        match event.kind {
            DashKind::Locked => locks.push(lock),
            DashKind::WaitingConcurrent
            | DashKind::WaitingSynchronized
            | DashKind::WaitingReLock => waiting_on = Some(lock),
            DashKind::WaitingNotify => locks.retain(|held| held.object_id != lock.object_id),
            DashKind::Eliminated => {}
        }
    }

    (locks, waiting_on)
}
