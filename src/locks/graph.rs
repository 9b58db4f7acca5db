//! Transitive lock-wait forest.
//!
//! Cross-references every thread's held locks with every other thread's
//! awaited lock. A thread is *blocked by* the holder of the lock it waits on;
//! following that relation to a thread that is not blocked gives the root of
//! a chain. Chains sharing a root are merged into one tree per contested lock.

use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::dump::{Dump, LockRef, Thread};

/// A thread waiting on a lock that another thread of the dump holds.
#[derive(Debug, Clone, Copy)]
pub struct Blocked<'a> {
    pub holder: &'a Thread,
    pub lock: &'a LockRef,
}

/// A node of the forest, keyed by `(tid, lock.object_id)`.
///
/// For a node with children, `lock` is the lock it holds that the children
/// wait on. For a leaf it is the lock the leaf waits on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockNode {
    pub tid: String,
    pub name: String,
    pub lock: LockRef,
    pub children: Vec<LockNode>,
}

impl LockNode {
    fn new(thread: &Thread, lock: &LockRef) -> Self {
        Self {
            tid: thread.tid.clone(),
            name: thread.name.clone(),
            lock: lock.clone(),
            children: Vec::new(),
        }
    }

    fn key(&self) -> (&str, &str) {
        (&self.tid, &self.lock.object_id)
    }

    /// Number of distinct `(tid, object id)` nodes anywhere below this one.
    pub fn blocked_count(&self) -> usize {
        let mut keys = BTreeSet::new();
        self.collect_keys(&mut keys);
        keys.len()
    }

    fn collect_keys<'n>(&'n self, keys: &mut BTreeSet<(&'n str, &'n str)>) {
        for child in &self.children {
            keys.insert(child.key());
            child.collect_keys(keys);
        }
    }

    fn sort(&mut self) {
        sort_siblings(&mut self.children);
    }
}

fn sort_siblings(nodes: &mut [LockNode]) {
    nodes.sort_by(|a, b| {
        (a.name.as_str(), a.lock.object_id.as_str(), a.tid.as_str()).cmp(&(
            b.name.as_str(),
            b.lock.object_id.as_str(),
            b.tid.as_str(),
        ))
    });
    for node in nodes {
        node.sort();
    }
}

/// Holder/waiter indices and the forest built from them.
#[derive(Debug)]
pub struct LockGraph<'a> {
    threads_by_tid: HashMap<&'a str, &'a Thread>,
    lockers_by_oid: HashMap<&'a str, &'a Thread>,
    waiters_by_tid: HashMap<&'a str, Blocked<'a>>,
    roots: Vec<LockNode>,
}

impl<'a> LockGraph<'a> {
    /// Build the graph for a reconciled dump.
    pub fn build(dump: &'a Dump) -> Self {
        // Threads without a tid cannot be told apart, so they take no part.
        let keyed: Vec<&'a Thread> = dump
            .threads
            .iter()
            .filter(|thread| {
                let keep = !thread.tid.is_empty();
                if !keep {
                    log::debug!("Leaving {:?} out of the lock graph: no tid", thread.name);
                }
                keep
            })
            .collect();

        let mut lockers_by_oid = HashMap::new();
        for &thread in &keyed {
            for lock in &thread.locked {
                lockers_by_oid.insert(lock.object_id.as_str(), thread);
            }
        }

        let mut waiters_by_tid = HashMap::new();
        for &thread in &keyed {
            let Some(lock) = &thread.waiting_on else {
                continue;
            };
            match lockers_by_oid.get(lock.object_id.as_str()) {
                Some(&holder) if holder.tid == thread.tid => {
                    log::debug!("{:?} waits on {} which it holds itself", thread.name, lock.object_id);
                }
                Some(&holder) => {
                    waiters_by_tid.insert(thread.tid.as_str(), Blocked { holder, lock });
                }
                None => {
                    log::debug!(
                        "{:?} waits on {} with no holder in the dump",
                        thread.name,
                        lock.object_id
                    );
                }
            }
        }

        let mut graph = Self {
            threads_by_tid: keyed.iter().map(|&t| (t.tid.as_str(), t)).collect(),
            lockers_by_oid,
            waiters_by_tid,
            roots: Vec::new(),
        };
        graph.roots = graph.assemble(&keyed);
        graph
    }

    /// Thread holding the lock with this object id.
    pub fn holder_of(&self, object_id: &str) -> Option<&'a Thread> {
        self.lockers_by_oid.get(object_id).copied()
    }

    /// What blocks the thread with this tid, if anything in the dump does.
    pub fn blocker_of(&self, tid: &str) -> Option<Blocked<'a>> {
        self.waiters_by_tid.get(tid).copied()
    }

    /// Number of threads blocked behind another thread of the dump.
    pub fn blocked_threads(&self) -> usize {
        self.waiters_by_tid.len()
    }

    /// `[tid, holder, holder's holder, ..., root]`.
    ///
    /// Stops at the first thread that is not blocked, or before revisiting a
    /// thread, so it never runs longer than the number of threads.
    pub fn transitive_path<'t>(&self, tid: &'t str) -> Vec<&'t str>
    where
        'a: 't,
    {
        self.walk(tid).0
    }

    /// The chain from `tid`, plus the index the chain loops back to, if it does.
    fn walk<'t>(&self, tid: &'t str) -> (Vec<&'t str>, Option<usize>)
    where
        'a: 't,
    {
        let mut path = vec![tid];
        let mut seen = HashSet::from([tid]);
        let mut current = tid;

        while let Some(blocked) = self.waiters_by_tid.get(current) {
            let next: &'t str = blocked.holder.tid.as_str();
            if !seen.insert(next) {
                let start = path.iter().position(|&t| t == next);
                log::debug!("Wait chain from {tid} loops back to {next}");
                return (path, start);
            }
            path.push(next);
            current = next;
        }

        (path, None)
    }

    /// Trees of blocked threads, one per contested lock of a root holder.
    pub fn roots(&self) -> &[LockNode] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Every wait cycle once, starting at its smallest tid, ordered by that tid.
    pub fn deadlocks(&self) -> Vec<Vec<&'a Thread>> {
        let mut cycles: BTreeSet<Vec<&'a str>> = BTreeSet::new();

        for &tid in self.waiters_by_tid.keys() {
            let (path, start) = self.walk(tid);
            let Some(start) = start else {
                continue;
            };
            let mut cycle = path[start..].to_vec();
            if let Some(min) = cycle.iter().enumerate().min_by_key(|(_, t)| **t).map(|(i, _)| i) {
                cycle.rotate_left(min);
            }
            cycles.insert(cycle);
        }

        cycles
            .into_iter()
            .map(|cycle| {
                cycle
                    .into_iter()
                    .filter_map(|tid| self.threads_by_tid.get(tid).copied())
                    .collect()
            })
            .collect()
    }

    fn assemble(&self, threads: &[&'a Thread]) -> Vec<LockNode> {
        let mut paths: Vec<Vec<(&'a Thread, &'a LockRef)>> = threads
            .iter()
            .filter_map(|&thread| {
                let own = self.waiters_by_tid.get(thread.tid.as_str())?;
                Some(self.root_to_leaf(thread, own))
            })
            .collect();

        // Deepest chains first, so internal nodes exist before the shorter
        // chains that end at them are merged in.
        paths.sort_by_key(|path| {
            (
                Reverse(path.len()),
                path.last().map(|(t, _)| t.tid.clone()).unwrap_or_default(),
            )
        });

        let mut roots = Level::default();
        for path in &paths {
            roots.insert(path);
        }
        let mut roots = roots.finish();
        sort_siblings(&mut roots);
        roots
    }

    /// Nodes from the root holder down to `thread`, each paired with its key lock.
    fn root_to_leaf(&self, thread: &'a Thread, own: &Blocked<'a>) -> Vec<(&'a Thread, &'a LockRef)> {
        let mut nodes = vec![(thread, own.lock)];
        let mut seen = HashSet::from([thread.tid.as_str()]);
        let mut blocked = *own;

        loop {
            let holder = blocked.holder;
            if !seen.insert(holder.tid.as_str()) {
                break;
            }
            // A holder is keyed by the lock its waiter on this chain wants.
            nodes.push((holder, blocked.lock));
            match self.waiters_by_tid.get(holder.tid.as_str()) {
                Some(next) => blocked = *next,
                None => break,
            }
        }

        nodes.reverse();
        nodes
    }
}

/// One sibling list of the forest under construction.
///
/// Lookups by `(tid, object id)` key and by tid are hashed, so a lock with
/// many waiters costs one probe per waiter.
#[derive(Default)]
struct Level<'a> {
    nodes: Vec<Pending<'a>>,
    by_key: HashMap<(&'a str, &'a str), usize>,
    tids: HashSet<&'a str>,
}

struct Pending<'a> {
    thread: &'a Thread,
    lock: &'a LockRef,
    children: Level<'a>,
}

impl<'a> Level<'a> {
    fn insert(&mut self, path: &[(&'a Thread, &'a LockRef)]) {
        let Some((&(thread, lock), rest)) = path.split_first() else {
            return;
        };

        let key = (thread.tid.as_str(), lock.object_id.as_str());
        let index = match self.by_key.get(&key) {
            Some(&index) => index,
            // A chain ending at a thread already placed here is already covered.
            None if rest.is_empty() && self.tids.contains(key.0) => return,
            None => {
                self.by_key.insert(key, self.nodes.len());
                self.tids.insert(key.0);
                self.nodes.push(Pending {
                    thread,
                    lock,
                    children: Level::default(),
                });
                self.nodes.len() - 1
            }
        };
        self.nodes[index].children.insert(rest);
    }

    fn finish(self) -> Vec<LockNode> {
        self.nodes
            .into_iter()
            .map(|pending| LockNode {
                children: pending.children.finish(),
                ..LockNode::new(pending.thread, pending.lock)
            })
            .collect()
    }
}
