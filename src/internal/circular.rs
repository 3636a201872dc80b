//! Circular dependency detection.
//!
//! Two layers: a depth-first search over the installed graph when an injector
//! is built, and a thread-local resolution stack that catches whatever the
//! static pass was told not to look for.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::error::{BindingError, ErrorKind};
use crate::key::Key;

// Thread-local resolution state for runtime cycle detection
thread_local! {
    static RESOLUTION_STACK: RefCell<Vec<(usize, Key)>> = RefCell::new(Vec::new());
}

/// `CyclicBinding` error carrying the path, e.g. `A -> B -> A`.
pub(crate) fn cycle_error(path: &[Key]) -> BindingError {
    let rendered = path
        .iter()
        .map(|key| key.to_string())
        .collect::<Vec<_>>()
        .join(" -> ");
    let err = BindingError::new(ErrorKind::CyclicBinding);
    match path.first() {
        Some(first) => err.key(first).tag("path", rendered),
        None => err,
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

/// Finds one cycle reachable from `roots`, following `edges`.
///
/// Keys without edges (unknown to the caller) end a path. The returned path
/// starts and ends with the same key.
pub(crate) fn find_cycle<'k, F>(
    roots: impl IntoIterator<Item = &'k Key>,
    edges: F,
) -> Option<Vec<Key>>
where
    F: Fn(&Key) -> Option<&'k [Key]>,
{
    let mut marks: HashMap<&'k Key, Mark> = HashMap::new();
    let mut path: Vec<&'k Key> = Vec::new();

    for root in roots {
        if marks.contains_key(root) {
            continue;
        }
        if let Some(cycle) = visit(root, &edges, &mut marks, &mut path) {
            return Some(cycle);
        }
    }
    None
}

fn visit<'k, F>(
    key: &'k Key,
    edges: &F,
    marks: &mut HashMap<&'k Key, Mark>,
    path: &mut Vec<&'k Key>,
) -> Option<Vec<Key>>
where
    F: Fn(&Key) -> Option<&'k [Key]>,
{
    match marks.get(key) {
        Some(Mark::Done) => return None,
        Some(Mark::InProgress) => {
            let start = path.iter().position(|k| *k == key).unwrap_or(0);
            let mut cycle: Vec<Key> = path[start..].iter().map(|k| (*k).clone()).collect();
            cycle.push(key.clone());
            return Some(cycle);
        }
        None => {}
    }

    marks.insert(key, Mark::InProgress);
    path.push(key);
    for next in edges(key).unwrap_or(&[]) {
        if let Some(cycle) = visit(next, edges, marks, path) {
            return Some(cycle);
        }
    }
    path.pop();
    marks.insert(key, Mark::Done);
    None
}

/// Guard for one entry of the thread-local resolution stack.
pub(crate) struct StackGuard {
    _private: (),
}

impl StackGuard {
    /// Pushes `key` for the injector identified by `owner`.
    ///
    /// Fails with `CyclicBinding` if that injector is already resolving `key`
    /// further up this thread's stack.
    pub(crate) fn enter(owner: usize, key: &Key) -> Result<Self, BindingError> {
        RESOLUTION_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(start) = stack.iter().position(|(o, k)| *o == owner && k == key) {
                let mut path: Vec<Key> = stack[start..]
                    .iter()
                    .filter(|(o, _)| *o == owner)
                    .map(|(_, k)| k.clone())
                    .collect();
                path.push(key.clone());
                return Err(cycle_error(&path));
            }
            stack.push((owner, key.clone()));
            Ok(StackGuard { _private: () })
        })
    }
}

impl Drop for StackGuard {
    fn drop(&mut self) {
        RESOLUTION_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}
