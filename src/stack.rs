//! Stack growth for the recursive parser and evaluator.
//!
//! Both walk the tree with plain recursion, so a deeply nested program would
//! otherwise exhaust the native stack and abort the process.

/// Grow the stack when less than this remains.
const RED_ZONE: usize = 100 * 1024;

/// Size of each new stack segment.
const STACK_PER_RECURSION: usize = 1024 * 1024;

#[inline]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}
