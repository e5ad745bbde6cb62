//! Stack growth for the recursive passes.
//!
//! Parser, resolver and evaluator all recurse on the shape of the program.
//! Wrapping their recursive entry points in [`ensure_sufficient_stack`] lets
//! the configured call‑depth limit, not the size of the host thread's stack,
//! decide when a Lox program has recursed too far.

/// Grow when less than this much stack remains.
const RED_ZONE: usize = 128 * 1024;

/// Size of each newly allocated stack segment.
const STACK_PER_RECURSION: usize = 1024 * 1024;

#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
