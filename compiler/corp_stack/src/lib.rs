//! Stack growth for the recursive tree walker.
//!
//! The interpreter evaluates nested expressions and user-level recursion on
//! the native stack. User recursion is capped by the call-depth limit, but a
//! single deeply nested expression (a long `a + b + c + ...` chain, say) is
//! not, so every recursive `eval` runs through [`ensure_sufficient_stack`].
//!
//! On native targets the `stacker` crate allocates a fresh segment when less
//! than [`RED_ZONE`] bytes remain. WASM manages its own stack, so the call is
//! a passthrough there.

/// Grow when less than this much stack remains (128KB).
pub const RED_ZONE: usize = 128 * 1024;

/// Size of each freshly allocated segment (2MB).
pub const SEGMENT_SIZE: usize = 2 * 1024 * 1024;

/// Run `f`, first growing the stack if it is close to exhausted.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, SEGMENT_SIZE, f)
}

/// Run `f` directly; WASM has its own stack management.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
