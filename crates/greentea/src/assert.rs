//! Per-test assertion tracking.
//!
//! The tracker lives in a thread-local slot that is only occupied while a
//! test body runs. [`assert_test`] outside that window is an error.

use crate::error::{AssertionFailure, SpecError};
use std::cell::RefCell;
use std::panic::{panic_any, Location};

/// State of the test body currently executing.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TestRunState {
    pub assertion_invoked: bool,
    pub failed: bool,
}

thread_local! {
    static RUN_STATE: RefCell<Option<TestRunState>> = const { RefCell::new(None) };
}

/// Open a fresh tracker for the test about to run.
pub(crate) fn begin_test() {
    RUN_STATE.with(|state| *state.borrow_mut() = Some(TestRunState::default()));
}

/// Close the tracker and hand back what the test did.
pub(crate) fn end_test() -> TestRunState {
    RUN_STATE
        .with(|state| state.borrow_mut().take())
        .unwrap_or_default()
}

/// Mark the running test as failed. No-op outside a test body.
pub(crate) fn mark_failed() {
    RUN_STATE.with(|state| {
        if let Some(state) = state.borrow_mut().as_mut() {
            state.failed = true;
        }
    });
}

/// Whether a test body is running on this thread.
pub fn in_test() -> bool {
    RUN_STATE.with(|state| state.borrow().is_some())
}

/// Evaluate the single predicate of a test.
///
/// A `false` predicate fails the test and stops its body immediately; code
/// after the call does not run. A test that never calls `assert_test` is
/// reported as pending.
///
/// # Panics
///
/// Unwinds with [`AssertionFailure`] when `predicate` is false, and with
/// [`SpecError::InvalidPhase`] when called outside a running test (for
/// example from a hook or during registration).
#[track_caller]
pub fn assert_test(predicate: bool) {
    let location = Location::caller();
    let running = RUN_STATE.with(|state| match state.borrow_mut().as_mut() {
        Some(state) => {
            state.assertion_invoked = true;
            if !predicate {
                state.failed = true;
            }
            true
        }
        None => false,
    });

    if !running {
        panic_any(SpecError::outside_test("assert_test"));
    }
    if !predicate {
        panic_any(AssertionFailure {
            location: location.to_string(),
        });
    }
}
