//! Error types surfaced by registration, assertions and runs.

use crate::capture::Trace;
use std::fmt;

/// Which of the four hook lists a failing hook came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    Before,
    BeforeEach,
    AfterEach,
    After,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HookKind::Before => "before",
            HookKind::BeforeEach => "before_each",
            HookKind::AfterEach => "after_each",
            HookKind::After => "after",
        };
        f.write_str(name)
    }
}

/// Errors returned by [`Context`](crate::Context) operations.
///
/// | Variant | Raised when | Recovered? |
/// |---------|-------------|------------|
/// | `InvalidPhase` | registration after `run()` started, assertion outside a test | never |
/// | `HookFailed` | a hook body panicked | no, aborts the run |
/// | `SuiteFailed` | at least one test failed in a complete run | terminal |
/// | `Io` | writing the report failed | no |
#[derive(Debug, thiserror::Error)]
pub enum SpecError {
    #[error("`{operation}` cannot be called {reason}")]
    InvalidPhase {
        operation: &'static str,
        reason: &'static str,
    },

    #[error("{kind} hook {description:?} failed: {message}")]
    HookFailed {
        kind: HookKind,
        description: String,
        message: String,
        trace: Trace,
    },

    #[error("{failed} failed, {passed} passed, {pending} pending")]
    SuiteFailed {
        passed: usize,
        pending: usize,
        failed: usize,
    },

    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
}

impl SpecError {
    pub(crate) fn after_run_started(operation: &'static str) -> Self {
        SpecError::InvalidPhase {
            operation,
            reason: "after run() has started",
        }
    }

    pub(crate) fn outside_test(operation: &'static str) -> Self {
        SpecError::InvalidPhase {
            operation,
            reason: "outside a running test",
        }
    }

    pub fn is_invalid_phase(&self) -> bool {
        matches!(self, SpecError::InvalidPhase { .. })
    }
}

/// Unwinding payload raised by [`assert_test`](crate::assert_test) on a
/// false predicate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("assertion failed at {location}")]
pub struct AssertionFailure {
    pub location: String,
}

/// How a failed test went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// `assert_test(false)` was called.
    Assertion,
    /// The body panicked for any other reason.
    Panic,
}

/// The captured error of a failed test.
#[derive(Debug, Clone)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
    pub trace: Trace,
}
