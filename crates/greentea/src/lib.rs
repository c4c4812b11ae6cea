//! # greentea — a describe/it BDD test engine
//!
//! Build a tree of suites, hooks and tests with a closure-based API, then
//! run it once. Nested suites finish before their parent's own tests, each
//! test is classified as passed, pending or failed, and an indented report
//! with a final verdict is printed.
//!
//! ## Quick example
//!
//! ```rust,no_run
//! use greentea::assert_test;
//!
//! fn main() {
//!     greentea::run(|ctx| {
//!         ctx.describe("Calculator", |ctx| {
//!             ctx.before("reset memory", || {})?;
//!
//!             ctx.it("adds two numbers", || {
//!                 assert_test(2 + 3 == 5);
//!             })?;
//!
//!             ctx.pending("divides by zero")?;
//!
//!             ctx.describe("with negative numbers", |ctx| {
//!                 ctx.it("handles negatives", || assert_test(-1 + 1 == 0))
//!             })
//!         })
//!     });
//! }
//! ```
//!
//! ## Outcomes
//!
//! - **passed** — the body called [`assert_test`] and every call was `true`
//! - **pending** — the body never called [`assert_test`]; reported, never fatal
//! - **failed** — an assertion was `false` or the body panicked
//!
//! A panicking hook aborts the whole run with [`SpecError::HookFailed`].
//!
//! ## Features
//!
//! - `macros` (default) — the [`spec!`] and [`bdd!`] DSL macros

mod assert;
mod capture;
mod config;
mod context;
mod error;
mod format;
mod runner;
mod tree;

pub use assert::{assert_test, in_test};
pub use capture::{Frame, Trace};
pub use config::RunConfig;
pub use context::{run, Context};
pub use error::{AssertionFailure, Failure, FailureKind, HookKind, SpecError};
pub use format::Indent;
pub use runner::RunResult;

#[cfg(feature = "macros")]
pub use greentea_macros::{bdd, spec};

use std::sync::Once;

/// A drop guard that runs cleanup code even if the guarded scope panics.
pub struct Guard<F: FnOnce()> {
    f: Option<F>,
}

impl<F: FnOnce()> Guard<F> {
    pub fn new(f: F) -> Self {
        Guard { f: Some(f) }
    }
}

impl<F: FnOnce()> Drop for Guard<F> {
    fn drop(&mut self) {
        if let Some(f) = self.f.take() {
            f();
        }
    }
}

// ============================================================================
// Logging
// ============================================================================

static LOGGING_INIT: Once = Once::new();

/// Install a stderr `tracing` subscriber filtered by `GREENTEA_LOG`
/// (`EnvFilter` syntax, default `warn`). Safe to call more than once.
pub fn init_logging() {
    LOGGING_INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_env("GREENTEA_LOG")
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    });
}
