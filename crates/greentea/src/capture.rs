//! Guarded execution of hook and test bodies.
//!
//! Every user body runs under [`guarded`]: panics are caught, the panic
//! hook records a backtrace for the current thread, and the backtrace is
//! reduced to user frames before it reaches the report.
//!
//! ```text
//! Error: boom
//!     at my_tests::helpers::parse (tests/helpers.rs:12:9)
//!     at my_tests::main::{{closure}} (tests/main.rs:30:13)
//! ```

use crate::assert;
use crate::error::{AssertionFailure, FailureKind, SpecError};
use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

// ============================================================================
// Frames and traces
// ============================================================================

/// One frame of a captured backtrace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub symbol: String,
    pub location: Option<String>,
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "at {} ({location})", self.symbol),
            None => write!(f, "at {}", self.symbol),
        }
    }
}

/// An ordered list of frames, innermost first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trace {
    frames: Vec<Frame>,
}

/// Engine functions that only dispatch into user code.
const ENGINE_DISPATCH: &[&str] = &[
    "context::run",
    "context::Context::run",
    "context::Context::run_with",
    "runner::Runner::run",
    "runner::Runner::run_node",
    "runner::Runner::run_hooks",
    "runner::Runner::run_hook",
    "runner::Runner::run_test",
    "capture::guarded",
    "assert::assert_test",
    "tree::Record::call",
];

/// Panic and unwind plumbing of the standard library.
const RUNTIME_PREFIXES: &[&str] = &[
    "std::panicking",
    "core::panicking",
    "std::panic::",
    "std::backtrace",
    "std::sys",
    "std::rt::",
    "__rust",
    "rust_begin_unwind",
    "core::ops::function::",
    "<alloc::boxed::Box<",
    "<core::panic::unwind_safe::AssertUnwindSafe<",
];

impl Trace {
    /// Parse the text form of a [`Backtrace`] into frames.
    pub fn parse(text: &str) -> Self {
        let mut frames: Vec<Frame> = Vec::new();
        for line in text.lines() {
            let line = line.trim_start();
            if let Some(location) = line.strip_prefix("at ") {
                if let Some(last) = frames.last_mut() {
                    if last.location.is_none() {
                        last.location = Some(location.trim().to_string());
                    }
                }
                continue;
            }
            if let Some((index, symbol)) = line.split_once(": ") {
                if !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()) {
                    frames.push(Frame {
                        symbol: symbol.trim().to_string(),
                        location: None,
                    });
                }
            }
        }
        Trace { frames }
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Drop engine dispatch frames and runtime unwinding frames, keeping
    /// only what the user wrote (or called).
    pub fn user_frames(self) -> Self {
        let frames = self
            .frames
            .into_iter()
            .filter(|frame| !is_engine_dispatch(&frame.symbol) && !is_runtime(&frame.symbol))
            .collect();
        Trace { frames }
    }

    /// Keep at most `max` frames.
    pub fn truncated(mut self, max: usize) -> Self {
        self.frames.truncate(max);
        self
    }
}

fn crate_name() -> &'static str {
    match module_path!().split_once("::") {
        Some((root, _)) => root,
        None => module_path!(),
    }
}

/// Strip the symbol hash, generic arguments and closure suffixes, in both
/// the legacy (`{{closure}}`) and v0 (`{closure#0}`) spellings.
fn normalize(symbol: &str) -> &str {
    let mut name = symbol;
    if let Some(idx) = name.rfind("::h") {
        let hash = &name[idx + 3..];
        if hash.len() == 16 && hash.bytes().all(|b| b.is_ascii_hexdigit()) {
            name = &name[..idx];
        }
    }
    loop {
        if let Some(stripped) = name.strip_suffix("::{{closure}}") {
            name = stripped;
            continue;
        }
        match name.rfind("::{closure#") {
            Some(idx) if name.ends_with('}') && !name[idx + 2..].contains("::") => {
                name = &name[..idx];
            }
            _ => break,
        }
    }
    if let Some(idx) = name.find("::<") {
        name = &name[..idx];
    }
    name
}

fn is_engine_dispatch(symbol: &str) -> bool {
    let name = normalize(symbol);
    let Some(rest) = name
        .strip_prefix(crate_name())
        .and_then(|rest| rest.strip_prefix("::"))
    else {
        return false;
    };
    rest.starts_with("capture::") || ENGINE_DISPATCH.contains(&rest)
}

fn is_runtime(symbol: &str) -> bool {
    RUNTIME_PREFIXES
        .iter()
        .any(|prefix| symbol.starts_with(prefix))
}

// ============================================================================
// Panic hook
// ============================================================================

thread_local! {
    static GUARD_DEPTH: Cell<usize> = const { Cell::new(0) };
    static LAST_BACKTRACE: RefCell<Option<String>> = const { RefCell::new(None) };
}

static HOOK_INIT: Once = Once::new();

/// Install the capturing panic hook. Threads outside a guarded call keep
/// the previous hook's behavior.
fn install_panic_hook() {
    HOOK_INIT.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let guarded = GUARD_DEPTH.try_with(Cell::get).unwrap_or(0) > 0;
            if !guarded {
                previous(info);
                return;
            }
            let backtrace = Backtrace::force_capture().to_string();
            let _ = LAST_BACKTRACE.try_with(|slot| *slot.borrow_mut() = Some(backtrace));
        }));
    });
}

// ============================================================================
// Guarded call
// ============================================================================

/// A panic caught by [`guarded`].
#[derive(Debug)]
pub(crate) struct Captured {
    pub kind: FailureKind,
    pub message: String,
    pub trace: Trace,
}

/// Run `body`, catching any panic and the backtrace that produced it.
///
/// A panic raised while a test body is running also marks the current
/// test as failed.
pub(crate) fn guarded(body: impl FnOnce()) -> Result<(), Captured> {
    install_panic_hook();
    // a panic swallowed by an earlier body must not leak its trace into this one
    LAST_BACKTRACE.with(|slot| slot.borrow_mut().take());
    GUARD_DEPTH.with(|depth| depth.set(depth.get() + 1));
    let result = panic::catch_unwind(AssertUnwindSafe(body));
    GUARD_DEPTH.with(|depth| depth.set(depth.get() - 1));

    let payload = match result {
        Ok(()) => return Ok(()),
        Err(payload) => payload,
    };
    assert::mark_failed();

    let trace = LAST_BACKTRACE
        .with(|slot| slot.borrow_mut().take())
        .map(|text| Trace::parse(&text).user_frames())
        .unwrap_or_default();
    let (kind, message) = describe_payload(payload.as_ref());
    Err(Captured {
        kind,
        message,
        trace,
    })
}

fn describe_payload(payload: &(dyn Any + Send)) -> (FailureKind, String) {
    if let Some(failure) = payload.downcast_ref::<AssertionFailure>() {
        (FailureKind::Assertion, failure.to_string())
    } else if let Some(err) = payload.downcast_ref::<SpecError>() {
        (FailureKind::Panic, err.to_string())
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        (FailureKind::Panic, s.to_string())
    } else if let Some(s) = payload.downcast_ref::<String>() {
        (FailureKind::Panic, s.clone())
    } else {
        (FailureKind::Panic, "unknown panic".to_string())
    }
}
