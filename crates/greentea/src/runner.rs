//! Execution engine — walks the suite tree and prints an indented report.
//!
//! Children run to completion before their parent's own hooks and tests:
//!
//! ```text
//! 	Cart
//! 		Totals
//! 			open db
//! 			✓ sums line items
//! 			- applies coupons
//! 			(1 passed, 1 pending, 0 failed)
//! 		✗ rejects negative quantities
//! 			Error: assertion failed at tests/cart.rs:31:13
//! 				at cart::main::{{closure}} (tests/cart.rs:31:13)
//! 		(1 passed, 1 pending, 1 failed)
//!
//! FAIL
//! 1 passed, 1 pending, 1 failed (0.002s)
//! ```

use crate::assert::{self, TestRunState};
use crate::capture::{self, Captured, Trace};
use crate::config::RunConfig;
use crate::error::{Failure, FailureKind, HookKind, SpecError};
use crate::format::{Formatter, OutcomeKind};
use crate::tree::{NodeId, Record, Tree};
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;
use std::time::{Duration, Instant};

// ============================================================================
// Outcomes
// ============================================================================

/// How a single test concluded.
#[derive(Debug, Clone)]
pub(crate) enum Outcome {
    Passed,
    Pending,
    Failed(Failure),
}

impl Outcome {
    pub(crate) fn kind(&self) -> OutcomeKind {
        match self {
            Outcome::Passed => OutcomeKind::Passed,
            Outcome::Pending => OutcomeKind::Pending,
            Outcome::Failed(_) => OutcomeKind::Failed,
        }
    }

    /// Classify a finished test body. A captured error always wins over a
    /// missing assertion.
    pub(crate) fn classify(captured: Option<Captured>, state: TestRunState) -> Self {
        match captured {
            Some(captured) => Outcome::Failed(Failure {
                kind: captured.kind,
                message: captured.message,
                trace: captured.trace,
            }),
            // the assertion's unwind was caught inside the body itself
            None if state.failed => Outcome::Failed(Failure {
                kind: FailureKind::Assertion,
                message: "assertion failed".to_string(),
                trace: Trace::default(),
            }),
            None if !state.assertion_invoked => Outcome::Pending,
            None => Outcome::Passed,
        }
    }
}

/// Results from a complete run.
#[derive(Debug, Default)]
pub struct RunResult {
    pub passed: usize,
    pub pending: usize,
    pub failed: usize,
    /// `path > test: message` for every failed test, in execution order.
    pub failures: Vec<String>,
}

// ============================================================================
// Runner
// ============================================================================

/// Copy of the parts of a node the runner needs, taken so that no tree
/// borrow is held while user code runs.
struct NodeSnapshot {
    description: String,
    depth: usize,
    children: Vec<NodeId>,
    before: Vec<Rc<Record>>,
    before_each: Vec<Rc<Record>>,
    tests: Vec<Rc<Record>>,
    after_each: Vec<Rc<Record>>,
    after: Vec<Rc<Record>>,
}

impl NodeSnapshot {
    fn take(tree: &Tree, id: NodeId) -> Self {
        let node = tree.node(id);
        NodeSnapshot {
            description: node.description().to_string(),
            depth: node.depth(),
            children: node.children().to_vec(),
            before: node.hooks(HookKind::Before).to_vec(),
            before_each: node.hooks(HookKind::BeforeEach).to_vec(),
            tests: node.tests().to_vec(),
            after_each: node.hooks(HookKind::AfterEach).to_vec(),
            after: node.hooks(HookKind::After).to_vec(),
        }
    }
}

pub(crate) struct Runner<'a> {
    tree: Rc<RefCell<Tree>>,
    out: &'a mut dyn Write,
    fmt: Formatter,
    max_frames: usize,
    failures: Vec<String>,
}

impl<'a> Runner<'a> {
    pub(crate) fn new(tree: Rc<RefCell<Tree>>, config: &RunConfig, out: &'a mut dyn Write) -> Self {
        let fmt = Formatter::new(tree.borrow().indent(), config.color);
        Runner {
            tree,
            out,
            fmt,
            max_frames: config.max_frames,
            failures: Vec::new(),
        }
    }

    /// Execute the whole tree once.
    pub(crate) fn run(mut self) -> Result<RunResult, SpecError> {
        let start = Instant::now();
        self.tree.borrow_mut().begin_execution()?;
        tracing::debug!("registration closed, executing tree");

        self.run_node(NodeId::ROOT)?;

        let counts = self.tree.borrow().root().counts();
        let result = RunResult {
            passed: counts.passed,
            pending: counts.pending,
            failed: counts.failed,
            failures: std::mem::take(&mut self.failures),
        };
        self.print_summary(&result, start.elapsed())?;
        tracing::debug!(
            passed = result.passed,
            pending = result.pending,
            failed = result.failed,
            "run complete"
        );

        if result.failed > 0 {
            return Err(SpecError::SuiteFailed {
                passed: result.passed,
                pending: result.pending,
                failed: result.failed,
            });
        }
        Ok(result)
    }

    fn run_node(&mut self, id: NodeId) -> Result<(), SpecError> {
        let node = NodeSnapshot::take(&self.tree.borrow(), id);
        let _span = tracing::debug_span!("suite", name = %node.description).entered();
        let depth = node.depth;

        if !node.description.is_empty() {
            writeln!(
                self.out,
                "{}{}",
                self.fmt.indent(depth, 0),
                self.fmt.bold(&node.description)
            )?;
        }

        for child in node.children {
            self.run_node(child)?;
        }

        self.run_hooks(HookKind::Before, &node.before, depth)?;
        for test in &node.tests {
            self.run_hooks(HookKind::BeforeEach, &node.before_each, depth)?;
            self.run_test(id, test, depth)?;
            self.run_hooks(HookKind::AfterEach, &node.after_each, depth)?;
        }
        self.run_hooks(HookKind::After, &node.after, depth)?;

        if id != NodeId::ROOT {
            let counts = self.tree.borrow().node(id).counts();
            let summary = format!(
                "({} passed, {} pending, {} failed)",
                counts.passed, counts.pending, counts.failed
            );
            writeln!(self.out, "{}{}", self.fmt.indent(depth, 1), self.fmt.dim(&summary))?;
        }
        Ok(())
    }

    fn run_hooks(
        &mut self,
        kind: HookKind,
        hooks: &[Rc<Record>],
        depth: usize,
    ) -> Result<(), SpecError> {
        for hook in hooks {
            self.run_hook(kind, hook, depth)?;
        }
        Ok(())
    }

    fn run_hook(&mut self, kind: HookKind, hook: &Record, depth: usize) -> Result<(), SpecError> {
        if !hook.description().is_empty() {
            writeln!(
                self.out,
                "{}{}",
                self.fmt.indent(depth, 1),
                self.fmt.dim(hook.description())
            )?;
        }
        tracing::debug!(%kind, hook = hook.description(), "running hook");

        let Err(captured) = capture::guarded(|| hook.call()) else {
            return Ok(());
        };
        let trace = captured.trace.truncated(self.max_frames);
        tracing::error!(
            %kind,
            hook = hook.description(),
            message = %captured.message,
            "hook failed, aborting run"
        );
        self.print_error(&captured.message, &trace, depth)?;
        Err(SpecError::HookFailed {
            kind,
            description: hook.description().to_string(),
            message: captured.message,
            trace,
        })
    }

    fn run_test(&mut self, id: NodeId, test: &Record, depth: usize) -> Result<(), SpecError> {
        assert::begin_test();
        let captured = capture::guarded(|| test.call()).err();
        let state = assert::end_test();
        let outcome = Outcome::classify(captured, state);
        self.tree.borrow_mut().record_outcome(id, outcome.kind());

        let name = match outcome.kind() {
            OutcomeKind::Passed => test.description().to_string(),
            OutcomeKind::Pending => self.fmt.dim(test.description()),
            OutcomeKind::Failed => self.fmt.red(test.description()),
        };
        writeln!(
            self.out,
            "{}{} {}",
            self.fmt.indent(depth, 1),
            self.fmt.symbol(outcome.kind()),
            name
        )?;

        match outcome {
            Outcome::Passed => tracing::debug!(test = test.description(), "passed"),
            Outcome::Pending => tracing::warn!(test = test.description(), "pending: no assertion made"),
            Outcome::Failed(failure) => {
                tracing::debug!(test = test.description(), message = %failure.message, "failed");
                let trace = failure.trace.truncated(self.max_frames);
                self.print_error(&failure.message, &trace, depth)?;
                let mut path = self.tree.borrow().path(id).join(" > ");
                if !path.is_empty() {
                    path.push_str(" > ");
                }
                path.push_str(test.description());
                self.failures.push(format!("{path}: {}", failure.message));
            }
        }
        Ok(())
    }

    fn print_error(&mut self, message: &str, trace: &Trace, depth: usize) -> Result<(), SpecError> {
        writeln!(
            self.out,
            "{}{}",
            self.fmt.indent(depth, 2),
            self.fmt.red(&format!("Error: {message}"))
        )?;
        for frame in trace.frames() {
            writeln!(
                self.out,
                "{}{}",
                self.fmt.indent(depth, 3),
                self.fmt.dim(&frame.to_string())
            )?;
        }
        Ok(())
    }

    fn print_summary(&mut self, result: &RunResult, elapsed: Duration) -> Result<(), SpecError> {
        let elapsed_str = format!("{:.3}s", elapsed.as_secs_f64());
        let summary = format!(
            "{}, {}, {} ({})",
            self.fmt.green(&format!("{} passed", result.passed)),
            self.fmt.yellow(&format!("{} pending", result.pending)),
            self.fmt.red(&format!("{} failed", result.failed)),
            self.fmt.dim(&elapsed_str)
        );

        writeln!(self.out)?;
        if result.failed > 0 {
            writeln!(self.out, "{}", self.fmt.red("FAIL"))?;
            writeln!(self.out, "{summary}")?;
            writeln!(self.out)?;
            writeln!(self.out, "Failures:")?;
            for (i, failure) in result.failures.iter().enumerate() {
                writeln!(self.out, "  {}. {}", i + 1, failure)?;
            }
        } else {
            writeln!(self.out, "{}", self.fmt.green("PASS"))?;
            writeln!(self.out, "{summary}")?;
        }
        Ok(())
    }
}

/// Print the full path of every registered test, in execution order.
pub(crate) fn list_tree(tree: &Tree, out: &mut dyn Write) -> std::io::Result<()> {
    list_node(tree, NodeId::ROOT, out)
}

fn list_node(tree: &Tree, id: NodeId, out: &mut dyn Write) -> std::io::Result<()> {
    let node = tree.node(id);
    for &child in node.children() {
        list_node(tree, child, out)?;
    }
    let path = tree.path(id);
    for test in node.tests() {
        let mut full = path.clone();
        full.push(test.description());
        writeln!(out, "{}", full.join(" > "))?;
    }
    Ok(())
}
