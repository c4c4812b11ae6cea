//! Closure-based registration API — `Context` and the `run()` entry point.

use crate::config::RunConfig;
use crate::error::{HookKind, SpecError};
use crate::format::Indent;
use crate::runner::{self, RunResult, Runner};
use crate::tree::{Phase, Tree};
use crate::Guard;
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

// ============================================================================
// Context — the user-facing handle
// ============================================================================

/// A handle for building and running one test tree.
///
/// Cloning is cheap; every clone refers to the same tree, so a clone
/// captured by a test body observes the phase gate once `run` started.
///
/// # Example
/// ```rust,no_run
/// use greentea::{assert_test, Context};
///
/// let ctx = Context::new();
/// ctx.describe("Calculator", |ctx| {
///     ctx.it("adds", || assert_test(2 + 3 == 5))?;
///     ctx.pending("divides by zero")?;
///     Ok(())
/// })?;
/// ctx.run()?;
/// # Ok::<(), greentea::SpecError>(())
/// ```
#[derive(Clone, Default)]
pub struct Context {
    tree: Rc<RefCell<Tree>>,
}

impl Context {
    pub fn new() -> Self {
        Context::default()
    }

    /// A tree whose root prints `banner` as its first report line.
    pub fn with_banner(banner: &str) -> Self {
        Context {
            tree: Rc::new(RefCell::new(Tree::new(banner))),
        }
    }

    // ---- Describe ------------------------------------------------------------

    /// Register a nested suite. Everything `body` registers attaches to it.
    ///
    /// The cursor returns to the enclosing suite when `body` finishes,
    /// including when it returns an error or panics.
    pub fn describe(
        &self,
        description: &str,
        body: impl FnOnce(&Context) -> Result<(), SpecError>,
    ) -> Result<(), SpecError> {
        let id = self.tree.borrow_mut().open_suite(description)?;
        let tree = Rc::clone(&self.tree);
        let _restore = Guard::new(move || tree.borrow_mut().close_suite(id));
        body(self)
    }

    /// Alias for [`describe`](Self::describe).
    pub fn context(
        &self,
        description: &str,
        body: impl FnOnce(&Context) -> Result<(), SpecError>,
    ) -> Result<(), SpecError> {
        self.describe(description, body)
    }

    // ---- It ------------------------------------------------------------------

    /// Register a test. It passes if it calls [`assert_test`](crate::assert_test)
    /// only with `true`, and is pending if it never calls it.
    pub fn it(&self, description: &str, body: impl Fn() + 'static) -> Result<(), SpecError> {
        self.tree.borrow_mut().add_test(description, body)
    }

    /// Register a test whose implementation is still to be written.
    pub fn pending(&self, description: &str) -> Result<(), SpecError> {
        self.tree.borrow_mut().add_test(description, || {})
    }

    /// Register a nameless test, reported as `spec_1`, `spec_2`, ...
    pub fn specify(&self, body: impl Fn() + 'static) -> Result<(), SpecError> {
        self.tree.borrow_mut().add_nameless_test(body)
    }

    // ---- Hooks ---------------------------------------------------------------

    /// Runs once before the current suite's own tests.
    pub fn before(&self, description: &str, hook: impl Fn() + 'static) -> Result<(), SpecError> {
        self.tree
            .borrow_mut()
            .add_hook(HookKind::Before, description, hook)
    }

    /// Runs once after the current suite's own tests.
    pub fn after(&self, description: &str, hook: impl Fn() + 'static) -> Result<(), SpecError> {
        self.tree
            .borrow_mut()
            .add_hook(HookKind::After, description, hook)
    }

    pub fn before_each(
        &self,
        description: &str,
        hook: impl Fn() + 'static,
    ) -> Result<(), SpecError> {
        self.tree
            .borrow_mut()
            .add_hook(HookKind::BeforeEach, description, hook)
    }

    pub fn after_each(
        &self,
        description: &str,
        hook: impl Fn() + 'static,
    ) -> Result<(), SpecError> {
        self.tree
            .borrow_mut()
            .add_hook(HookKind::AfterEach, description, hook)
    }

    // ---- Configuration -------------------------------------------------------

    /// Set the indent unit of the report: `Indent::Tab` (default), a number
    /// of spaces, or a literal string.
    pub fn set_indentation(&self, indent: impl Into<Indent>) -> Result<(), SpecError> {
        self.tree.borrow_mut().set_indent(indent.into())
    }

    /// Whether `run` has started on this tree.
    pub fn is_executing(&self) -> bool {
        self.tree.borrow().phase() == Phase::Executing
    }

    // ---- Running -------------------------------------------------------------

    /// Run the tree, reporting to stdout.
    pub fn run(&self) -> Result<RunResult, SpecError> {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        self.run_with(&RunConfig::default(), &mut out)
    }

    /// Run the tree, reporting to `out`.
    ///
    /// Returns `SuiteFailed` after the full report if any test failed and
    /// `HookFailed` as soon as a hook panics.
    pub fn run_with(&self, config: &RunConfig, out: &mut dyn Write) -> Result<RunResult, SpecError> {
        if config.list {
            runner::list_tree(&self.tree.borrow(), out)?;
            return Ok(RunResult::default());
        }
        Runner::new(Rc::clone(&self.tree), config, out).run()
    }
}

// ============================================================================
// run() — entry point
// ============================================================================

/// Build and run a test tree, then exit the process.
///
/// Call it from `fn main()` in a test target with `harness = false`.
/// The process exits with status 1 if registration fails, a hook fails,
/// or any test fails.
///
/// # Example
///
/// ```rust,no_run
/// fn main() {
///     greentea::run(|ctx| {
///         ctx.describe("Calculator", |ctx| {
///             ctx.it("adds", || greentea::assert_test(2 + 3 == 5))
///         })
///     });
/// }
/// ```
pub fn run(body: impl FnOnce(&Context) -> Result<(), SpecError>) {
    crate::init_logging();
    let config = RunConfig::from_args();
    let ctx = Context::new();

    let built = match &config.indent {
        Some(indent) => ctx.set_indentation(indent.clone()),
        None => Ok(()),
    }
    .and_then(|()| body(&ctx));
    if let Err(err) = built {
        eprintln!("greentea: {err}");
        std::process::exit(1);
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match ctx.run_with(&config, &mut out) {
        Ok(_) => {}
        Err(SpecError::SuiteFailed { .. }) => std::process::exit(1),
        Err(err) => {
            eprintln!("greentea: {err}");
            std::process::exit(1);
        }
    }
}
