//! Proc macros for the `greentea` BDD test engine.

mod codegen;
mod dsl;

/// Build a registration closure from the describe/it DSL.
///
/// Expands to a `|ctx: &greentea::Context| -> Result<(), greentea::SpecError>`
/// closure; call it on a [`Context`] (or hand it to `greentea::run`).
///
/// # Example
///
/// ```text
/// let register = greentea::spec! {
///     describe "Calculator" {
///         before "reset memory" { reset(); }
///         before_each { clear_display(); }
///
///         it "adds two numbers" {
///             greentea::assert_test(2 + 3 == 5);
///         }
///
///         it "divides by zero";          // pending
///
///         it { greentea::assert_test(true); }   // reported as spec_1
///
///         context "with negative numbers" {
///             it "handles negatives" {
///                 greentea::assert_test(-1 + 3 == 2);
///             }
///         }
///
///         after "power off" { shutdown(); }
///     }
/// };
///
/// let ctx = greentea::Context::new();
/// register(&ctx)?;
/// ctx.run()?;
/// ```
///
/// # Supported DSL keywords
///
/// ## Containers
/// - `describe "name" { ... }` / `context "name" { ... }` / `when "name" { ... }`
///
/// ## Tests
/// - `it "name" { ... }` / `specify "name" { ... }`
/// - `it "name";` — pending test, no body
/// - `it { ... }` — nameless test (named `spec_1`, `spec_2`, ... per suite)
///
/// ## Hooks (description optional)
/// - `before ["desc"] { ... }` (alias `before_all`) — once, before the suite's own tests
/// - `before_each ["desc"] { ... }` — before every test of the suite
/// - `after_each ["desc"] { ... }` — after every test of the suite
/// - `after ["desc"] { ... }` (alias `after_all`) — once, after the suite's own tests
///
/// # Execution order
///
/// ```text
/// nested suites -> before -> (before_each -> test -> after_each)* -> after
/// ```
///
/// [`Context`]: ../greentea/struct.Context.html
#[proc_macro]
pub fn spec(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let suite = syn::parse_macro_input!(input as dsl::Suite);
    codegen::generate_spec(suite).into()
}

/// BDD runner macro — generates a `fn main()` that runs the DSL through
/// `greentea::run`.
///
/// # Setup
///
/// In `Cargo.toml`:
/// ```toml
/// [[test]]
/// name = "my_bdd_tests"
/// harness = false
/// ```
///
/// In your test file:
/// ```text
/// greentea::bdd! {
///     describe "Calculator" {
///         it "adds" { greentea::assert_test(2 + 3 == 5); }
///     }
/// }
/// ```
///
/// Run with:
/// ```sh
/// cargo test --test my_bdd_tests
/// ```
#[proc_macro]
pub fn bdd(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let suite = syn::parse_macro_input!(input as dsl::Suite);
    codegen::generate_bdd(suite).into()
}
