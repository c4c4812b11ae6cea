use greentea::{assert_test, Context, SpecError};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

fn main() {
    greentea::run(|ctx| {
        // =================================================================
        // Basic describe / context / it
        // =================================================================
        ctx.describe("Calculator", |ctx| {
            ctx.it("adds two numbers", || {
                let (a, b) = (2, 3);
                assert_test(a + b == 5);
            })?;

            ctx.it("multiplies", || {
                let (a, b) = (3, 4);
                assert_test(a * b == 12);
            })?;

            ctx.context("with negative numbers", |ctx| {
                ctx.it("handles negatives", || {
                    let (a, b) = (-1, 3);
                    assert_test(a + b == 2);
                })
            })?;

            ctx.pending("divides by zero")
        })?;

        // =================================================================
        // Hooks share state through Rc
        // =================================================================
        let stack: Rc<RefCell<Vec<i32>>> = Rc::default();
        ctx.describe("Stack", |ctx| {
            let s = Rc::clone(&stack);
            ctx.before_each("push a seed value", move || s.borrow_mut().push(1))?;

            let s = Rc::clone(&stack);
            ctx.after_each("", move || s.borrow_mut().clear())?;

            let s = Rc::clone(&stack);
            ctx.it("starts with the seed", move || {
                assert_test(*s.borrow() == vec![1]);
            })?;

            let s = Rc::clone(&stack);
            ctx.it("is reset between tests", move || {
                s.borrow_mut().push(2);
                assert_test(s.borrow().len() == 2);
            })
        })?;

        // =================================================================
        // Children finish before the parent's own tests
        // =================================================================
        let child_ran = Rc::new(Cell::new(false));
        ctx.describe("Ordering", |ctx| {
            let seen = Rc::clone(&child_ran);
            ctx.it("runs after its nested suite", move || {
                assert_test(seen.get());
            })?;

            let ran = Rc::clone(&child_ran);
            ctx.describe("nested", |ctx| {
                ctx.it("runs first", move || {
                    ran.set(true);
                    assert_test(true);
                })
            })
        })?;

        // =================================================================
        // Registration is closed once the run starts
        // =================================================================
        let handle: Context = ctx.clone();
        ctx.describe("Phase gate", |ctx| {
            ctx.it("rejects late registration", move || {
                let late = handle.it("too late", || {});
                assert_test(matches!(late, Err(SpecError::InvalidPhase { .. })));
            })
        })?;

        ctx.specify(|| assert_test(true))
    });
}
