//! Suite tree storage — nodes, records, counters and the registration cursor.
//!
//! Nodes live in an arena owned by [`Tree`]. Child lists own their nodes;
//! the `parent` link is a plain index used for depth and counter
//! propagation only.

use crate::error::{HookKind, SpecError};
use crate::format::{Indent, OutcomeKind};
use std::fmt;
use std::rc::Rc;

/// Index of a node inside its [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);
}

// ============================================================================
// Records
// ============================================================================

/// A described unit of user code: a hook or a test body.
pub struct Record {
    description: String,
    body: Box<dyn Fn()>,
}

impl Record {
    pub fn new(description: impl Into<String>, body: impl Fn() + 'static) -> Self {
        Record {
            description: description.into(),
            body: Box::new(body),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn call(&self) {
        (self.body)()
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Nodes
// ============================================================================

/// Passed / pending / failed tallies.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counts {
    pub passed: usize,
    pub pending: usize,
    pub failed: usize,
}

impl Counts {
    fn bump(&mut self, kind: OutcomeKind) {
        match kind {
            OutcomeKind::Passed => self.passed += 1,
            OutcomeKind::Pending => self.pending += 1,
            OutcomeKind::Failed => self.failed += 1,
        }
    }
}

/// A suite: child suites, its own tests and four hook lists.
#[derive(Debug)]
pub struct SuiteNode {
    description: String,
    parent: Option<NodeId>,
    depth: usize,
    children: Vec<NodeId>,
    tests: Vec<Rc<Record>>,
    before: Vec<Rc<Record>>,
    before_each: Vec<Rc<Record>>,
    after_each: Vec<Rc<Record>>,
    after: Vec<Rc<Record>>,
    counts: Counts,
    nameless: usize,
}

impl SuiteNode {
    fn new(description: String, parent: Option<NodeId>, depth: usize) -> Self {
        SuiteNode {
            description,
            parent,
            depth,
            children: Vec::new(),
            tests: Vec::new(),
            before: Vec::new(),
            before_each: Vec::new(),
            after_each: Vec::new(),
            after: Vec::new(),
            counts: Counts::default(),
            nameless: 0,
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn tests(&self) -> &[Rc<Record>] {
        &self.tests
    }

    pub fn hooks(&self, kind: HookKind) -> &[Rc<Record>] {
        match kind {
            HookKind::Before => &self.before,
            HookKind::BeforeEach => &self.before_each,
            HookKind::AfterEach => &self.after_each,
            HookKind::After => &self.after,
        }
    }

    fn hooks_mut(&mut self, kind: HookKind) -> &mut Vec<Rc<Record>> {
        match kind {
            HookKind::Before => &mut self.before,
            HookKind::BeforeEach => &mut self.before_each,
            HookKind::AfterEach => &mut self.after_each,
            HookKind::After => &mut self.after,
        }
    }

    pub fn counts(&self) -> Counts {
        self.counts
    }
}

// ============================================================================
// Tree + cursor
// ============================================================================

/// Lifecycle stage of a tree. Registration and execution never overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Registering,
    Executing,
}

/// The whole test tree plus its registration cursor.
#[derive(Debug)]
pub struct Tree {
    nodes: Vec<SuiteNode>,
    current: NodeId,
    indent: Indent,
    phase: Phase,
}

impl Default for Tree {
    fn default() -> Self {
        Tree::new("")
    }
}

impl Tree {
    /// A tree holding only the root. An empty banner is not printed.
    pub fn new(banner: impl Into<String>) -> Self {
        Tree {
            nodes: vec![SuiteNode::new(banner.into(), None, 0)],
            current: NodeId::ROOT,
            indent: Indent::default(),
            phase: Phase::Registering,
        }
    }

    pub fn root(&self) -> &SuiteNode {
        &self.nodes[NodeId::ROOT.0]
    }

    pub fn node(&self, id: NodeId) -> &SuiteNode {
        &self.nodes[id.0]
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn indent(&self) -> &Indent {
        &self.indent
    }

    fn ensure_registering(&self, operation: &'static str) -> Result<(), SpecError> {
        match self.phase {
            Phase::Registering => Ok(()),
            Phase::Executing => Err(SpecError::after_run_started(operation)),
        }
    }

    /// Append a child suite to the current node and move the cursor onto it.
    pub fn open_suite(&mut self, description: impl Into<String>) -> Result<NodeId, SpecError> {
        self.ensure_registering("describe")?;
        let parent = self.current;
        let id = NodeId(self.nodes.len());
        let depth = self.nodes[parent.0].depth + 1;
        self.nodes
            .push(SuiteNode::new(description.into(), Some(parent), depth));
        self.nodes[parent.0].children.push(id);
        self.current = id;
        Ok(id)
    }

    /// Move the cursor back to the parent of `id`.
    pub fn close_suite(&mut self, id: NodeId) {
        self.current = self.nodes[id.0].parent.unwrap_or(NodeId::ROOT);
    }

    pub fn add_test(
        &mut self,
        description: impl Into<String>,
        body: impl Fn() + 'static,
    ) -> Result<(), SpecError> {
        self.ensure_registering("it")?;
        let record = Rc::new(Record::new(description, body));
        self.nodes[self.current.0].tests.push(record);
        Ok(())
    }

    /// Register a test named `spec_N` after its position among the
    /// current node's nameless tests.
    pub fn add_nameless_test(&mut self, body: impl Fn() + 'static) -> Result<(), SpecError> {
        self.ensure_registering("specify")?;
        let node = &mut self.nodes[self.current.0];
        node.nameless += 1;
        let record = Rc::new(Record::new(format!("spec_{}", node.nameless), body));
        node.tests.push(record);
        Ok(())
    }

    pub fn add_hook(
        &mut self,
        kind: HookKind,
        description: impl Into<String>,
        body: impl Fn() + 'static,
    ) -> Result<(), SpecError> {
        let operation = match kind {
            HookKind::Before => "before",
            HookKind::BeforeEach => "before_each",
            HookKind::AfterEach => "after_each",
            HookKind::After => "after",
        };
        self.ensure_registering(operation)?;
        let record = Rc::new(Record::new(description, body));
        self.nodes[self.current.0].hooks_mut(kind).push(record);
        Ok(())
    }

    pub fn set_indent(&mut self, indent: Indent) -> Result<(), SpecError> {
        self.ensure_registering("set_indentation")?;
        self.indent = indent;
        Ok(())
    }

    /// Close the registration phase. Fails if it was already closed.
    pub fn begin_execution(&mut self) -> Result<(), SpecError> {
        self.ensure_registering("run")?;
        self.phase = Phase::Executing;
        Ok(())
    }

    /// Count an outcome on `id` and every ancestor up to the root.
    pub fn record_outcome(&mut self, id: NodeId, kind: OutcomeKind) {
        let mut next = Some(id);
        while let Some(node_id) = next {
            let node = &mut self.nodes[node_id.0];
            node.counts.bump(kind);
            next = node.parent;
        }
    }

    /// Non-empty descriptions from the outermost suite down to `id`.
    pub fn path(&self, id: NodeId) -> Vec<&str> {
        let mut path = Vec::new();
        let mut next = Some(id);
        while let Some(node_id) = next {
            let node = &self.nodes[node_id.0];
            if !node.description.is_empty() {
                path.push(node.description.as_str());
            }
            next = node.parent;
        }
        path.reverse();
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tree_has_only_root() {
        let tree = Tree::default();
        assert_eq!(tree.nodes.len(), 1);
        assert_eq!(tree.current, NodeId::ROOT);
        assert_eq!(tree.root().depth(), 0);
        assert_eq!(tree.root().parent, None);
        assert_eq!(tree.phase(), Phase::Registering);
    }

    #[test]
    fn test_open_close_moves_cursor_and_sets_depth() {
        let mut tree = Tree::default();
        let a = tree.open_suite("A").unwrap();
        let b = tree.open_suite("B").unwrap();
        assert_eq!(tree.current, b);
        assert_eq!(tree.node(a).depth(), 1);
        assert_eq!(tree.node(b).depth(), 2);
        assert_eq!(tree.node(b).parent, Some(a));

        tree.close_suite(b);
        assert_eq!(tree.current, a);
        let c = tree.open_suite("C").unwrap();
        tree.close_suite(c);
        tree.close_suite(a);
        assert_eq!(tree.current, NodeId::ROOT);
        assert_eq!(tree.node(a).children(), &[b, c]);
        assert_eq!(tree.root().children(), &[a]);
    }

    #[test]
    fn test_records_attach_to_current_in_order() {
        let mut tree = Tree::default();
        let a = tree.open_suite("A").unwrap();
        tree.add_test("first", || {}).unwrap();
        tree.add_test("second", || {}).unwrap();
        tree.add_hook(HookKind::Before, "one", || {}).unwrap();
        tree.add_hook(HookKind::Before, "two", || {}).unwrap();
        tree.add_hook(HookKind::AfterEach, "cleanup", || {}).unwrap();

        let node = tree.node(a);
        let tests: Vec<&str> = node.tests().iter().map(|r| r.description()).collect();
        let before: Vec<&str> = node
            .hooks(HookKind::Before)
            .iter()
            .map(|r| r.description())
            .collect();
        assert_eq!(tests, vec!["first", "second"]);
        assert_eq!(before, vec!["one", "two"]);
        assert_eq!(node.hooks(HookKind::AfterEach).len(), 1);
        assert!(node.hooks(HookKind::BeforeEach).is_empty());
        assert!(tree.root().tests().is_empty());
    }

    #[test]
    fn test_nameless_tests_are_numbered_per_node() {
        let mut tree = Tree::default();
        tree.add_nameless_test(|| {}).unwrap();
        tree.add_nameless_test(|| {}).unwrap();
        let a = tree.open_suite("A").unwrap();
        tree.add_nameless_test(|| {}).unwrap();
        let names: Vec<&str> = tree.root().tests().iter().map(|r| r.description()).collect();
        assert_eq!(names, vec!["spec_1", "spec_2"]);
        assert_eq!(tree.node(a).tests()[0].description(), "spec_1");
    }

    #[test]
    fn test_record_outcome_propagates_to_root() {
        let mut tree = Tree::default();
        let a = tree.open_suite("A").unwrap();
        let b = tree.open_suite("B").unwrap();
        tree.close_suite(b);
        let c = tree.open_suite("C").unwrap();

        tree.record_outcome(b, OutcomeKind::Failed);
        tree.record_outcome(b, OutcomeKind::Passed);
        tree.record_outcome(c, OutcomeKind::Pending);
        tree.record_outcome(a, OutcomeKind::Passed);

        assert_eq!(
            tree.node(b).counts(),
            Counts { passed: 1, pending: 0, failed: 1 }
        );
        assert_eq!(
            tree.node(c).counts(),
            Counts { passed: 0, pending: 1, failed: 0 }
        );
        assert_eq!(
            tree.node(a).counts(),
            Counts { passed: 2, pending: 1, failed: 1 }
        );
        assert_eq!(tree.root().counts(), tree.node(a).counts());
    }

    #[test]
    fn test_phase_gate_blocks_registration() {
        let mut tree = Tree::default();
        tree.begin_execution().unwrap();
        assert!(tree.open_suite("late").unwrap_err().is_invalid_phase());
        assert!(tree.add_test("late", || {}).unwrap_err().is_invalid_phase());
        assert!(tree
            .add_hook(HookKind::After, "late", || {})
            .unwrap_err()
            .is_invalid_phase());
        assert!(tree.set_indent(Indent::Spaces(2)).unwrap_err().is_invalid_phase());
        assert!(tree.begin_execution().unwrap_err().is_invalid_phase());
        assert_eq!(tree.nodes.len(), 1);
        assert!(tree.root().tests().is_empty());
    }

    #[test]
    fn test_path_skips_empty_banner() {
        let mut tree = Tree::default();
        let a = tree.open_suite("A").unwrap();
        let b = tree.open_suite("B").unwrap();
        assert_eq!(tree.path(b), vec!["A", "B"]);
        assert_eq!(tree.path(a), vec!["A"]);

        let mut banner = Tree::new("Shop");
        let s = banner.open_suite("cart").unwrap();
        assert_eq!(banner.path(s), vec!["Shop", "cart"]);
    }
}
