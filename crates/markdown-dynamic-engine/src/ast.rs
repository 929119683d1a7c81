//! The document tree.
//!
//! Node identity and parent/child linkage live in [`AstNode`]; everything a
//! node *means* (its kind tag, raw-content flag, named properties) lives in
//! its [`NodeData`] payload. That split is what lets extensions supply node
//! semantics from outside the engine: a payload only answers introspection
//! queries when the tree asks.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::{LazyLock, Mutex};

use crate::text::Span;

static KIND_NAMES: LazyLock<Mutex<Vec<String>>> = LazyLock::new(|| {
    Mutex::new(vec![
        "Document".to_string(),
        "Paragraph".to_string(),
        "Text".to_string(),
    ])
});

/// A small integer tag identifying what a node is, used by the renderer's
/// dispatch table. Builtin kinds are fixed; extensions allocate fresh kinds
/// through [`NodeKind::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeKind(u32);

pub const KIND_DOCUMENT: NodeKind = NodeKind(0);
pub const KIND_PARAGRAPH: NodeKind = NodeKind(1);
pub const KIND_TEXT: NodeKind = NodeKind(2);

impl NodeKind {
    /// Allocates a new kind and registers `name` for dump output.
    pub fn new(name: &str) -> NodeKind {
        let mut names = KIND_NAMES.lock().expect("kind registry poisoned");
        names.push(name.to_string());
        NodeKind((names.len() - 1) as u32)
    }

    /// Reconstructs a kind from a raw tag that crossed a script boundary.
    pub fn from_raw(raw: u32) -> NodeKind {
        NodeKind(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    pub fn name(self) -> String {
        let names = KIND_NAMES.lock().expect("kind registry poisoned");
        match names.get(self.0 as usize) {
            Some(name) => name.clone(),
            None => format!("NodeKind({})", self.0),
        }
    }
}

/// Payload of a tree node: kind, raw flag and named properties.
///
/// `is_raw` controls whether the inline phase parses the node's lines;
/// `prop`/`dump_props` feed the generic dump traversal and never core
/// rendering.
pub trait NodeData {
    fn kind(&self) -> NodeKind;

    fn is_raw(&self) -> bool {
        false
    }

    /// Source span for inline nodes that cover a byte range directly.
    fn span(&self) -> Option<Span> {
        None
    }

    fn prop(&self, _name: &str) -> Option<String> {
        None
    }

    fn dump_props(&self) -> Vec<(String, String)> {
        Vec::new()
    }
}

/// A node in the document tree. Links are owned here; semantics are
/// delegated to the payload.
pub struct AstNode {
    data: Box<dyn NodeData>,
    parent: RefCell<Weak<AstNode>>,
    children: RefCell<Vec<NodeRef>>,
    lines: RefCell<Vec<Span>>,
}

pub type NodeRef = Rc<AstNode>;

impl AstNode {
    pub fn new(data: Box<dyn NodeData>) -> NodeRef {
        Rc::new(Self {
            data,
            parent: RefCell::new(Weak::new()),
            children: RefCell::new(Vec::new()),
            lines: RefCell::new(Vec::new()),
        })
    }

    pub fn data(&self) -> &dyn NodeData {
        self.data.as_ref()
    }

    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }

    pub fn is_raw(&self) -> bool {
        self.data.is_raw()
    }

    pub fn parent(&self) -> Option<NodeRef> {
        self.parent.borrow().upgrade()
    }

    pub fn child_count(&self) -> usize {
        self.children.borrow().len()
    }

    pub fn child(&self, index: usize) -> Option<NodeRef> {
        self.children.borrow().get(index).cloned()
    }

    pub fn children(&self) -> Vec<NodeRef> {
        self.children.borrow().clone()
    }

    pub fn append_child(self: &Rc<Self>, child: NodeRef) {
        *child.parent.borrow_mut() = Rc::downgrade(self);
        self.children.borrow_mut().push(child);
    }

    pub fn insert_child(self: &Rc<Self>, index: usize, child: NodeRef) {
        *child.parent.borrow_mut() = Rc::downgrade(self);
        let mut children = self.children.borrow_mut();
        let index = index.min(children.len());
        children.insert(index, child);
    }

    pub fn remove_child(self: &Rc<Self>, index: usize) -> Option<NodeRef> {
        let mut children = self.children.borrow_mut();
        if index >= children.len() {
            return None;
        }
        let child = children.remove(index);
        *child.parent.borrow_mut() = Weak::new();
        Some(child)
    }

    /// Raw source lines fed to a leaf block while it was open.
    pub fn lines(&self) -> Vec<Span> {
        self.lines.borrow().clone()
    }

    pub fn push_line(&self, span: Span) {
        self.lines.borrow_mut().push(span);
    }

    /// Source text of this node: its own span for inline nodes, its raw
    /// lines (newline-joined) for leaf blocks.
    pub fn text(&self, source: &str) -> String {
        if let Some(span) = self.data.span() {
            return span.text(source).to_string();
        }
        let lines = self.lines.borrow();
        lines
            .iter()
            .map(|s| s.text(source))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl std::fmt::Debug for AstNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AstNode")
            .field("kind", &self.kind().name())
            .field("children", &self.children.borrow().len())
            .finish()
    }
}

/// Outcome of one step of a tree walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkStatus {
    Continue,
    SkipChildren,
    Stop,
}

/// Depth-first walk calling `f(node, entering)` on the way down and
/// `f(node, false)` on the way back up.
pub fn walk<F>(node: &NodeRef, f: &mut F) -> WalkStatus
where
    F: FnMut(&NodeRef, bool) -> WalkStatus,
{
    match f(node, true) {
        WalkStatus::Stop => return WalkStatus::Stop,
        WalkStatus::SkipChildren => return f(node, false),
        WalkStatus::Continue => {}
    }
    for child in node.children() {
        if walk(&child, f) == WalkStatus::Stop {
            return WalkStatus::Stop;
        }
    }
    f(node, false)
}

// Builtin payloads

pub struct Document;

impl NodeData for Document {
    fn kind(&self) -> NodeKind {
        KIND_DOCUMENT
    }
}

pub struct Paragraph;

impl NodeData for Paragraph {
    fn kind(&self) -> NodeKind {
        KIND_PARAGRAPH
    }
}

/// Plain inline text covering one span of the source.
pub struct Text {
    pub span: Span,
}

impl NodeData for Text {
    fn kind(&self) -> NodeKind {
        KIND_TEXT
    }

    fn span(&self) -> Option<Span> {
        Some(self.span)
    }
}

/// Debug rendering of a subtree, one node per line, payload props inline.
pub fn dump(node: &NodeRef, source: &str) -> String {
    let mut out = String::new();
    dump_into(node, source, 0, &mut out);
    out
}

fn dump_into(node: &NodeRef, source: &str, level: usize, out: &mut String) {
    out.push_str(&"  ".repeat(level));
    out.push_str(&node.kind().name());
    let props = node.data().dump_props();
    if !props.is_empty() {
        let rendered: Vec<String> = props.iter().map(|(k, v)| format!("{k}={v:?}")).collect();
        out.push_str(&format!(" {{{}}}", rendered.join(", ")));
    }
    if node.child_count() == 0 {
        let text = node.text(source);
        if !text.is_empty() {
            out.push_str(&format!(" {text:?}"));
        }
    }
    out.push('\n');
    for child in node.children() {
        dump_into(&child, source, level + 1, out);
    }
}
