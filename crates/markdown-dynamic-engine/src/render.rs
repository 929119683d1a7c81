//! HTML rendering through a per-kind dispatch table.
//!
//! Node renderers do not intercept individual render calls; they run once
//! at setup time and bind render functions into the table. Kinds without a
//! bound function render their children and nothing else.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::{NodeKind, NodeRef, WalkStatus, KIND_PARAGRAPH, KIND_TEXT};

/// Output buffer shared with render functions.
///
/// Cloning is shallow; every clone appends to the same buffer, which is what
/// lets script-registered render functions write during a host-driven walk.
#[derive(Clone, Default)]
pub struct HtmlWriter {
    out: Rc<RefCell<String>>,
}

impl HtmlWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&self, s: &str) {
        self.out.borrow_mut().push_str(s);
    }

    pub fn write_escaped(&self, s: &str) {
        let mut out = self.out.borrow_mut();
        out.push_str(&html_escape::encode_text(s));
    }

    /// Drains the buffer.
    pub fn take(&self) -> String {
        std::mem::take(&mut self.out.borrow_mut())
    }
}

/// A render function: called entering and exiting each node of its kind.
pub type RenderFn = Box<dyn Fn(&HtmlWriter, &str, &NodeRef, bool) -> WalkStatus>;

/// Collects kind → render function bindings at renderer-setup time.
#[derive(Default)]
pub struct Registerer {
    funcs: HashMap<u32, RenderFn>,
}

impl Registerer {
    pub fn register(&mut self, kind: NodeKind, f: RenderFn) {
        self.funcs.insert(kind.raw(), f);
    }
}

/// Binds render functions for the node kinds it knows about.
pub trait NodeRenderer {
    fn register_funcs(&self, reg: &mut Registerer);
}

pub struct HtmlRenderer {
    funcs: HashMap<u32, RenderFn>,
}

impl HtmlRenderer {
    pub fn new(renderers: &[Rc<dyn NodeRenderer>]) -> Self {
        let mut reg = Registerer::default();
        register_builtins(&mut reg);
        for r in renderers {
            r.register_funcs(&mut reg);
        }
        Self { funcs: reg.funcs }
    }

    pub fn render(&self, doc: &NodeRef, source: &str) -> String {
        let writer = HtmlWriter::new();
        self.render_node(&writer, source, doc);
        writer.take()
    }

    fn render_node(&self, writer: &HtmlWriter, source: &str, node: &NodeRef) -> WalkStatus {
        let f = self.funcs.get(&node.kind().raw());
        let status = match f {
            Some(f) => f(writer, source, node, true),
            None => WalkStatus::Continue,
        };
        match status {
            WalkStatus::Stop => return WalkStatus::Stop,
            WalkStatus::SkipChildren => {}
            WalkStatus::Continue => {
                for child in node.children() {
                    if self.render_node(writer, source, &child) == WalkStatus::Stop {
                        return WalkStatus::Stop;
                    }
                }
            }
        }
        if let Some(f) = f {
            return match f(writer, source, node, false) {
                WalkStatus::Stop => WalkStatus::Stop,
                _ => WalkStatus::Continue,
            };
        }
        WalkStatus::Continue
    }
}

fn register_builtins(reg: &mut Registerer) {
    reg.register(
        KIND_PARAGRAPH,
        Box::new(|w, _source, _node, entering| {
            w.write(if entering { "<p>" } else { "</p>\n" });
            WalkStatus::Continue
        }),
    );
    reg.register(
        KIND_TEXT,
        Box::new(|w, source, node, entering| {
            if entering {
                w.write_escaped(&node.text(source));
            }
            WalkStatus::Continue
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AstNode, Document, Paragraph, Text};
    use crate::text::Span;
    use pretty_assertions::assert_eq;

    #[test]
    fn paragraph_and_text_builtins() {
        let source = "a < b";
        let doc = AstNode::new(Box::new(Document));
        let para = AstNode::new(Box::new(Paragraph));
        para.append_child(AstNode::new(Box::new(Text {
            span: Span::new(0, 5),
        })));
        doc.append_child(para);

        let r = HtmlRenderer::new(&[]);
        assert_eq!(r.render(&doc, source), "<p>a &lt; b</p>\n");
    }

    #[test]
    fn unregistered_kind_renders_children_only() {
        let source = "x";
        let kind = NodeKind::new("RenderTestWrapper");
        struct Wrapper(NodeKind);
        impl crate::ast::NodeData for Wrapper {
            fn kind(&self) -> NodeKind {
                self.0
            }
        }
        let doc = AstNode::new(Box::new(Document));
        let wrapper = AstNode::new(Box::new(Wrapper(kind)));
        wrapper.append_child(AstNode::new(Box::new(Text {
            span: Span::new(0, 1),
        })));
        doc.append_child(wrapper);

        let r = HtmlRenderer::new(&[]);
        assert_eq!(r.render(&doc, source), "x");
    }
}
