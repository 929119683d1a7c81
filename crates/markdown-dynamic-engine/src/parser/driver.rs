//! The block-phase state machine.
//!
//! One line at a time: first the innermost open block gets a
//! `continue_block` call, then (if the line was not claimed) block parsers
//! are offered the line by trigger byte, then the paragraph fallback
//! collects it. Nested containers report [`State::HAS_CHILDREN`] and have
//! their inner lines fed back through the same open/paragraph logic.

use std::cell::RefCell;
use std::rc::Rc;

use crate::ast::{AstNode, Document, NodeRef, Paragraph};
use crate::text::{LineReader, SharedReader, Span};

use super::inline;
use super::{
    AstTransformer, BlockParser, DelimiterProcessor, InlineParser, ParagraphTransformer,
    ParseContext, SharedContext, State,
};

/// Indentation at which a line stops triggering ordinary block parsers.
const CODE_INDENT: usize = 4;

type OpenBlock = (NodeRef, Rc<dyn BlockParser>, State);

/// What the open phase did with the current line.
enum OpenOutcome {
    NotClaimed,
    /// A parser claimed the line; `Some` when the block stays open.
    Claimed(Option<OpenBlock>),
}

pub struct Parser {
    pub(crate) block_parsers: Vec<Rc<dyn BlockParser>>,
    pub(crate) inline_parsers: Vec<Rc<dyn InlineParser>>,
    pub(crate) delimiter_processors: Vec<Rc<dyn DelimiterProcessor>>,
    pub(crate) ast_transformers: Vec<Rc<dyn AstTransformer>>,
    pub(crate) paragraph_transformers: Vec<Rc<dyn ParagraphTransformer>>,
}

impl Parser {
    /// Parses `source` into a document tree, driving every registered
    /// extension point.
    pub fn parse(&self, source: &str) -> NodeRef {
        let reader: SharedReader = LineReader::new(source).shared();
        let ctx: SharedContext = Rc::new(RefCell::new(ParseContext::new()));
        let doc = AstNode::new(Box::new(Document));

        let mut open: Vec<OpenBlock> = Vec::new();
        let mut paragraph: Option<NodeRef> = None;

        loop {
            let (pos, line) = {
                let r = reader.borrow();
                if r.eof() {
                    break;
                }
                (r.pos(), r.current_line())
            };

            // Continuation of the innermost open block.
            if let Some((node, parser, opened_as)) = open.last().cloned() {
                let state = parser.continue_block(&node, &reader, &ctx);
                if state.is_continue() {
                    if !opened_as.contains(State::HAS_CHILDREN) {
                        // Raw leaf: the rest of the line is block content.
                        let after = reader.borrow().pos().min(line.end);
                        node.push_line(Span::new(after, line.end));
                        reader.borrow_mut().advance_line();
                        continue;
                    }
                    // Container: fall through so the line opens children.
                    if reader.borrow().pos() > line.end {
                        continue; // parser consumed the line itself
                    }
                } else {
                    self.close_paragraph(&mut paragraph, &reader, &ctx);
                    parser.close(&node, &reader, &ctx);
                    open.pop();
                    if state.is_close() {
                        // The line is the block's terminator.
                        if reader.borrow().pos() <= line.end {
                            reader.borrow_mut().advance_line();
                        }
                        continue;
                    }
                    // NONE: give the line back to the outer logic.
                    reader.borrow_mut().set_pos(pos);
                }
            }

            let parent = open
                .last()
                .map(|(node, _, _)| node.clone())
                .unwrap_or_else(|| doc.clone());

            let line_text = line.text(source);
            if line_text.trim().is_empty() {
                self.close_paragraph(&mut paragraph, &reader, &ctx);
                reader.borrow_mut().advance_line();
                continue;
            }

            let indent = line_text.len() - line_text.trim_start_matches(' ').len();
            match self.try_open(&parent, &reader, &ctx, &mut paragraph, pos, line, indent) {
                OpenOutcome::Claimed(opened) => {
                    if let Some(block) = opened {
                        open.push(block);
                    }
                    continue;
                }
                OpenOutcome::NotClaimed => {}
            }

            // Paragraph fallback.
            reader.borrow_mut().set_pos(pos);
            let para = match &paragraph {
                Some(p) => p.clone(),
                None => {
                    let p = AstNode::new(Box::new(Paragraph));
                    parent.append_child(p.clone());
                    paragraph = Some(p.clone());
                    p
                }
            };
            para.push_line(Span::new(line.start + indent, line.end));
            reader.borrow_mut().advance_line();
        }

        // End of input forces everything closed, innermost first.
        self.close_paragraph(&mut paragraph, &reader, &ctx);
        while let Some((node, parser, _)) = open.pop() {
            parser.close(&node, &reader, &ctx);
        }

        inline::parse_inlines(self, &doc, &reader, &ctx);

        for t in &self.ast_transformers {
            t.transform(&doc, &reader, &ctx);
        }

        doc
    }

    /// Offers the line to block parsers in priority order.
    #[allow(clippy::too_many_arguments)]
    fn try_open(
        &self,
        parent: &NodeRef,
        reader: &SharedReader,
        ctx: &SharedContext,
        paragraph: &mut Option<NodeRef>,
        line_start: usize,
        line: Span,
        indent: usize,
    ) -> OpenOutcome {
        let first = {
            let r = reader.borrow();
            r.source().as_bytes().get(line.start + indent).copied()
        };
        let Some(first) = first else {
            return OpenOutcome::NotClaimed;
        };

        for bp in &self.block_parsers {
            if !bp.triggers().contains(&first) {
                continue;
            }
            if indent >= CODE_INDENT && !bp.can_accept_indented_line() {
                continue;
            }
            if paragraph.is_some() && !bp.can_interrupt_paragraph() {
                continue;
            }
            reader.borrow_mut().set_pos(line.start + indent);
            let (node, state) = bp.open(parent, reader, ctx);
            let Some(node) = node else {
                reader.borrow_mut().set_pos(line_start);
                continue;
            };
            if state.is_none() || (state.contains(State::REQUIRE_PARAGRAPH) && paragraph.is_none())
            {
                reader.borrow_mut().set_pos(line_start);
                continue;
            }

            self.close_paragraph(paragraph, reader, ctx);
            parent.append_child(node.clone());
            let opened = if state.is_close() {
                bp.close(&node, reader, ctx);
                None
            } else {
                Some((node, bp.clone(), state))
            };
            // The opening line counts as consumed.
            if reader.borrow().pos() <= line.end {
                reader.borrow_mut().advance_line();
            }
            return OpenOutcome::Claimed(opened);
        }
        OpenOutcome::NotClaimed
    }

    fn close_paragraph(
        &self,
        paragraph: &mut Option<NodeRef>,
        reader: &SharedReader,
        ctx: &SharedContext,
    ) {
        let Some(para) = paragraph.take() else {
            return;
        };
        if para.lines().is_empty() {
            if let Some(parent) = para.parent()
                && let Some(idx) = index_of_child(&parent, &para)
            {
                parent.remove_child(idx);
            }
            return;
        }
        for t in &self.paragraph_transformers {
            t.transform(&para, reader, ctx);
        }
    }
}

pub(crate) fn index_of_child(parent: &NodeRef, child: &NodeRef) -> Option<usize> {
    parent.children().iter().position(|c| Rc::ptr_eq(c, child))
}
