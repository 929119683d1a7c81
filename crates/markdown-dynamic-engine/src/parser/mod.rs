//! Parser extension points and the drivers that call them.
//!
//! Each trait here is one fixed capability of the pipeline. Implementations
//! are registered on the [`crate::MarkdownBuilder`] with a priority and are
//! driven by [`driver`] (block phase) and [`inline`] (inline phase).

mod driver;
mod inline;
mod state;

pub use driver::Parser;
pub use state::State;

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::NodeRef;
use crate::text::SharedReader;

/// Per-parse state shared between extensions.
///
/// Values are opaque to the engine; extensions coordinate by key. One
/// context lives for exactly one document parse.
#[derive(Default)]
pub struct ParseContext {
    vars: HashMap<String, Box<dyn Any>>,
}

pub type SharedContext = Rc<RefCell<ParseContext>>;

impl ParseContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: Box<dyn Any>) {
        self.vars.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&dyn Any> {
        self.vars.get(key).map(|v| v.as_ref())
    }
}

/// Parses blocks opened by one of its trigger bytes.
///
/// Driver protocol, per line:
/// - `open` is called with the reader at the first non-space byte of a line
///   whose first non-space byte is one of `triggers()`. Returning a node
///   with [`State::CONTINUE`] keeps the block open; [`State::CLOSE`]
///   attaches and closes it immediately; [`State::NONE`] (or no node)
///   means no match. The opening line counts as consumed.
/// - While open, `continue_block` sees each following line.
///   [`State::CONTINUE`] feeds the line to the block (raw line for
///   [`State::NO_CHILDREN`], child parsing for [`State::HAS_CHILDREN`]);
///   [`State::CLOSE`] closes the block and consumes the line as its
///   terminator; [`State::NONE`] closes the block and gives the line back.
/// - `close` runs exactly once when the block's lifetime ends, including
///   forced closure at end of input.
pub trait BlockParser {
    /// Bytes that cause the driver to try this parser. Must be non-empty.
    fn triggers(&self) -> &[u8];

    fn open(
        &self,
        parent: &NodeRef,
        reader: &SharedReader,
        ctx: &SharedContext,
    ) -> (Option<NodeRef>, State);

    fn continue_block(&self, node: &NodeRef, reader: &SharedReader, ctx: &SharedContext) -> State;

    fn close(&self, node: &NodeRef, reader: &SharedReader, ctx: &SharedContext);

    /// Whether a trigger byte may open this block while a paragraph is open.
    fn can_interrupt_paragraph(&self) -> bool {
        false
    }

    /// Whether this parser is offered lines indented four or more spaces.
    fn can_accept_indented_line(&self) -> bool {
        false
    }
}

/// Parses inline constructs starting at one of its trigger bytes.
pub trait InlineParser {
    fn triggers(&self) -> &[u8];

    /// Called with the reader at the trigger byte. `Some(node)` attaches
    /// the node and resumes scanning after the reader position; `None`
    /// lets the byte fall through to delimiter and text handling.
    fn parse(
        &self,
        parent: &NodeRef,
        reader: &SharedReader,
        ctx: &SharedContext,
    ) -> Option<NodeRef>;

    /// Called once after the inline scan of a leaf block finishes.
    fn close_block(&self, _parent: &NodeRef, _reader: &SharedReader, _ctx: &SharedContext) {}
}

/// Transforms the finished document tree, once per parse.
pub trait AstTransformer {
    fn transform(&self, doc: &NodeRef, reader: &SharedReader, ctx: &SharedContext);
}

/// Transforms each paragraph when it closes during the block phase.
pub trait ParagraphTransformer {
    fn transform(&self, paragraph: &NodeRef, reader: &SharedReader, ctx: &SharedContext);
}

/// One run of a potential delimiter byte found by the inline scanner.
#[derive(Debug, Clone, Copy)]
pub struct Delimiter {
    pub byte: u8,
    pub length: usize,
    pub can_open: bool,
    pub can_close: bool,
}

/// Matches delimiter runs (emphasis-style constructs).
pub trait DelimiterProcessor {
    fn is_delimiter(&self, byte: u8) -> bool;

    fn can_open_closer(&self, opener: &Delimiter, closer: &Delimiter) -> bool;

    /// Produces the node wrapping the content between a matched pair.
    /// `consumes` is the number of delimiter bytes taken from each side.
    /// `None` leaves the delimiters as literal text.
    fn on_match(&self, consumes: usize) -> Option<NodeRef>;
}
