//! Pipeline assembly: registration with priorities, extenders, conversion.

use std::rc::Rc;

use crate::ast::NodeRef;
use crate::parser::{
    AstTransformer, BlockParser, DelimiterProcessor, InlineParser, ParagraphTransformer, Parser,
};
use crate::render::{HtmlRenderer, NodeRenderer};

/// Anything that contributes registrations to a pipeline under
/// construction. One extender may register any number of parsers,
/// transformers and renderers.
pub trait Extender {
    fn extend(&self, md: &mut MarkdownBuilder);
}

struct Prioritized<T> {
    value: T,
    priority: i32,
}

fn sorted<T>(mut items: Vec<Prioritized<T>>) -> Vec<T> {
    // Stable: equal priorities keep registration order.
    items.sort_by_key(|p| p.priority);
    items.into_iter().map(|p| p.value).collect()
}

/// Builder for a [`Markdown`] pipeline. Lower priority runs first.
#[derive(Default)]
pub struct MarkdownBuilder {
    block_parsers: Vec<Prioritized<Rc<dyn BlockParser>>>,
    inline_parsers: Vec<Prioritized<Rc<dyn InlineParser>>>,
    ast_transformers: Vec<Prioritized<Rc<dyn AstTransformer>>>,
    paragraph_transformers: Vec<Prioritized<Rc<dyn ParagraphTransformer>>>,
    delimiter_processors: Vec<Prioritized<Rc<dyn DelimiterProcessor>>>,
    node_renderers: Vec<Prioritized<Rc<dyn NodeRenderer>>>,
}

impl MarkdownBuilder {
    /// Applies an extender immediately; its registrations land on this
    /// builder in the order the extender makes them.
    pub fn extension(mut self, ext: &dyn Extender) -> Self {
        ext.extend(&mut self);
        self
    }

    pub fn register_block_parser(&mut self, value: Rc<dyn BlockParser>, priority: i32) {
        self.block_parsers.push(Prioritized { value, priority });
    }

    pub fn register_inline_parser(&mut self, value: Rc<dyn InlineParser>, priority: i32) {
        self.inline_parsers.push(Prioritized { value, priority });
    }

    pub fn register_ast_transformer(&mut self, value: Rc<dyn AstTransformer>, priority: i32) {
        self.ast_transformers.push(Prioritized { value, priority });
    }

    pub fn register_paragraph_transformer(
        &mut self,
        value: Rc<dyn ParagraphTransformer>,
        priority: i32,
    ) {
        self.paragraph_transformers
            .push(Prioritized { value, priority });
    }

    pub fn register_delimiter_processor(
        &mut self,
        value: Rc<dyn DelimiterProcessor>,
        priority: i32,
    ) {
        self.delimiter_processors
            .push(Prioritized { value, priority });
    }

    pub fn register_node_renderer(&mut self, value: Rc<dyn NodeRenderer>, priority: i32) {
        self.node_renderers.push(Prioritized { value, priority });
    }

    pub fn build(self) -> Markdown {
        Markdown {
            parser: Parser {
                block_parsers: sorted(self.block_parsers),
                inline_parsers: sorted(self.inline_parsers),
                delimiter_processors: sorted(self.delimiter_processors),
                ast_transformers: sorted(self.ast_transformers),
                paragraph_transformers: sorted(self.paragraph_transformers),
            },
            renderers: sorted(self.node_renderers),
        }
    }
}

/// A fully assembled parse/render pipeline.
///
/// Not thread-safe: one pipeline (and everything registered into it) stays
/// on the thread that built it. Independent pipelines do not share state.
pub struct Markdown {
    parser: Parser,
    renderers: Vec<Rc<dyn NodeRenderer>>,
}

impl Markdown {
    pub fn builder() -> MarkdownBuilder {
        MarkdownBuilder::default()
    }

    /// Parses `source` into a document tree without rendering.
    pub fn parse(&self, source: &str) -> NodeRef {
        self.parser.parse(source)
    }

    /// Parses `source` and renders it to HTML.
    pub fn convert(&self, source: &str) -> String {
        let doc = self.parse(source);
        HtmlRenderer::new(&self.renderers).render(&doc, source)
    }
}
