//! Registration variants collected from scripts before pipeline assembly.

use std::rc::Rc;

use markdown_dynamic_engine::parser::{
    AstTransformer, BlockParser, DelimiterProcessor, InlineParser, ParagraphTransformer,
};
use markdown_dynamic_engine::render::NodeRenderer;

/// One adapter awaiting registration, tagged with its pipeline slot.
pub enum Registration {
    Block(Rc<dyn BlockParser>),
    Inline(Rc<dyn InlineParser>),
    Ast(Rc<dyn AstTransformer>),
    Paragraph(Rc<dyn ParagraphTransformer>),
    Delimiter(Rc<dyn DelimiterProcessor>),
    Renderer(Rc<dyn NodeRenderer>),
}

/// Everything the scripts of one extension set registered, in call order.
#[derive(Default)]
pub struct Registrations {
    pub blocks: Vec<(Rc<dyn BlockParser>, i32)>,
    pub inlines: Vec<(Rc<dyn InlineParser>, i32)>,
    pub ast_transformers: Vec<(Rc<dyn AstTransformer>, i32)>,
    pub paragraph_transformers: Vec<(Rc<dyn ParagraphTransformer>, i32)>,
    pub delimiter_processors: Vec<(Rc<dyn DelimiterProcessor>, i32)>,
    pub node_renderers: Vec<(Rc<dyn NodeRenderer>, i32)>,
}
