//! Extensible markdown pipeline.
//!
//! The pipeline is a fixed set of ordered extension points: block parsers,
//! inline parsers, AST transformers, paragraph transformers, delimiter
//! processors and node renderers. The engine owns the document tree, the
//! line reader and the drivers that call into registered extensions; it
//! ships only a paragraph/text baseline and expects everything else to be
//! plugged in (for example from Lua, via `markdown-dynamic-lua`).

pub mod ast;
pub mod parser;
pub mod render;
pub mod text;

mod pipeline;

pub use pipeline::{Extender, Markdown, MarkdownBuilder};
