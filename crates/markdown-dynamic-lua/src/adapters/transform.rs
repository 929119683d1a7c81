//! Script-backed tree transformers.

use markdown_dynamic_engine::ast::NodeRef;
use markdown_dynamic_engine::parser::{AstTransformer, ParagraphTransformer, SharedContext};
use markdown_dynamic_engine::text::SharedReader;
use mlua::{Lua, Table};

use super::call_env;
use crate::call::protected;
use crate::error::ErrorSink;
use crate::props::PropTable;

fn run_transform(
    lua: &Lua,
    sink: &ErrorSink,
    table: &Table,
    f: &Option<mlua::Function>,
    node: &NodeRef,
    reader: &SharedReader,
    ctx: &SharedContext,
) {
    let Some(f) = f else { return };
    let (n, r, c) = match call_env(lua, node, reader, ctx) {
        Ok(env) => env,
        Err(err) => {
            (sink)(err.into());
            return;
        }
    };
    let _: Option<()> = protected(sink, f, (table.clone(), n, r, c));
}

/// Whole-document transformer defined by a table with a `transform` field.
pub struct LuaAstTransformer {
    lua: Lua,
    table: Table,
    sink: ErrorSink,
    transform_fn: Option<mlua::Function>,
}

impl LuaAstTransformer {
    pub fn new(lua: &Lua, table: Table, sink: ErrorSink) -> Self {
        let pt = PropTable::new("ASTTransformer", table.clone(), sink.clone());
        Self {
            lua: lua.clone(),
            transform_fn: pt.function("transform"),
            table,
            sink,
        }
    }
}

impl AstTransformer for LuaAstTransformer {
    fn transform(&self, doc: &NodeRef, reader: &SharedReader, ctx: &SharedContext) {
        run_transform(
            &self.lua,
            &self.sink,
            &self.table,
            &self.transform_fn,
            doc,
            reader,
            ctx,
        );
    }
}

/// Paragraph-close transformer defined by a table with a `transform` field.
pub struct LuaParagraphTransformer {
    lua: Lua,
    table: Table,
    sink: ErrorSink,
    transform_fn: Option<mlua::Function>,
}

impl LuaParagraphTransformer {
    pub fn new(lua: &Lua, table: Table, sink: ErrorSink) -> Self {
        let pt = PropTable::new("ParagraphTransformer", table.clone(), sink.clone());
        Self {
            lua: lua.clone(),
            transform_fn: pt.function("transform"),
            table,
            sink,
        }
    }
}

impl ParagraphTransformer for LuaParagraphTransformer {
    fn transform(&self, paragraph: &NodeRef, reader: &SharedReader, ctx: &SharedContext) {
        run_transform(
            &self.lua,
            &self.sink,
            &self.table,
            &self.transform_fn,
            paragraph,
            reader,
            ctx,
        );
    }
}
