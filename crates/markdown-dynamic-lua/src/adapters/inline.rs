//! Script-backed inline parsing.

use markdown_dynamic_engine::ast::NodeRef;
use markdown_dynamic_engine::parser::{InlineParser, SharedContext};
use markdown_dynamic_engine::text::SharedReader;
use mlua::{Lua, Table, Value};

use super::call_env;
use crate::call::protected;
use crate::error::ErrorSink;
use crate::handles::node_from_value;
use crate::props::PropTable;

/// An inline parser defined by a script table with `triggers`, `parse` and
/// optionally `closeBlock`. A faulting `parse` reads as no match, so the
/// trigger byte falls through to delimiter and text handling. Empty
/// triggers leave the parser inert rather than failing construction.
pub struct LuaInlineParser {
    lua: Lua,
    table: Table,
    sink: ErrorSink,
    triggers: Vec<u8>,
    parse_fn: Option<mlua::Function>,
    close_block_fn: Option<mlua::Function>,
}

impl LuaInlineParser {
    pub fn new(lua: &Lua, table: Table, sink: ErrorSink) -> Self {
        let pt = PropTable::new("InlineParser", table.clone(), sink.clone());
        let triggers = pt.bytes("triggers").unwrap_or_default();
        Self {
            lua: lua.clone(),
            triggers,
            parse_fn: pt.function("parse"),
            close_block_fn: pt.optional_function("closeBlock"),
            table,
            sink,
        }
    }
}

impl InlineParser for LuaInlineParser {
    fn triggers(&self) -> &[u8] {
        &self.triggers
    }

    fn parse(
        &self,
        parent: &NodeRef,
        reader: &SharedReader,
        ctx: &SharedContext,
    ) -> Option<NodeRef> {
        let parse = self.parse_fn.as_ref()?;
        let (n, r, c) = match call_env(&self.lua, parent, reader, ctx) {
            Ok(env) => env,
            Err(err) => {
                (self.sink)(err.into());
                return None;
            }
        };
        let ret: Value = protected(&self.sink, parse, (self.table.clone(), n, r, c))?;
        node_from_value(&self.sink, "InlineParser", "parse", ret)
    }

    fn close_block(&self, parent: &NodeRef, reader: &SharedReader, ctx: &SharedContext) {
        let Some(close_block) = &self.close_block_fn else {
            return;
        };
        let (n, r, c) = match call_env(&self.lua, parent, reader, ctx) {
            Ok(env) => env,
            Err(err) => {
                (self.sink)(err.into());
                return;
            }
        };
        let _: Option<()> = protected(&self.sink, close_block, (self.table.clone(), n, r, c));
    }
}
