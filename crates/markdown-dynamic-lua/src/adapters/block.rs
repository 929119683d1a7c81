//! Script-backed block parsing.

use markdown_dynamic_engine::ast::NodeRef;
use markdown_dynamic_engine::parser::{BlockParser, SharedContext, State};
use markdown_dynamic_engine::text::SharedReader;
use mlua::{Lua, Table, Value};

use super::{call_env, state_from_value};
use crate::call::protected;
use crate::error::{BridgeError, ErrorSink};
use crate::handles::node_from_value;
use crate::props::PropTable;

/// A block parser defined by a script table with `triggers`, `open`,
/// `continue` and `close` fields.
///
/// The fallback for every faulting operation is [`State::CLOSE`] without a
/// node: a misbehaving block ends instead of wedging the driver open.
pub struct LuaBlockParser {
    lua: Lua,
    table: Table,
    sink: ErrorSink,
    triggers: Vec<u8>,
    open_fn: Option<mlua::Function>,
    continue_fn: Option<mlua::Function>,
    close_fn: Option<mlua::Function>,
    can_interrupt: bool,
    can_indent: bool,
}

impl LuaBlockParser {
    pub fn new(lua: &Lua, table: Table, sink: ErrorSink) -> Self {
        let pt = PropTable::new("BlockParser", table.clone(), sink.clone());
        // A mistyped triggers field was already reported as a shape error.
        let triggers = match pt.bytes("triggers") {
            Some(triggers) => {
                if triggers.is_empty() {
                    (sink)(BridgeError::MissingTriggers);
                }
                triggers
            }
            None => Vec::new(),
        };
        Self {
            lua: lua.clone(),
            triggers,
            open_fn: pt.function("open"),
            continue_fn: pt.function("continue"),
            close_fn: pt.function("close"),
            can_interrupt: pt.bool_of("canInterruptParagraph"),
            can_indent: pt.bool_of("canAcceptIndentedLine"),
            table,
            sink,
        }
    }
}

impl BlockParser for LuaBlockParser {
    fn triggers(&self) -> &[u8] {
        &self.triggers
    }

    fn open(
        &self,
        parent: &NodeRef,
        reader: &SharedReader,
        ctx: &SharedContext,
    ) -> (Option<NodeRef>, State) {
        let Some(open) = &self.open_fn else {
            return (None, State::CLOSE);
        };
        let (n, r, c) = match call_env(&self.lua, parent, reader, ctx) {
            Ok(env) => env,
            Err(err) => {
                (self.sink)(err.into());
                return (None, State::CLOSE);
            }
        };
        let Some((node, state)) =
            protected::<(Value, Value)>(&self.sink, open, (self.table.clone(), n, r, c))
        else {
            return (None, State::CLOSE);
        };
        if matches!(node, Value::Nil) {
            return (None, State::CLOSE);
        }
        let Some(node) = node_from_value(&self.sink, "BlockParser", "open", node) else {
            return (None, State::CLOSE);
        };
        match state_from_value(&self.sink, "BlockParser", "open", state) {
            Some(state) => (Some(node), state),
            None => (None, State::CLOSE),
        }
    }

    fn continue_block(&self, node: &NodeRef, reader: &SharedReader, ctx: &SharedContext) -> State {
        let Some(continue_fn) = &self.continue_fn else {
            return State::CLOSE;
        };
        let (n, r, c) = match call_env(&self.lua, node, reader, ctx) {
            Ok(env) => env,
            Err(err) => {
                (self.sink)(err.into());
                return State::CLOSE;
            }
        };
        let Some(ret) = protected::<Value>(&self.sink, continue_fn, (self.table.clone(), n, r, c))
        else {
            return State::CLOSE;
        };
        state_from_value(&self.sink, "BlockParser", "continue", ret).unwrap_or(State::CLOSE)
    }

    fn close(&self, node: &NodeRef, reader: &SharedReader, ctx: &SharedContext) {
        let Some(close) = &self.close_fn else { return };
        let (n, r, c) = match call_env(&self.lua, node, reader, ctx) {
            Ok(env) => env,
            Err(err) => {
                (self.sink)(err.into());
                return;
            }
        };
        let _: Option<()> = protected(&self.sink, close, (self.table.clone(), n, r, c));
    }

    fn can_interrupt_paragraph(&self) -> bool {
        self.can_interrupt
    }

    fn can_accept_indented_line(&self) -> bool {
        self.can_indent
    }
}
