//! Script-backed delimiter processing.

use markdown_dynamic_engine::ast::NodeRef;
use markdown_dynamic_engine::parser::{Delimiter, DelimiterProcessor};
use mlua::{Lua, Table, Value};

use crate::call::protected;
use crate::error::{BridgeError, ErrorSink};
use crate::handles::{node_from_value, LuaDelimiter};
use crate::props::PropTable;

/// A delimiter processor defined by a table with `isDelimiter`,
/// `canOpenCloser` and `onMatch` fields. All three are required; a missing
/// field makes the corresponding query answer "no" (or "no node"), which
/// leaves delimiter runs as literal text.
pub struct LuaDelimiterProcessor {
    lua: Lua,
    table: Table,
    sink: ErrorSink,
    is_delimiter_fn: Option<mlua::Function>,
    can_open_closer_fn: Option<mlua::Function>,
    on_match_fn: Option<mlua::Function>,
}

impl LuaDelimiterProcessor {
    pub fn new(lua: &Lua, table: Table, sink: ErrorSink) -> Self {
        let pt = PropTable::new("DelimiterProcessor", table.clone(), sink.clone());
        Self {
            lua: lua.clone(),
            is_delimiter_fn: pt.function("isDelimiter"),
            can_open_closer_fn: pt.function("canOpenCloser"),
            on_match_fn: pt.function("onMatch"),
            table,
            sink,
        }
    }

    fn bool_call(&self, callback: &'static str, f: &mlua::Function, args: impl mlua::IntoLuaMulti) -> bool {
        match protected::<Value>(&self.sink, f, args) {
            Some(Value::Boolean(b)) => b,
            Some(_) => {
                (self.sink)(BridgeError::InvalidReturn {
                    owner: "DelimiterProcessor",
                    callback,
                    expected: "boolean",
                });
                false
            }
            None => false,
        }
    }
}

impl DelimiterProcessor for LuaDelimiterProcessor {
    fn is_delimiter(&self, byte: u8) -> bool {
        let Some(f) = &self.is_delimiter_fn else {
            return false;
        };
        self.bool_call("isDelimiter", f, (self.table.clone(), byte))
    }

    fn can_open_closer(&self, opener: &Delimiter, closer: &Delimiter) -> bool {
        let Some(f) = &self.can_open_closer_fn else {
            return false;
        };
        let env = (|| -> mlua::Result<_> {
            Ok((
                self.lua.create_userdata(LuaDelimiter(*opener))?,
                self.lua.create_userdata(LuaDelimiter(*closer))?,
            ))
        })();
        let (o, c) = match env {
            Ok(env) => env,
            Err(err) => {
                (self.sink)(err.into());
                return false;
            }
        };
        self.bool_call("canOpenCloser", f, (self.table.clone(), o, c))
    }

    fn on_match(&self, consumes: usize) -> Option<NodeRef> {
        let f = self.on_match_fn.as_ref()?;
        let ret: Value = protected(&self.sink, f, consumes)?;
        node_from_value(&self.sink, "DelimiterProcessor", "onMatch", ret)
    }
}
