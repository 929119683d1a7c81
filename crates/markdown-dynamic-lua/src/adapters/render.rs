//! Script-backed node rendering.

use std::cell::RefCell;
use std::rc::Rc;

use markdown_dynamic_engine::ast::{NodeKind, NodeRef, WalkStatus};
use markdown_dynamic_engine::render::{HtmlWriter, NodeRenderer, Registerer};
use mlua::{Lua, Table, Value};

use crate::call::protected;
use crate::error::{BridgeError, ErrorSink};
use crate::handles::{LuaNode, LuaRegisterer, LuaWriter};
use crate::props::PropTable;

/// A node renderer defined by a table with a `registerFuncs` field.
///
/// `registerFuncs` runs once at pipeline setup with a registerer handle;
/// each function it binds becomes the render function for that kind,
/// called entering and exiting every node of the kind.
pub struct LuaNodeRenderer {
    lua: Lua,
    table: Table,
    sink: ErrorSink,
    register_fn: Option<mlua::Function>,
}

impl LuaNodeRenderer {
    pub fn new(lua: &Lua, table: Table, sink: ErrorSink) -> Self {
        let pt = PropTable::new("NodeRenderer", table.clone(), sink.clone());
        Self {
            lua: lua.clone(),
            register_fn: pt.function("registerFuncs"),
            table,
            sink,
        }
    }
}

impl NodeRenderer for LuaNodeRenderer {
    fn register_funcs(&self, reg: &mut Registerer) {
        let Some(register) = &self.register_fn else {
            return;
        };
        let bindings = Rc::new(RefCell::new(Vec::new()));
        let ud = match self.lua.create_userdata(LuaRegisterer(bindings.clone())) {
            Ok(ud) => ud,
            Err(err) => {
                (self.sink)(err.into());
                return;
            }
        };
        if protected::<()>(&self.sink, register, (self.table.clone(), ud)).is_none() {
            return;
        }
        for (kind, func) in bindings.borrow_mut().drain(..) {
            let lua = self.lua.clone();
            let sink = self.sink.clone();
            reg.register(
                NodeKind::from_raw(kind),
                Box::new(move |writer, source, node, entering| {
                    render_call(&lua, &sink, &func, writer, source, node, entering)
                }),
            );
        }
    }
}

fn render_call(
    lua: &Lua,
    sink: &ErrorSink,
    f: &mlua::Function,
    writer: &HtmlWriter,
    source: &str,
    node: &NodeRef,
    entering: bool,
) -> WalkStatus {
    let env = (|| -> mlua::Result<_> {
        Ok((
            lua.create_userdata(LuaWriter(writer.clone()))?,
            lua.create_userdata(LuaNode(node.clone()))?,
        ))
    })();
    let (w, n) = match env {
        Ok(env) => env,
        Err(err) => {
            (sink)(err.into());
            return WalkStatus::Continue;
        }
    };
    let Some(ret) = protected::<Value>(sink, f, (w, source.to_string(), n, entering)) else {
        return WalkStatus::Continue;
    };
    match ret {
        Value::Nil => WalkStatus::Continue,
        Value::Integer(n) => walk_from_raw(n),
        Value::Number(f) => walk_from_raw(f as i64),
        _ => {
            (sink)(BridgeError::InvalidReturn {
                owner: "NodeRenderer",
                callback: "render",
                expected: "number or nil",
            });
            WalkStatus::Continue
        }
    }
}

fn walk_from_raw(raw: i64) -> WalkStatus {
    match raw {
        1 => WalkStatus::SkipChildren,
        2 => WalkStatus::Stop,
        _ => WalkStatus::Continue,
    }
}
