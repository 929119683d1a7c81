//! Adapters that present script callback tables as engine extension traits.
//!
//! Every adapter resolves its fields once at construction (through
//! [`crate::props::PropTable`]) and holds resolved [`mlua::Function`]s for
//! the rest of its life, so per-call overhead is the protected call itself.
//! A missing or mistyped field is reported at construction and the affected
//! operation falls back to its documented default; an adapter never refuses
//! to exist.
//!
//! Callbacks receive the original table as their first argument, so scripts
//! written `function tbl:open(...)` and `open = function(self, ...)` both
//! work.

mod block;
mod delimiter;
mod inline;
mod render;
mod transform;

pub use block::LuaBlockParser;
pub use delimiter::LuaDelimiterProcessor;
pub use inline::LuaInlineParser;
pub use render::LuaNodeRenderer;
pub use transform::{LuaAstTransformer, LuaParagraphTransformer};

use markdown_dynamic_engine::ast::NodeRef;
use markdown_dynamic_engine::parser::{SharedContext, State};
use markdown_dynamic_engine::text::SharedReader;
use mlua::{AnyUserData, Lua, Value};

use crate::error::{BridgeError, ErrorSink};
use crate::handles::{LuaContext, LuaNode, LuaReader};

/// Wraps the host objects of one callback invocation as userdata.
pub(crate) fn call_env(
    lua: &Lua,
    node: &NodeRef,
    reader: &SharedReader,
    ctx: &SharedContext,
) -> mlua::Result<(AnyUserData, AnyUserData, AnyUserData)> {
    Ok((
        lua.create_userdata(LuaNode(node.clone()))?,
        lua.create_userdata(LuaReader(reader.clone()))?,
        lua.create_userdata(LuaContext(ctx.clone()))?,
    ))
}

/// Decodes a numeric state code returned by a script; anything else
/// reports a return-shape error.
pub(crate) fn state_from_value(
    sink: &ErrorSink,
    owner: &'static str,
    callback: &'static str,
    value: Value,
) -> Option<State> {
    match value {
        Value::Integer(n) => Some(State::from_raw(n)),
        Value::Number(f) => Some(State::from_raw(f as i64)),
        _ => {
            (sink)(BridgeError::InvalidReturn {
                owner,
                callback,
                expected: "number",
            });
            None
        }
    }
}
