//! The protected call gateway.
//!
//! Every adapter operation that enters Lua goes through exactly one call
//! here. mlua already runs functions under Lua's protected call, so a
//! script-side fault arrives as an `Err`; the gateway reports it to the
//! sink and yields `None`, leaving the caller to substitute its documented
//! fallback. Return values come back as raw [`mlua::Value`]s — conversion
//! cannot fail at this boundary, so shape validation stays with the
//! adapter that knows the contract.

use mlua::{FromLuaMulti, Function, IntoLuaMulti};

use crate::error::{BridgeError, ErrorSink};

/// Calls `f` with `args`, converting a script fault into a sink report.
pub(crate) fn protected<R>(sink: &ErrorSink, f: &Function, args: impl IntoLuaMulti) -> Option<R>
where
    R: FromLuaMulti,
{
    match f.call::<R>(args) {
        Ok(results) => Some(results),
        Err(err) => {
            (sink)(BridgeError::Script(err));
            None
        }
    }
}
