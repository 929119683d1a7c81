//! `markdown.renderer` — renderer adapter constructor and HTML helpers.

use std::rc::Rc;

use mlua::{Lua, Table};

use crate::adapters::LuaNodeRenderer;
use crate::error::ErrorSink;
use crate::handles::LuaAdapter;
use crate::registry::Registration;

pub fn module(lua: &Lua, sink: ErrorSink) -> mlua::Result<Table> {
    let m = lua.create_table()?;

    let s = sink.clone();
    m.set(
        "newRenderer",
        lua.create_function(move |lua, table: Table| {
            lua.create_userdata(LuaAdapter(Registration::Renderer(Rc::new(
                LuaNodeRenderer::new(lua, table, s.clone()),
            ))))
        })?,
    )?;
    m.set(
        "escape",
        lua.create_function(|_, s: String| Ok(html_escape::encode_text(&s).into_owned()))?,
    )?;

    Ok(m)
}
