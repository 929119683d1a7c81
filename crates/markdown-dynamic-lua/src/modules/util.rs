//! `markdown.util` — small text helpers scripts reach for constantly.

use mlua::{Lua, Table};

pub fn module(lua: &Lua) -> mlua::Result<Table> {
    let m = lua.create_table()?;

    m.set(
        "trim",
        lua.create_function(|_, s: String| Ok(s.trim().to_string()))?,
    )?;
    m.set(
        "hasPrefix",
        lua.create_function(|_, (s, prefix): (String, String)| Ok(s.starts_with(&prefix)))?,
    )?;
    m.set(
        "hasSuffix",
        lua.create_function(|_, (s, suffix): (String, String)| Ok(s.ends_with(&suffix)))?,
    )?;
    m.set(
        "isBlank",
        lua.create_function(|_, s: String| Ok(s.trim().is_empty()))?,
    )?;

    Ok(m)
}
