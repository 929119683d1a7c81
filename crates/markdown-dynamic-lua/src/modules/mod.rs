//! The `markdown.*` module family preloaded into every extension state.
//!
//! Modules are installed through `package.preload`, so a script pays for a
//! module only when it requires it and `require` caching behaves normally.

mod ast;
mod parser;
mod renderer;
mod util;

use mlua::{Lua, MultiValue, Table};

use crate::error::ErrorSink;

pub fn install(lua: &Lua, sink: &ErrorSink) -> mlua::Result<()> {
    let package: Table = lua.globals().get("package")?;
    let preload: Table = package.get("preload")?;

    let s = sink.clone();
    preload.set(
        "markdown.ast",
        lua.create_function(move |lua, _: MultiValue| ast::module(lua, s.clone()))?,
    )?;
    let s = sink.clone();
    preload.set(
        "markdown.parser",
        lua.create_function(move |lua, _: MultiValue| parser::module(lua, s.clone()))?,
    )?;
    let s = sink.clone();
    preload.set(
        "markdown.renderer",
        lua.create_function(move |lua, _: MultiValue| renderer::module(lua, s.clone()))?,
    )?;
    preload.set(
        "markdown.util",
        lua.create_function(move |lua, _: MultiValue| util::module(lua))?,
    )?;
    Ok(())
}
