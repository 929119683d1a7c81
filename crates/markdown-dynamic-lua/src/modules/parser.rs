//! `markdown.parser` — parser adapter constructors and state codes.

use markdown_dynamic_engine::parser::State;
use mlua::{Lua, Table};

use crate::adapters::{
    LuaAstTransformer, LuaBlockParser, LuaDelimiterProcessor, LuaInlineParser,
    LuaParagraphTransformer,
};
use crate::error::ErrorSink;
use crate::handles::LuaAdapter;
use crate::registry::Registration;

pub fn module(lua: &Lua, sink: ErrorSink) -> mlua::Result<Table> {
    let m = lua.create_table()?;

    let s = sink.clone();
    m.set(
        "newBlockParser",
        lua.create_function(move |lua, table: Table| {
            lua.create_userdata(LuaAdapter(Registration::Block(std::rc::Rc::new(
                LuaBlockParser::new(lua, table, s.clone()),
            ))))
        })?,
    )?;
    let s = sink.clone();
    m.set(
        "newInlineParser",
        lua.create_function(move |lua, table: Table| {
            lua.create_userdata(LuaAdapter(Registration::Inline(std::rc::Rc::new(
                LuaInlineParser::new(lua, table, s.clone()),
            ))))
        })?,
    )?;
    let s = sink.clone();
    m.set(
        "newASTTransformer",
        lua.create_function(move |lua, table: Table| {
            lua.create_userdata(LuaAdapter(Registration::Ast(std::rc::Rc::new(
                LuaAstTransformer::new(lua, table, s.clone()),
            ))))
        })?,
    )?;
    let s = sink.clone();
    m.set(
        "newParagraphTransformer",
        lua.create_function(move |lua, table: Table| {
            lua.create_userdata(LuaAdapter(Registration::Paragraph(std::rc::Rc::new(
                LuaParagraphTransformer::new(lua, table, s.clone()),
            ))))
        })?,
    )?;
    let s = sink.clone();
    m.set(
        "newDelimiterProcessor",
        lua.create_function(move |lua, table: Table| {
            lua.create_userdata(LuaAdapter(Registration::Delimiter(std::rc::Rc::new(
                LuaDelimiterProcessor::new(lua, table, s.clone()),
            ))))
        })?,
    )?;

    m.set("none", State::NONE.raw())?;
    m.set("continue", State::CONTINUE.raw())?;
    m.set("close", State::CLOSE.raw())?;
    m.set("hasChildren", State::HAS_CHILDREN.raw())?;
    m.set("noChildren", State::NO_CHILDREN.raw())?;
    m.set("requireParagraph", State::REQUIRE_PARAGRAPH.raw())?;

    Ok(m)
}
