//! `markdown.ast` — node construction and tree constants.

use markdown_dynamic_engine::ast::{
    AstNode, NodeKind, Text, KIND_DOCUMENT, KIND_PARAGRAPH, KIND_TEXT,
};
use markdown_dynamic_engine::text::Span;
use mlua::{Lua, Table};

use crate::error::ErrorSink;
use crate::handles::LuaNode;
use crate::node::DynamicNodeData;

pub fn module(lua: &Lua, sink: ErrorSink) -> mlua::Result<Table> {
    let m = lua.create_table()?;

    let s = sink.clone();
    m.set(
        "newBlockNode",
        lua.create_function(move |lua, table: Table| {
            let node = AstNode::new(Box::new(DynamicNodeData::block(table, s.clone())));
            lua.create_userdata(LuaNode(node))
        })?,
    )?;
    let s = sink.clone();
    m.set(
        "newInlineNode",
        lua.create_function(move |lua, table: Table| {
            let node = AstNode::new(Box::new(DynamicNodeData::inline(table, s.clone())));
            lua.create_userdata(LuaNode(node))
        })?,
    )?;
    m.set(
        "newNodeKind",
        lua.create_function(|_, name: String| Ok(NodeKind::new(&name).raw()))?,
    )?;
    m.set(
        "newText",
        lua.create_function(|lua, (start, end): (usize, usize)| {
            let node = AstNode::new(Box::new(Text {
                span: Span::new(start, end),
            }));
            lua.create_userdata(LuaNode(node))
        })?,
    )?;

    m.set("kindDocument", KIND_DOCUMENT.raw())?;
    m.set("kindParagraph", KIND_PARAGRAPH.raw())?;
    m.set("kindText", KIND_TEXT.raw())?;

    // Walk statuses returned by render functions.
    m.set("walkContinue", 0)?;
    m.set("walkSkipChildren", 1)?;
    m.set("walkStop", 2)?;

    Ok(m)
}
