//! Userdata handles that scripts receive and pass back.
//!
//! Each handle wraps a shared host object behind an `Rc`, so the value a
//! script gets is exactly the value the host is operating on. Handles are
//! opaque: scripts interact through the methods declared here and return
//! handles unmodified (for example a node handle produced by
//! `markdown.ast.newBlockNode` and handed back from `open`).

use std::cell::RefCell;
use std::rc::Rc;

use markdown_dynamic_engine::MarkdownBuilder;
use markdown_dynamic_engine::ast::NodeRef;
use markdown_dynamic_engine::parser::{Delimiter, SharedContext};
use markdown_dynamic_engine::render::HtmlWriter;
use markdown_dynamic_engine::text::SharedReader;
use mlua::{AnyUserData, IntoLuaMulti, UserData, UserDataMethods, Value};

use crate::error::{BridgeError, ErrorSink};
use crate::registry::{Registration, Registrations};

/// A node in the host document tree.
pub struct LuaNode(pub NodeRef);

impl UserData for LuaNode {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_method("kind", |_, this, ()| Ok(this.0.kind().raw()));
        methods.add_method("isRaw", |_, this, ()| Ok(this.0.is_raw()));
        methods.add_method("appendChild", |_, this, child: AnyUserData| {
            let child = child.borrow::<LuaNode>()?;
            this.0.append_child(child.0.clone());
            Ok(())
        });
        methods.add_method("childCount", |_, this, ()| Ok(this.0.child_count()));
        methods.add_method("child", |lua, this, i: usize| {
            match i.checked_sub(1).and_then(|i| this.0.child(i)) {
                Some(child) => Ok(Value::UserData(lua.create_userdata(LuaNode(child))?)),
                None => Ok(Value::Nil),
            }
        });
        methods.add_method("parent", |lua, this, ()| match this.0.parent() {
            Some(parent) => Ok(Value::UserData(lua.create_userdata(LuaNode(parent))?)),
            None => Ok(Value::Nil),
        });
        methods.add_method("text", |_, this, source: String| Ok(this.0.text(&source)));
        methods.add_method("lineCount", |_, this, ()| Ok(this.0.lines().len()));
        methods.add_method("line", |lua, this, i: usize| {
            let lines = this.0.lines();
            match i.checked_sub(1).and_then(|i| lines.get(i)) {
                Some(span) => (span.start, span.end).into_lua_multi(lua),
                None => Value::Nil.into_lua_multi(lua),
            }
        });
        methods.add_method("pushLine", |_, this, (start, end): (usize, usize)| {
            this.0
                .push_line(markdown_dynamic_engine::text::Span::new(start, end));
            Ok(())
        });
    }
}

/// The shared source reader for the current parse.
pub struct LuaReader(pub SharedReader);

impl UserData for LuaReader {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_method("currentLine", |_, this, ()| {
            Ok(this.0.borrow().current_line_text().to_string())
        });
        methods.add_method("lineSpan", |_, this, ()| {
            let span = this.0.borrow().current_line();
            Ok((span.start, span.end))
        });
        methods.add_method("peek", |_, this, ()| Ok(this.0.borrow().peek()));
        methods.add_method("pos", |_, this, ()| Ok(this.0.borrow().pos()));
        methods.add_method("setPos", |_, this, pos: usize| {
            this.0.borrow_mut().set_pos(pos);
            Ok(())
        });
        methods.add_method("advance", |_, this, n: usize| {
            this.0.borrow_mut().advance(n);
            Ok(())
        });
        methods.add_method("advanceLine", |_, this, ()| {
            this.0.borrow_mut().advance_line();
            Ok(())
        });
        methods.add_method("source", |_, this, ()| {
            Ok(this.0.borrow().source().to_string())
        });
    }
}

/// Per-parse shared state; values round-trip through the host untouched.
pub struct LuaContext(pub SharedContext);

impl UserData for LuaContext {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_method("get", |_, this, key: String| {
            let ctx = this.0.borrow();
            Ok(ctx
                .get(&key)
                .and_then(|any| any.downcast_ref::<Value>())
                .cloned()
                .unwrap_or(Value::Nil))
        });
        methods.add_method("set", |_, this, (key, value): (String, Value)| {
            this.0.borrow_mut().set(key, Box::new(value));
            Ok(())
        });
    }
}

/// The render output buffer.
pub struct LuaWriter(pub HtmlWriter);

impl UserData for LuaWriter {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_method("write", |_, this, s: String| {
            this.0.write(&s);
            Ok(())
        });
        methods.add_method("writeEscaped", |_, this, s: String| {
            this.0.write_escaped(&s);
            Ok(())
        });
    }
}

/// Collects per-kind render function bindings during renderer setup.
pub struct LuaRegisterer(pub Rc<RefCell<Vec<(u32, mlua::Function)>>>);

impl UserData for LuaRegisterer {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_method("register", |_, this, (kind, f): (u32, mlua::Function)| {
            this.0.borrow_mut().push((kind, f));
            Ok(())
        });
    }
}

/// One delimiter run, as seen by `canOpenCloser`.
pub struct LuaDelimiter(pub Delimiter);

impl UserData for LuaDelimiter {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_method("byte", |_, this, ()| Ok(this.0.byte));
        methods.add_method("char", |_, this, ()| {
            Ok((this.0.byte as char).to_string())
        });
        methods.add_method("length", |_, this, ()| Ok(this.0.length));
        methods.add_method("canOpen", |_, this, ()| Ok(this.0.can_open));
        methods.add_method("canClose", |_, this, ()| Ok(this.0.can_close));
    }
}

/// The pipeline handle given to every extension entry function.
///
/// Registrations are collected while scripts run and applied to the real
/// builder when the extension attachment finishes, preserving call order.
pub struct LuaPipeline(pub Rc<RefCell<Registrations>>);

const DEFAULT_PRIORITY: i32 = 500;

fn priority(p: Option<i64>) -> i32 {
    p.map(|p| p as i32).unwrap_or(DEFAULT_PRIORITY)
}

fn wrong_adapter(method: &str, expected: &str) -> mlua::Error {
    mlua::Error::RuntimeError(format!("{method} expects a {expected}"))
}

impl UserData for LuaPipeline {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_method(
            "registerBlockParser",
            |_, this, (ud, prio): (AnyUserData, Option<i64>)| {
                match &ud.borrow::<LuaAdapter>()?.0 {
                    Registration::Block(p) => {
                        this.0.borrow_mut().blocks.push((p.clone(), priority(prio)));
                        Ok(())
                    }
                    _ => Err(wrong_adapter("registerBlockParser", "block parser")),
                }
            },
        );
        methods.add_method(
            "registerInlineParser",
            |_, this, (ud, prio): (AnyUserData, Option<i64>)| {
                match &ud.borrow::<LuaAdapter>()?.0 {
                    Registration::Inline(p) => {
                        this.0.borrow_mut().inlines.push((p.clone(), priority(prio)));
                        Ok(())
                    }
                    _ => Err(wrong_adapter("registerInlineParser", "inline parser")),
                }
            },
        );
        methods.add_method(
            "registerASTTransformer",
            |_, this, (ud, prio): (AnyUserData, Option<i64>)| {
                match &ud.borrow::<LuaAdapter>()?.0 {
                    Registration::Ast(t) => {
                        this.0
                            .borrow_mut()
                            .ast_transformers
                            .push((t.clone(), priority(prio)));
                        Ok(())
                    }
                    _ => Err(wrong_adapter("registerASTTransformer", "transformer")),
                }
            },
        );
        methods.add_method(
            "registerParagraphTransformer",
            |_, this, (ud, prio): (AnyUserData, Option<i64>)| {
                match &ud.borrow::<LuaAdapter>()?.0 {
                    Registration::Paragraph(t) => {
                        this.0
                            .borrow_mut()
                            .paragraph_transformers
                            .push((t.clone(), priority(prio)));
                        Ok(())
                    }
                    _ => Err(wrong_adapter(
                        "registerParagraphTransformer",
                        "paragraph transformer",
                    )),
                }
            },
        );
        methods.add_method(
            "registerDelimiterProcessor",
            |_, this, (ud, prio): (AnyUserData, Option<i64>)| {
                match &ud.borrow::<LuaAdapter>()?.0 {
                    Registration::Delimiter(d) => {
                        this.0
                            .borrow_mut()
                            .delimiter_processors
                            .push((d.clone(), priority(prio)));
                        Ok(())
                    }
                    _ => Err(wrong_adapter(
                        "registerDelimiterProcessor",
                        "delimiter processor",
                    )),
                }
            },
        );
        methods.add_method(
            "registerNodeRenderer",
            |_, this, (ud, prio): (AnyUserData, Option<i64>)| {
                match &ud.borrow::<LuaAdapter>()?.0 {
                    Registration::Renderer(r) => {
                        this.0
                            .borrow_mut()
                            .node_renderers
                            .push((r.clone(), priority(prio)));
                        Ok(())
                    }
                    _ => Err(wrong_adapter("registerNodeRenderer", "node renderer")),
                }
            },
        );
    }
}

/// An adapter produced by one of the `markdown.parser` / `markdown.renderer`
/// constructors, waiting to be registered on the pipeline handle.
pub struct LuaAdapter(pub Registration);

impl UserData for LuaAdapter {}

/// Extracts a node handle from a callback's return value.
///
/// Nil means "no node" without a report; anything that is not a node
/// handle reports one return-shape error and also yields `None`.
pub(crate) fn node_from_value(
    sink: &ErrorSink,
    owner: &'static str,
    callback: &'static str,
    value: Value,
) -> Option<NodeRef> {
    match value {
        Value::Nil => None,
        Value::UserData(ud) => match ud.borrow::<LuaNode>() {
            Ok(node) => Some(node.0.clone()),
            Err(_) => {
                (sink)(BridgeError::InvalidReturn {
                    owner,
                    callback,
                    expected: "node or nil",
                });
                None
            }
        },
        _ => {
            (sink)(BridgeError::InvalidReturn {
                owner,
                callback,
                expected: "node or nil",
            });
            None
        }
    }
}

/// Applies collected registrations to the pipeline builder in order.
pub(crate) fn apply_registrations(regs: &mut Registrations, md: &mut MarkdownBuilder) {
    for (p, prio) in regs.blocks.drain(..) {
        md.register_block_parser(p, prio);
    }
    for (p, prio) in regs.inlines.drain(..) {
        md.register_inline_parser(p, prio);
    }
    for (t, prio) in regs.ast_transformers.drain(..) {
        md.register_ast_transformer(t, prio);
    }
    for (t, prio) in regs.paragraph_transformers.drain(..) {
        md.register_paragraph_transformer(t, prio);
    }
    for (d, prio) in regs.delimiter_processors.drain(..) {
        md.register_delimiter_processor(d, prio);
    }
    for (r, prio) in regs.node_renderers.drain(..) {
        md.register_node_renderer(r, prio);
    }
}
