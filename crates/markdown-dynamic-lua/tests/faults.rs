//! Fault handling: every script misbehavior reaches the sink once and the
//! pipeline degrades to the documented default instead of wedging.

use std::cell::RefCell;
use std::rc::Rc;

use markdown_dynamic_engine::Markdown;
use markdown_dynamic_lua::{DirFs, Dynamic, Extension};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn write_script(dir: &TempDir, name: &str, body: &str) {
    std::fs::write(dir.path().join(name), body).unwrap();
}

fn build(dir: &TempDir, extensions: Vec<Extension>) -> (Markdown, Rc<RefCell<Vec<String>>>) {
    let errors = Rc::new(RefCell::new(Vec::new()));
    let collected = errors.clone();
    let dynamic = Dynamic::new()
        .with_fs(DirFs::new(dir.path()))
        .with_extensions(extensions)
        .with_on_error(move |err| collected.borrow_mut().push(err.to_string()));
    let md = Markdown::builder().extension(&dynamic).build();
    (md, errors)
}

#[test]
fn missing_required_field_reports_once_and_defaults() {
    let dir = TempDir::new().unwrap();
    write_script(
        &dir,
        "broken.lua",
        r#"
local parser = require("markdown.parser")
return function(pipeline)
  pipeline:registerInlineParser(parser.newInlineParser({ triggers = "@" }))
end
"#,
    );
    let (md, errors) = build(&dir, vec![Extension::new("broken.lua")]);

    assert_eq!(
        errors.borrow().as_slice(),
        ["InlineParser.parse: must be a function"]
    );
    // The parser exists but its parse defaults to "no match".
    assert_eq!(md.convert("hi @x\n"), "<p>hi @x</p>\n");
    assert_eq!(errors.borrow().len(), 1);
}

#[test]
fn absent_optional_fields_are_not_errors() {
    let dir = TempDir::new().unwrap();
    write_script(
        &dir,
        "minimal.lua",
        r#"
local ast = require("markdown.ast")
local parser = require("markdown.parser")
return function(pipeline)
  pipeline:registerInlineParser(parser.newInlineParser({
    triggers = "@",
    -- no closeBlock
    parse = function(self, parent, reader, ctx)
      reader:advance(1)
      -- no isRaw, no props
      return ast.newInlineNode({ kind = ast.newNodeKind("Minimal") })
    end,
  }))
end
"#,
    );
    let (md, errors) = build(&dir, vec![Extension::new("minimal.lua")]);

    md.convert("@\n");
    assert_eq!(errors.borrow().len(), 0);
}

#[test]
fn block_parser_without_triggers_reports() {
    let dir = TempDir::new().unwrap();
    write_script(
        &dir,
        "notrigger.lua",
        r#"
local parser = require("markdown.parser")
return function(pipeline)
  pipeline:registerBlockParser(parser.newBlockParser({
    open = function(self) return nil, parser.none end,
    continue = function(self) return parser.close end,
    close = function(self) end,
  }))
end
"#,
    );
    let (md, errors) = build(&dir, vec![Extension::new("notrigger.lua")]);

    assert_eq!(
        errors.borrow().as_slice(),
        ["cannot define a block parser without triggers"]
    );
    assert_eq!(md.convert("x\n"), "<p>x</p>\n");
}

#[test]
fn mistyped_inline_triggers_report_once() {
    let dir = TempDir::new().unwrap();
    write_script(
        &dir,
        "numtrig.lua",
        r#"
local parser = require("markdown.parser")
return function(pipeline)
  pipeline:registerInlineParser(parser.newInlineParser({
    triggers = 5,
    parse = function(self) return nil end,
  }))
end
"#,
    );
    let (md, errors) = build(&dir, vec![Extension::new("numtrig.lua")]);

    assert_eq!(
        errors.borrow().as_slice(),
        ["InlineParser.triggers: must be a string or nil"]
    );
    assert_eq!(md.convert("hi\n"), "<p>hi</p>\n");
}

#[test]
fn mistyped_block_triggers_report_once() {
    let dir = TempDir::new().unwrap();
    write_script(
        &dir,
        "blocknumtrig.lua",
        r#"
local parser = require("markdown.parser")
return function(pipeline)
  pipeline:registerBlockParser(parser.newBlockParser({
    triggers = 5,
    open = function(self) return nil, parser.none end,
    continue = function(self) return parser.close end,
    close = function(self) end,
  }))
end
"#,
    );
    let (md, errors) = build(&dir, vec![Extension::new("blocknumtrig.lua")]);

    assert_eq!(
        errors.borrow().as_slice(),
        ["BlockParser.triggers: must be a string or nil"]
    );
    assert_eq!(md.convert("x\n"), "<p>x</p>\n");
}

#[test]
fn open_with_non_numeric_state_reports_once_and_does_not_open() {
    let dir = TempDir::new().unwrap();
    write_script(
        &dir,
        "badstate.lua",
        r#"
local ast = require("markdown.ast")
local parser = require("markdown.parser")
return function(pipeline)
  pipeline:registerBlockParser(parser.newBlockParser({
    triggers = ":",
    open = function(self, parent, reader, ctx)
      return ast.newBlockNode({ kind = ast.newNodeKind("BadState") }), "wat"
    end,
    continue = function(self) return parser.close end,
    close = function(self) end,
  }))
end
"#,
    );
    let (md, errors) = build(&dir, vec![Extension::new("badstate.lua")]);

    assert_eq!(md.convert(":::\n"), "<p>:::</p>\n");
    assert_eq!(
        errors.borrow().as_slice(),
        ["BlockParser.open returned an invalid value: must be a number"]
    );
}

#[test]
fn faulting_parse_reads_as_no_match() {
    let dir = TempDir::new().unwrap();
    write_script(
        &dir,
        "boom.lua",
        r#"
local parser = require("markdown.parser")
return function(pipeline)
  pipeline:registerInlineParser(parser.newInlineParser({
    triggers = "@",
    parse = function(self, parent, reader, ctx)
      error("kaboom")
    end,
  }))
end
"#,
    );
    let (md, errors) = build(&dir, vec![Extension::new("boom.lua")]);

    assert_eq!(md.convert("hi @abc\n"), "<p>hi @abc</p>\n");
    let errors = errors.borrow();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("kaboom"), "got: {}", errors[0]);
}

#[test]
fn faulting_is_raw_reads_as_false() {
    let dir = TempDir::new().unwrap();
    write_script(
        &dir,
        "rawboom.lua",
        r#"
local ast = require("markdown.ast")
local parser = require("markdown.parser")
local renderer = require("markdown.renderer")
local util = require("markdown.util")

local kind = ast.newNodeKind("RawBoom")

return function(pipeline)
  pipeline:registerBlockParser(parser.newBlockParser({
    triggers = ":",
    open = function(self, parent, reader, ctx)
      if not util.hasPrefix(reader:currentLine(), ":::") then
        return nil, parser.none
      end
      local node = ast.newBlockNode({
        kind = kind,
        isRaw = function() error("raw boom") end,
      })
      return node, parser.continue + parser.noChildren
    end,
    continue = function(self, node, reader, ctx)
      if util.hasPrefix(reader:currentLine(), ":::") then
        return parser.close
      end
      return parser.continue + parser.noChildren
    end,
    close = function(self) end,
  }))
  pipeline:registerNodeRenderer(renderer.newRenderer({
    registerFuncs = function(self, reg)
      reg:register(kind, function(writer, source, node, entering)
        if entering then writer:write(tostring(node:childCount())) end
      end)
    end,
  }))
end
"#,
    );
    let (md, errors) = build(&dir, vec![Extension::new("rawboom.lua")]);

    // isRaw faulted, so the block was inline-parsed and got a Text child.
    assert_eq!(md.convert(":::\nhello\n:::\n"), "1hello");
    let errors = errors.borrow();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("raw boom"), "got: {}", errors[0]);
}

#[test]
fn absent_is_raw_reads_as_false_without_reports() {
    let dir = TempDir::new().unwrap();
    write_script(
        &dir,
        "plain.lua",
        r#"
local ast = require("markdown.ast")
local parser = require("markdown.parser")
local renderer = require("markdown.renderer")
local util = require("markdown.util")

local kind = ast.newNodeKind("PlainBlock")

return function(pipeline)
  pipeline:registerBlockParser(parser.newBlockParser({
    triggers = ":",
    open = function(self, parent, reader, ctx)
      if not util.hasPrefix(reader:currentLine(), ":::") then
        return nil, parser.none
      end
      -- no isRaw field at all
      return ast.newBlockNode({ kind = kind }), parser.continue + parser.noChildren
    end,
    continue = function(self, node, reader, ctx)
      if util.hasPrefix(reader:currentLine(), ":::") then
        return parser.close
      end
      return parser.continue + parser.noChildren
    end,
    close = function(self) end,
  }))
  pipeline:registerNodeRenderer(renderer.newRenderer({
    registerFuncs = function(self, reg)
      reg:register(kind, function(writer, source, node, entering)
        if entering then writer:write(tostring(node:childCount())) end
      end)
    end,
  }))
end
"#,
    );
    let (md, errors) = build(&dir, vec![Extension::new("plain.lua")]);

    // Non-raw by default: the single line was inline-parsed into a child.
    assert_eq!(md.convert(":::\nhello\n:::\n"), "1hello");
    assert_eq!(errors.borrow().len(), 0);
}

#[test]
fn is_raw_returning_non_boolean_reports_and_reads_false() {
    let dir = TempDir::new().unwrap();
    write_script(
        &dir,
        "rawnum.lua",
        r#"
local ast = require("markdown.ast")
local parser = require("markdown.parser")
local util = require("markdown.util")

return function(pipeline)
  pipeline:registerBlockParser(parser.newBlockParser({
    triggers = ":",
    open = function(self, parent, reader, ctx)
      if not util.hasPrefix(reader:currentLine(), ":::") then
        return nil, parser.none
      end
      local node = ast.newBlockNode({
        kind = ast.newNodeKind("RawNum"),
        isRaw = function() return 1 end,
      })
      return node, parser.continue + parser.noChildren
    end,
    continue = function(self, node, reader, ctx)
      if util.hasPrefix(reader:currentLine(), ":::") then
        return parser.close
      end
      return parser.continue + parser.noChildren
    end,
    close = function(self) end,
  }))
end
"#,
    );
    let (md, errors) = build(&dir, vec![Extension::new("rawnum.lua")]);

    md.convert(":::\nhello\n:::\n");
    assert_eq!(
        errors.borrow().as_slice(),
        ["BlockNode.isRaw returned an invalid value: must be a boolean"]
    );
}

#[test]
fn non_function_chunk_is_reported_and_skipped() {
    let dir = TempDir::new().unwrap();
    write_script(&dir, "bad.lua", "return 42\n");
    write_script(
        &dir,
        "good.lua",
        r#"
local ast = require("markdown.ast")
local parser = require("markdown.parser")
local renderer = require("markdown.renderer")
local kind = ast.newNodeKind("Good")
return function(pipeline)
  pipeline:registerInlineParser(parser.newInlineParser({
    triggers = "@",
    parse = function(self, parent, reader, ctx)
      reader:advance(1)
      return ast.newInlineNode({ kind = kind })
    end,
  }))
  pipeline:registerNodeRenderer(renderer.newRenderer({
    registerFuncs = function(self, reg)
      reg:register(kind, function(writer, source, node, entering)
        if entering then writer:write("ok") end
      end)
    end,
  }))
end
"#,
    );
    let (md, errors) = build(
        &dir,
        vec![Extension::new("bad.lua"), Extension::new("good.lua")],
    );

    assert_eq!(
        errors.borrow().as_slice(),
        ["extension bad.lua must evaluate to a function, got a number"]
    );
    // The second extension still loaded.
    assert_eq!(md.convert("@\n"), "<p>ok</p>\n");
}

#[test]
fn unreadable_script_is_reported_and_skipped() {
    let dir = TempDir::new().unwrap();
    let (md, errors) = build(&dir, vec![Extension::new("missing.lua")]);

    let errors = errors.borrow();
    assert_eq!(errors.len(), 1);
    assert!(
        errors[0].starts_with("failed to load script missing.lua"),
        "got: {}",
        errors[0]
    );
    assert_eq!(md.convert("hi\n"), "<p>hi</p>\n");
}

#[test]
fn syntax_error_is_reported_and_skipped() {
    let dir = TempDir::new().unwrap();
    write_script(&dir, "syntax.lua", "return function(\n");
    let (md, errors) = build(&dir, vec![Extension::new("syntax.lua")]);

    let errors = errors.borrow();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("script error:"), "got: {}", errors[0]);
    assert_eq!(md.convert("hi\n"), "<p>hi</p>\n");
}

#[test]
fn registering_an_adapter_in_the_wrong_slot_faults_the_script() {
    let dir = TempDir::new().unwrap();
    write_script(
        &dir,
        "mixed.lua",
        r#"
local parser = require("markdown.parser")
return function(pipeline)
  local inline = parser.newInlineParser({
    triggers = "@",
    parse = function(self) return nil end,
  })
  pipeline:registerBlockParser(inline)
end
"#,
    );
    let (md, errors) = build(&dir, vec![Extension::new("mixed.lua")]);

    let errors = errors.borrow();
    assert_eq!(errors.len(), 1);
    assert!(
        errors[0].contains("registerBlockParser expects a block parser"),
        "got: {}",
        errors[0]
    );
    assert_eq!(md.convert("hi\n"), "<p>hi</p>\n");
}
