//! Drives the block/inline state machines with native extensions.

use std::rc::Rc;

use markdown_dynamic_engine::Markdown;
use markdown_dynamic_engine::ast::{AstNode, NodeData, NodeKind, NodeRef, Text, WalkStatus};
use markdown_dynamic_engine::parser::{
    BlockParser, Delimiter, DelimiterProcessor, InlineParser, SharedContext, State,
};
use markdown_dynamic_engine::render::{NodeRenderer, Registerer};
use markdown_dynamic_engine::text::{SharedReader, Span};
use pretty_assertions::assert_eq;
use rstest::rstest;

struct NoteBlock {
    kind: NodeKind,
}

impl NodeData for NoteBlock {
    fn kind(&self) -> NodeKind {
        self.kind
    }
}

/// `:::`-fenced note block, closed by a bare `:::` line.
struct NoteParser {
    kind: NodeKind,
}

impl BlockParser for NoteParser {
    fn triggers(&self) -> &[u8] {
        b":"
    }

    fn open(
        &self,
        _parent: &NodeRef,
        reader: &SharedReader,
        _ctx: &SharedContext,
    ) -> (Option<NodeRef>, State) {
        if !reader.borrow().current_line_text().starts_with(":::") {
            return (None, State::NONE);
        }
        let node = AstNode::new(Box::new(NoteBlock { kind: self.kind }));
        (Some(node), State::CONTINUE | State::NO_CHILDREN)
    }

    fn continue_block(
        &self,
        _node: &NodeRef,
        reader: &SharedReader,
        _ctx: &SharedContext,
    ) -> State {
        if reader.borrow().current_line_text().trim_end() == ":::" {
            State::CLOSE
        } else {
            State::CONTINUE
        }
    }

    fn close(&self, _node: &NodeRef, _reader: &SharedReader, _ctx: &SharedContext) {}
}

struct NoteRenderer {
    kind: NodeKind,
}

impl NodeRenderer for NoteRenderer {
    fn register_funcs(&self, reg: &mut Registerer) {
        reg.register(
            self.kind,
            Box::new(|w, _source, _node, entering| {
                w.write(if entering { "<div class=\"note\">" } else { "</div>\n" });
                WalkStatus::Continue
            }),
        );
    }
}

struct EmNode {
    kind: NodeKind,
}

impl NodeData for EmNode {
    fn kind(&self) -> NodeKind {
        self.kind
    }
}

struct StarProcessor {
    kind: NodeKind,
}

impl DelimiterProcessor for StarProcessor {
    fn is_delimiter(&self, byte: u8) -> bool {
        byte == b'*'
    }

    fn can_open_closer(&self, opener: &Delimiter, closer: &Delimiter) -> bool {
        opener.byte == closer.byte
    }

    fn on_match(&self, _consumes: usize) -> Option<NodeRef> {
        Some(AstNode::new(Box::new(EmNode { kind: self.kind })))
    }
}

struct EmRenderer {
    kind: NodeKind,
}

impl NodeRenderer for EmRenderer {
    fn register_funcs(&self, reg: &mut Registerer) {
        reg.register(
            self.kind,
            Box::new(|w, _source, _node, entering| {
                w.write(if entering { "<em>" } else { "</em>" });
                WalkStatus::Continue
            }),
        );
    }
}

#[test]
fn fenced_note_block_collects_raw_lines() {
    let kind = NodeKind::new("NativeNote");
    let mut builder = Markdown::builder();
    builder.register_block_parser(Rc::new(NoteParser { kind }), 100);
    builder.register_node_renderer(Rc::new(NoteRenderer { kind }), 100);
    let md = builder.build();

    assert_eq!(
        md.convert(":::\nhello\n:::\n"),
        "<div class=\"note\">hello</div>\n"
    );
}

#[rstest]
#[case(":::\na\nb\n:::\ntail\n", "<div class=\"note\">a\nb</div>\n<p>tail</p>\n")]
#[case("before\n\n:::\nx\n:::\n", "<p>before</p>\n<div class=\"note\">x</div>\n")]
#[case(":::\n:::\nafter\n", "<div class=\"note\"></div>\n<p>after</p>\n")]
fn fenced_note_variants(#[case] input: &str, #[case] want: &str) {
    let kind = NodeKind::new("NativeNoteVariant");
    let mut builder = Markdown::builder();
    builder.register_block_parser(Rc::new(NoteParser { kind }), 100);
    builder.register_node_renderer(Rc::new(NoteRenderer { kind }), 100);
    let md = builder.build();

    assert_eq!(md.convert(input), want);
}

#[test]
fn unterminated_block_closes_at_eof() {
    let kind = NodeKind::new("NativeNoteEof");
    let mut builder = Markdown::builder();
    builder.register_block_parser(Rc::new(NoteParser { kind }), 100);
    builder.register_node_renderer(Rc::new(NoteRenderer { kind }), 100);
    let md = builder.build();

    assert_eq!(md.convert(":::\nhello"), "<div class=\"note\">hello</div>\n");
}

#[test]
fn block_not_opened_mid_paragraph_without_interrupt() {
    let kind = NodeKind::new("NativeNoteNoInterrupt");
    let mut builder = Markdown::builder();
    builder.register_block_parser(Rc::new(NoteParser { kind }), 100);
    builder.register_node_renderer(Rc::new(NoteRenderer { kind }), 100);
    let md = builder.build();

    // NoteParser does not claim it can interrupt a paragraph, so the fence
    // line stays paragraph text.
    assert_eq!(md.convert("para\n:::\nx\n:::\n"), "<p>para\n:::\nx\n:::</p>\n");
}

/// Matches its trigger only when a specific letter follows it, emitting
/// that letter as a text node.
struct LetterTag {
    letter: u8,
}

impl InlineParser for LetterTag {
    fn triggers(&self) -> &[u8] {
        b"@"
    }

    fn parse(
        &self,
        _parent: &NodeRef,
        reader: &SharedReader,
        _ctx: &SharedContext,
    ) -> Option<NodeRef> {
        let mut r = reader.borrow_mut();
        let pos = r.pos();
        r.advance(1);
        if r.peek() != Some(self.letter) {
            return None;
        }
        r.advance(1);
        Some(AstNode::new(Box::new(Text {
            span: Span::new(pos + 1, pos + 2),
        })))
    }
}

#[test]
fn every_parser_on_a_shared_trigger_gets_a_chance() {
    let mut builder = Markdown::builder();
    builder.register_inline_parser(Rc::new(LetterTag { letter: b'a' }), 100);
    builder.register_inline_parser(Rc::new(LetterTag { letter: b'b' }), 100);
    let md = builder.build();

    // The first registration declines "@b"; the second still runs.
    assert_eq!(md.convert("x @b y\n"), "<p>x b y</p>\n");
    assert_eq!(md.convert("x @a y\n"), "<p>x a y</p>\n");
    assert_eq!(md.convert("x @c y\n"), "<p>x @c y</p>\n");
}

#[test]
fn delimiter_pair_wraps_enclosed_text() {
    let kind = NodeKind::new("NativeEm");
    let mut builder = Markdown::builder();
    builder.register_delimiter_processor(Rc::new(StarProcessor { kind }), 100);
    builder.register_node_renderer(Rc::new(EmRenderer { kind }), 100);
    let md = builder.build();

    assert_eq!(md.convert("a *b* c\n"), "<p>a <em>b</em> c</p>\n");
}

#[test]
fn unmatched_delimiter_stays_literal() {
    let kind = NodeKind::new("NativeEmLiteral");
    let mut builder = Markdown::builder();
    builder.register_delimiter_processor(Rc::new(StarProcessor { kind }), 100);
    builder.register_node_renderer(Rc::new(EmRenderer { kind }), 100);
    let md = builder.build();

    assert_eq!(md.convert("a *b\n"), "<p>a *b</p>\n");
}
