//! The inline phase: trigger-driven inline parsers, delimiter runs and
//! plain-text fallback.
//!
//! Runs after the block phase over every leaf that carries raw lines and
//! whose payload does not claim raw content. Text between recognized
//! constructs is flushed as `Text` spans; the newline between two lines of
//! one leaf becomes its own one-byte `Text` node so rendering stays a pure
//! source slice.

use std::rc::Rc;

use crate::ast::{self, AstNode, NodeRef, Text, WalkStatus};
use crate::text::{SharedReader, Span};

use super::driver::{Parser, index_of_child};
use super::{Delimiter, DelimiterProcessor, SharedContext};

pub(crate) fn parse_inlines(p: &Parser, doc: &NodeRef, reader: &SharedReader, ctx: &SharedContext) {
    let mut leaves = Vec::new();
    ast::walk(doc, &mut |node, entering| {
        if entering && !node.lines().is_empty() && !node.is_raw() {
            leaves.push(node.clone());
        }
        WalkStatus::Continue
    });
    for leaf in leaves {
        scan_leaf(p, &leaf, reader, ctx);
    }
}

/// One pending delimiter run inside the leaf being scanned.
struct DelimRun {
    processor: usize,
    byte: u8,
    length: usize,
    can_open: bool,
    can_close: bool,
    node: NodeRef,
    active: bool,
}

impl DelimRun {
    fn as_delimiter(&self) -> Delimiter {
        Delimiter {
            byte: self.byte,
            length: self.length,
            can_open: self.can_open,
            can_close: self.can_close,
        }
    }
}

fn scan_leaf(p: &Parser, leaf: &NodeRef, reader: &SharedReader, ctx: &SharedContext) {
    let lines = leaf.lines();
    let mut runs: Vec<DelimRun> = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            // The byte right after the previous line is its newline.
            let nl = lines[i - 1].end;
            leaf.append_child(AstNode::new(Box::new(Text {
                span: Span::new(nl, nl + 1),
            })));
        }

        let sub: SharedReader = reader.borrow().window(*line).shared();
        let mut text_start = line.start;

        loop {
            let (pos, byte) = {
                let r = sub.borrow();
                (r.pos(), r.peek())
            };
            let Some(b) = byte else {
                break;
            };

            let mut matched = false;
            for ip in p.inline_parsers.iter().filter(|ip| ip.triggers().contains(&b)) {
                if let Some(node) = ip.parse(leaf, &sub, ctx) {
                    flush_text(leaf, text_start, pos);
                    leaf.append_child(node);
                    let mut r = sub.borrow_mut();
                    if r.pos() <= pos {
                        r.set_pos(pos + 1); // a parser must make progress
                    }
                    text_start = r.pos();
                    matched = true;
                    break;
                }
                // No match: the next parser on this byte sees the same spot.
                sub.borrow_mut().set_pos(pos);
            }
            if matched {
                continue;
            }

            if let Some((pi, _)) = p
                .delimiter_processors
                .iter()
                .enumerate()
                .find(|(_, d)| d.is_delimiter(b))
            {
                let run = scan_run(sub.borrow().source(), *line, pos, b);
                flush_text(leaf, text_start, pos);
                let node = AstNode::new(Box::new(Text {
                    span: Span::new(pos, pos + run.length),
                }));
                leaf.append_child(node.clone());
                runs.push(DelimRun {
                    processor: pi,
                    byte: b,
                    length: run.length,
                    can_open: run.can_open,
                    can_close: run.can_close,
                    node,
                    active: true,
                });
                sub.borrow_mut().set_pos(pos + run.length);
                text_start = pos + run.length;
                continue;
            }

            sub.borrow_mut().advance(1);
        }
        flush_text(leaf, text_start, line.end);
    }

    process_delimiters(p, leaf, &mut runs);

    for ip in &p.inline_parsers {
        ip.close_block(leaf, reader, ctx);
    }
}

fn flush_text(leaf: &NodeRef, start: usize, end: usize) {
    if end > start {
        leaf.append_child(AstNode::new(Box::new(Text {
            span: Span::new(start, end),
        })));
    }
}

fn scan_run(source: &str, line: Span, pos: usize, byte: u8) -> Delimiter {
    let bytes = source.as_bytes();
    let mut end = pos;
    while end < line.end && bytes[end] == byte {
        end += 1;
    }
    let prev = (pos > line.start).then(|| bytes[pos - 1]);
    let next = (end < line.end).then(|| bytes[end]);
    Delimiter {
        byte,
        length: end - pos,
        can_open: next.is_some_and(|b| !b.is_ascii_whitespace()),
        can_close: prev.is_some_and(|b| !b.is_ascii_whitespace()),
    }
}

/// Matches closers to the nearest eligible opener, left to right, wrapping
/// the children in between with the node produced by `on_match`.
fn process_delimiters(p: &Parser, leaf: &NodeRef, runs: &mut [DelimRun]) {
    for ci in 0..runs.len() {
        if !runs[ci].active || !runs[ci].can_close {
            continue;
        }
        let closer = runs[ci].as_delimiter();
        let processor: &Rc<dyn DelimiterProcessor> = &p.delimiter_processors[runs[ci].processor];

        let Some(oi) = (0..ci).rev().find(|&oi| {
            runs[oi].active
                && runs[oi].can_open
                && runs[oi].processor == runs[ci].processor
                && processor.can_open_closer(&runs[oi].as_delimiter(), &closer)
        }) else {
            continue;
        };

        let consumes = runs[oi].length.min(runs[ci].length);
        let Some(wrapper) = processor.on_match(consumes) else {
            continue; // stays literal text
        };

        let (Some(open_idx), Some(close_idx)) = (
            index_of_child(leaf, &runs[oi].node),
            index_of_child(leaf, &runs[ci].node),
        ) else {
            continue;
        };
        if close_idx <= open_idx {
            continue;
        }

        // Move everything between the pair into the wrapper.
        for _ in open_idx + 1..close_idx {
            if let Some(child) = leaf.remove_child(open_idx + 1) {
                wrapper.append_child(child);
            }
        }
        leaf.insert_child(open_idx + 1, wrapper);

        consume_run(leaf, &mut runs[oi], consumes, true);
        consume_run(leaf, &mut runs[ci], consumes, false);
    }
}

/// Takes `consumes` delimiter bytes off one side of a run, replacing its
/// text node with a shrunk span or dropping it entirely.
fn consume_run(leaf: &NodeRef, run: &mut DelimRun, consumes: usize, from_end: bool) {
    let Some(idx) = index_of_child(leaf, &run.node) else {
        run.active = false;
        return;
    };
    let old = match run.node.data().span() {
        Some(span) => span,
        None => {
            run.active = false;
            return;
        }
    };
    leaf.remove_child(idx);
    run.length = run.length.saturating_sub(consumes);
    if run.length == 0 {
        run.active = false;
        return;
    }
    let span = if from_end {
        Span::new(old.start, old.end - consumes)
    } else {
        Span::new(old.start + consumes, old.end)
    };
    let node = AstNode::new(Box::new(Text { span }));
    leaf.insert_child(idx, node.clone());
    run.node = node;
}
