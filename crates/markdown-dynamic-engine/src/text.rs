//! Byte spans and the positioned source reader fed to parsers.

use std::cell::RefCell;
use std::rc::Rc;

/// A byte range into the document source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Slices this span out of `source`. Out-of-range spans clamp to the end.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        let end = self.end.min(source.len());
        let start = self.start.min(end);
        &source[start..end]
    }
}

/// A reader over the document source shared between the driver and every
/// registered parser during one parse.
///
/// The reader is windowed: block parsing uses the whole source, the inline
/// scanner re-windows a reader to one line of a leaf block. Positions are
/// always absolute byte offsets into the full source, so spans taken from a
/// windowed reader slice the original document.
#[derive(Debug)]
pub struct LineReader {
    source: Rc<str>,
    pos: usize,
    end: usize,
}

/// Single-threaded shared handle; every extension callback for one parse
/// sees the same reader state.
pub type SharedReader = Rc<RefCell<LineReader>>;

impl LineReader {
    pub fn new(source: &str) -> Self {
        let source: Rc<str> = Rc::from(source);
        let end = source.len();
        Self { source, pos: 0, end }
    }

    /// A reader over `span` of the same source, positioned at its start.
    pub fn window(&self, span: Span) -> Self {
        Self {
            source: Rc::clone(&self.source),
            pos: span.start.min(self.source.len()),
            end: span.end.min(self.source.len()),
        }
    }

    pub fn shared(self) -> SharedReader {
        Rc::new(RefCell::new(self))
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos.min(self.end);
    }

    pub fn eof(&self) -> bool {
        self.pos >= self.end
    }

    pub fn peek(&self) -> Option<u8> {
        self.source.as_bytes().get(self.pos).copied().filter(|_| self.pos < self.end)
    }

    /// Span from the current position to the end of the line, newline
    /// excluded.
    pub fn current_line(&self) -> Span {
        let bytes = self.source.as_bytes();
        let mut i = self.pos;
        while i < self.end && bytes[i] != b'\n' {
            i += 1;
        }
        Span::new(self.pos, i)
    }

    pub fn current_line_text(&self) -> &str {
        let span = self.current_line();
        span.text(&self.source)
    }

    pub fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.end);
    }

    /// Moves to the first byte of the next line, skipping the newline.
    pub fn advance_line(&mut self) {
        let line = self.current_line();
        self.pos = (line.end + 1).min(self.end);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn current_line_excludes_newline() {
        let r = LineReader::new("abc\ndef");
        assert_eq!(r.current_line(), Span::new(0, 3));
        assert_eq!(r.current_line_text(), "abc");
    }

    #[test]
    fn advance_line_lands_on_next_line() {
        let mut r = LineReader::new("abc\ndef\n");
        r.advance_line();
        assert_eq!(r.pos(), 4);
        assert_eq!(r.current_line_text(), "def");
        r.advance_line();
        assert!(r.eof());
    }

    #[test]
    fn window_keeps_absolute_positions() {
        let r = LineReader::new("abc\ndef");
        let w = r.window(Span::new(4, 7));
        assert_eq!(w.pos(), 4);
        assert_eq!(w.current_line_text(), "def");
    }

    #[test]
    fn window_peek_stops_at_window_end() {
        let r = LineReader::new("abcdef");
        let mut w = r.window(Span::new(0, 3));
        w.advance(3);
        assert!(w.eof());
        assert_eq!(w.peek(), None);
    }
}
