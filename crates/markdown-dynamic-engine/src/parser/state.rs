//! Block-parser state codes.

/// Outcome of a block parser's `open`/`continue` step.
///
/// One code carries two independent concerns: a control outcome
/// ([`State::NONE`], [`State::CLOSE`], [`State::CONTINUE`] — mutually
/// exclusive) and structural flags ([`State::HAS_CHILDREN`],
/// [`State::NO_CHILDREN`], [`State::REQUIRE_PARAGRAPH`]) that combine with
/// `CONTINUE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct State(u8);

impl State {
    pub const NONE: State = State(0);
    pub const CONTINUE: State = State(1);
    pub const CLOSE: State = State(2);
    pub const HAS_CHILDREN: State = State(4);
    pub const NO_CHILDREN: State = State(8);
    pub const REQUIRE_PARAGRAPH: State = State(16);

    const MASK: u8 = 31;

    /// Reconstructs a state from a numeric code that crossed a script
    /// boundary. Unknown bits are dropped.
    pub fn from_raw(raw: i64) -> State {
        if raw < 0 {
            return State::NONE;
        }
        State((raw as u8) & Self::MASK)
    }

    pub fn raw(self) -> u8 {
        self.0
    }

    pub fn contains(self, other: State) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    pub fn is_close(self) -> bool {
        self.contains(State::CLOSE)
    }

    pub fn is_continue(self) -> bool {
        self.contains(State::CONTINUE)
    }

    pub fn is_none(self) -> bool {
        self.0 & (State::CONTINUE.0 | State::CLOSE.0) == 0
    }
}

impl std::ops::BitOr for State {
    type Output = State;

    fn bitor(self, rhs: State) -> State {
        State(self.0 | rhs.0)
    }
}
