//! Shape validation for script-supplied callback tables.
//!
//! Adapters resolve every field they will ever need through a [`PropTable`]
//! at construction time, so all shape errors surface before the pipeline
//! starts running. An absent field reads as nil; whether nil is acceptable
//! is part of the allowed-kind set each caller passes.

use mlua::{Table, Value};

use crate::error::{BridgeError, ErrorSink};

/// Lua value categories a field may be checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Nil,
    Boolean,
    Number,
    String,
    Table,
    Function,
}

impl ValueKind {
    fn matches(self, value: &Value) -> bool {
        match self {
            ValueKind::Nil => matches!(value, Value::Nil),
            ValueKind::Boolean => matches!(value, Value::Boolean(_)),
            ValueKind::Number => matches!(value, Value::Integer(_) | Value::Number(_)),
            ValueKind::String => matches!(value, Value::String(_)),
            ValueKind::Table => matches!(value, Value::Table(_)),
            ValueKind::Function => matches!(value, Value::Function(_)),
        }
    }

    fn name(self) -> &'static str {
        match self {
            ValueKind::Nil => "nil",
            ValueKind::Boolean => "boolean",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Table => "table",
            ValueKind::Function => "function",
        }
    }
}

fn expected_names(kinds: &[ValueKind]) -> String {
    kinds
        .iter()
        .map(|k| k.name())
        .collect::<Vec<_>>()
        .join(" or ")
}

/// A validated view of one script callback table. `owner` names the
/// table's role ("BlockParser", "InlineNode", ...) in error messages.
pub struct PropTable {
    owner: &'static str,
    table: Table,
    sink: ErrorSink,
}

impl PropTable {
    pub fn new(owner: &'static str, table: Table, sink: ErrorSink) -> Self {
        Self { owner, table, sink }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Reads `key`, reporting (and yielding nil) when its value category
    /// is not among `kinds`. Absence reads as the nil category.
    pub fn get(&self, key: &str, kinds: &[ValueKind]) -> Value {
        let value = self.table.raw_get::<Value>(key).unwrap_or(Value::Nil);
        if kinds.iter().any(|k| k.matches(&value)) {
            return value;
        }
        (self.sink)(BridgeError::Shape {
            owner: self.owner,
            field: key.to_string(),
            expected: expected_names(kinds),
        });
        Value::Nil
    }

    /// A required function field. Absence or a wrong type reports once and
    /// yields `None`; the adapter's operation then uses its documented
    /// default.
    pub fn function(&self, key: &str) -> Option<mlua::Function> {
        match self.get(key, &[ValueKind::Function]) {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    /// An optional function field. Absence is not an error.
    pub fn optional_function(&self, key: &str) -> Option<mlua::Function> {
        match self.get(key, &[ValueKind::Function, ValueKind::Nil]) {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    /// An optional table field. Absence is not an error.
    pub fn optional_table(&self, key: &str) -> Option<Table> {
        match self.get(key, &[ValueKind::Table, ValueKind::Nil]) {
            Value::Table(t) => Some(t),
            _ => None,
        }
    }

    /// Boolean with false-if-absent semantics: Lua truthiness, no report.
    pub fn bool_of(&self, key: &str) -> bool {
        let value = self.table.raw_get::<Value>(key).unwrap_or(Value::Nil);
        !matches!(value, Value::Nil | Value::Boolean(false))
    }

    /// Byte sequence with empty-if-absent semantics. A non-string,
    /// non-nil value reports and yields `None`, so callers can tell a
    /// shape fault (already reported) from genuine absence.
    pub fn bytes(&self, key: &str) -> Option<Vec<u8>> {
        match self.table.raw_get::<Value>(key).unwrap_or(Value::Nil) {
            Value::String(s) => Some(s.as_bytes().to_vec()),
            Value::Nil => Some(Vec::new()),
            _ => {
                (self.sink)(BridgeError::Shape {
                    owner: self.owner,
                    field: key.to_string(),
                    expected: expected_names(&[ValueKind::String, ValueKind::Nil]),
                });
                None
            }
        }
    }

    /// A required integer field; absence or a non-number reports and
    /// yields 0.
    pub fn int(&self, key: &str) -> i64 {
        match self.get(key, &[ValueKind::Number]) {
            Value::Integer(n) => n,
            Value::Number(n) => n as i64,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BridgeError;
    use mlua::Lua;
    use rstest::rstest;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn collecting_sink() -> (ErrorSink, Rc<RefCell<Vec<String>>>) {
        let errors = Rc::new(RefCell::new(Vec::new()));
        let collected = errors.clone();
        let sink: ErrorSink =
            Rc::new(move |e: BridgeError| collected.borrow_mut().push(e.to_string()));
        (sink, errors)
    }

    fn table(lua: &Lua, body: &str) -> Table {
        lua.load(format!("return {{ {body} }}")).eval().unwrap()
    }

    #[rstest]
    #[case("")]
    #[case("x = 1")]
    #[case("x = \"s\"")]
    fn missing_or_mistyped_function_reports_once(#[case] body: &str) {
        let lua = Lua::new();
        let (sink, errors) = collecting_sink();
        let pt = PropTable::new("InlineParser", table(&lua, body), sink);

        assert!(pt.function("x").is_none());
        assert_eq!(
            errors.borrow().as_slice(),
            ["InlineParser.x: must be a function"]
        );
    }

    #[test]
    fn optional_function_accepts_absence() {
        let lua = Lua::new();
        let (sink, errors) = collecting_sink();
        let pt = PropTable::new("InlineParser", table(&lua, ""), sink);

        assert!(pt.optional_function("closeBlock").is_none());
        assert!(errors.borrow().is_empty());
    }

    #[test]
    fn flags_use_lua_truthiness() {
        let lua = Lua::new();
        let (sink, errors) = collecting_sink();
        let pt = PropTable::new("BlockParser", table(&lua, "a = true, b = false, c = 1"), sink);

        assert!(pt.bool_of("a"));
        assert!(!pt.bool_of("b"));
        assert!(pt.bool_of("c"));
        assert!(!pt.bool_of("missing"));
        assert!(errors.borrow().is_empty());
    }

    #[test]
    fn bytes_default_to_empty_and_report_wrong_types() {
        let lua = Lua::new();
        let (sink, errors) = collecting_sink();
        let pt = PropTable::new("BlockParser", table(&lua, "triggers = 5"), sink);

        assert_eq!(pt.bytes("absent"), Some(Vec::new()));
        assert_eq!(pt.bytes("triggers"), None);
        assert_eq!(
            errors.borrow().as_slice(),
            ["BlockParser.triggers: must be a string or nil"]
        );
    }
}
