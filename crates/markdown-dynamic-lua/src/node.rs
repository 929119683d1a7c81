//! Script-defined node payloads.
//!
//! A script describes a node with a plain table (`kind`, optional `isRaw`
//! and `props`); the payload holds the table's pieces and answers the
//! tree's introspection queries by calling back into them. When no `isRaw`
//! function was supplied the query never enters Lua at all.

use markdown_dynamic_engine::ast::{NodeData, NodeKind};
use mlua::{Table, Value};

use crate::call::protected;
use crate::error::{BridgeError, ErrorSink};
use crate::marshal;
use crate::props::PropTable;

/// Payload for a node constructed by `markdown.ast.newBlockNode` or
/// `newInlineNode`. Both roles carry the same state; only the owner name
/// in error reports differs.
pub struct DynamicNodeData {
    owner: &'static str,
    kind: NodeKind,
    is_raw: Option<mlua::Function>,
    props: Option<Table>,
    sink: ErrorSink,
}

impl DynamicNodeData {
    pub fn block(table: Table, sink: ErrorSink) -> Self {
        Self::from_table("BlockNode", table, sink)
    }

    pub fn inline(table: Table, sink: ErrorSink) -> Self {
        Self::from_table("InlineNode", table, sink)
    }

    fn from_table(owner: &'static str, table: Table, sink: ErrorSink) -> Self {
        let pt = PropTable::new(owner, table, sink.clone());
        Self {
            owner,
            kind: NodeKind::from_raw(u32::try_from(pt.int("kind")).unwrap_or(0)),
            is_raw: pt.optional_function("isRaw"),
            props: pt.optional_table("props"),
            sink,
        }
    }
}

impl NodeData for DynamicNodeData {
    fn kind(&self) -> NodeKind {
        self.kind
    }

    fn is_raw(&self) -> bool {
        let Some(is_raw) = &self.is_raw else {
            return false;
        };
        match protected::<Value>(&self.sink, is_raw, ()) {
            Some(Value::Boolean(b)) => b,
            Some(_) => {
                (self.sink)(BridgeError::InvalidReturn {
                    owner: self.owner,
                    callback: "isRaw",
                    expected: "boolean",
                });
                false
            }
            None => false,
        }
    }

    fn prop(&self, name: &str) -> Option<String> {
        let props = self.props.as_ref()?;
        match props.raw_get::<Value>(name) {
            Ok(Value::Nil) | Err(_) => None,
            Ok(value) => Some(marshal::display(&value)),
        }
    }

    fn dump_props(&self) -> Vec<(String, String)> {
        let Some(props) = &self.props else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for pair in props.clone().pairs::<Value, Value>() {
            let Ok((key, value)) = pair else { continue };
            out.push((marshal::display(&key), marshal::display(&value)));
        }
        out
    }
}
