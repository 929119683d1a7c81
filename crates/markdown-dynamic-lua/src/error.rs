//! The single error channel for everything the bridge detects.
//!
//! Three families of fault exist: construction-time shape errors (a
//! callback table field missing or of the wrong type), script execution
//! faults (a Lua error raised inside a callback) and return-shape errors
//! (a callback returned the wrong kind or number of values). All three
//! reach the configured [`ErrorSink`]; none of them aborts the pipeline by
//! construction. Whether a report is fatal is the embedder's choice — the
//! default sink panics.

use std::rc::Rc;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    /// A callback-table field had the wrong type (or was missing where a
    /// value was required).
    #[error("{owner}.{field}: must be a {expected}")]
    Shape {
        owner: &'static str,
        field: String,
        expected: String,
    },

    /// A callback returned value(s) of the wrong shape.
    #[error("{owner}.{callback} returned an invalid value: must be a {expected}")]
    InvalidReturn {
        owner: &'static str,
        callback: &'static str,
        expected: &'static str,
    },

    /// A Lua error escaped a callback; caught at the protected-call
    /// boundary.
    #[error("script error: {0}")]
    Script(#[from] mlua::Error),

    /// A block parser with no trigger bytes can never fire.
    #[error("cannot define a block parser without triggers")]
    MissingTriggers,

    /// An extension chunk did not evaluate to a single function.
    #[error("extension {path} must evaluate to a function, got a {got}")]
    BadEntryPoint { path: String, got: String },

    /// An extension script could not be read.
    #[error("failed to load script {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Where every bridge-detected fault goes. Installed once per
/// [`crate::Dynamic`]; adapters hold a clone for their lifetime.
pub type ErrorSink = Rc<dyn Fn(BridgeError)>;

/// The default policy: any script fault takes the process down.
pub fn abort_sink() -> ErrorSink {
    Rc::new(|err| panic!("markdown-dynamic: {err}"))
}
