//! Lua scripting for the markdown-dynamic pipeline.
//!
//! [`Dynamic`] is a pipeline [`Extender`](markdown_dynamic_engine::Extender)
//! that runs Lua scripts at build time. Each script evaluates to an entry
//! function `function(pipeline, options)` and registers parsers,
//! transformers, delimiter processors and renderers through the pipeline
//! handle; from then on the engine drives the script callbacks like any
//! native extension.
//!
//! ```lua
//! local parser = require("markdown.parser")
//!
//! return function(pipeline, options)
//!   pipeline:registerInlineParser(parser.newInlineParser({
//!     triggers = "@",
//!     parse = function(self, parent, reader, ctx)
//!       -- ...
//!     end,
//!   }), 500)
//! end
//! ```
//!
//! Every fault a script can cause — wrong-shaped callback tables, Lua
//! errors at run time, wrong-shaped return values — is routed to a single
//! [`ErrorSink`]. The default sink panics; embedders that want degraded
//! output instead install their own with [`Dynamic::with_on_error`].

pub mod adapters;
mod call;
mod error;
mod handles;
mod loader;
mod marshal;
mod modules;
mod node;
mod props;
mod registry;

pub use error::{abort_sink, BridgeError, ErrorSink};
pub use loader::{DirFs, Dynamic, Extension, ScriptFs};
pub use marshal::toml_to_lua;
pub use node::DynamicNodeData;
pub use props::{PropTable, ValueKind};
pub use registry::{Registration, Registrations};
