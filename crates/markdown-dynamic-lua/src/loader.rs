//! Loading extension scripts and attaching them to a pipeline.

use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;

use markdown_dynamic_engine::{Extender, MarkdownBuilder};
use mlua::{Function, Lua, Table, Value};

use crate::call::protected;
use crate::error::{abort_sink, BridgeError, ErrorSink};
use crate::handles::{apply_registrations, LuaPipeline};
use crate::marshal;
use crate::modules;
use crate::registry::Registrations;

/// One extension to load: a script path (resolved through the script
/// filesystem) plus the options value handed to its entry function.
#[derive(Debug, Clone)]
pub struct Extension {
    pub file: String,
    pub options: toml::Value,
}

impl Extension {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            options: toml::Value::Table(toml::map::Map::new()),
        }
    }

    pub fn with_options(mut self, options: toml::Value) -> Self {
        self.options = options;
        self
    }
}

/// Where extension scripts and their `require`d modules come from.
pub trait ScriptFs {
    fn exists(&self, path: &str) -> bool;
    fn read(&self, path: &str) -> io::Result<String>;
}

/// Scripts under one directory on the real filesystem.
pub struct DirFs {
    root: PathBuf,
}

impl DirFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ScriptFs for DirFs {
    fn exists(&self, path: &str) -> bool {
        self.root.join(path).is_file()
    }

    fn read(&self, path: &str) -> io::Result<String> {
        fs::read_to_string(self.root.join(path))
    }
}

/// The Lua extension host.
///
/// Attaching it to a [`MarkdownBuilder`] creates one fresh Lua state,
/// preloads the `markdown.*` modules, runs every configured script in
/// order and registers whatever the scripts registered. A script that
/// fails to load or misbehaves at attach time is reported and skipped; the
/// remaining scripts still load.
pub struct Dynamic {
    fs: Rc<dyn ScriptFs>,
    extensions: Vec<Extension>,
    sink: ErrorSink,
}

impl Dynamic {
    pub fn new() -> Self {
        Self {
            fs: Rc::new(DirFs::new(".")),
            extensions: Vec::new(),
            sink: abort_sink(),
        }
    }

    pub fn with_fs(mut self, fs: impl ScriptFs + 'static) -> Self {
        self.fs = Rc::new(fs);
        self
    }

    pub fn with_extensions(mut self, extensions: Vec<Extension>) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn with_extension(mut self, extension: Extension) -> Self {
        self.extensions.push(extension);
        self
    }

    /// Replaces the abort-on-error default with a custom fault handler.
    pub fn with_on_error(mut self, on_error: impl Fn(BridgeError) + 'static) -> Self {
        self.sink = Rc::new(on_error);
        self
    }

    /// Resolves `require` through the script filesystem instead of the
    /// process's real working directory.
    fn install_searcher(&self, lua: &Lua) -> mlua::Result<()> {
        let package: Table = lua.globals().get("package")?;
        package.set("path", "?.lua;?/init.lua")?;
        let searchers: Table = package.get("searchers")?;
        let fs = Rc::clone(&self.fs);
        let searcher = lua.create_function(move |lua, name: String| {
            let rel = name.replace('.', "/");
            let package: Table = lua.globals().get("package")?;
            let patterns: String = package.get("path")?;
            let mut tried = Vec::new();
            for pattern in patterns.split(';') {
                let candidate = pattern.replace('?', &rel);
                if fs.exists(&candidate) {
                    let src = fs
                        .read(&candidate)
                        .map_err(|e| mlua::Error::RuntimeError(e.to_string()))?;
                    let f = lua
                        .load(skip_shebang(&src))
                        .set_name(candidate.clone())
                        .into_function()?;
                    return Ok(Value::Function(f));
                }
                tried.push(format!("no file '{candidate}'"));
            }
            Ok(Value::String(lua.create_string(tried.join("\n\t"))?))
        })?;
        searchers.push(searcher)?;
        Ok(())
    }
}

impl Default for Dynamic {
    fn default() -> Self {
        Self::new()
    }
}

impl Extender for Dynamic {
    fn extend(&self, md: &mut MarkdownBuilder) {
        let lua = Lua::new();
        let sink = self.sink.clone();
        if let Err(err) = modules::install(&lua, &sink) {
            (sink)(BridgeError::Script(err));
            return;
        }
        if let Err(err) = self.install_searcher(&lua) {
            (sink)(BridgeError::Script(err));
            return;
        }
        let regs = Rc::new(RefCell::new(Registrations::default()));
        let pipeline = match lua.create_userdata(LuaPipeline(regs.clone())) {
            Ok(ud) => ud,
            Err(err) => {
                (sink)(BridgeError::Script(err));
                return;
            }
        };

        for ext in &self.extensions {
            tracing::debug!(file = %ext.file, "loading extension script");
            let chunk = match load_chunk(&lua, self.fs.as_ref(), &ext.file) {
                Ok(chunk) => chunk,
                Err(err) => {
                    (sink)(err);
                    continue;
                }
            };
            let Some(ret) = protected::<Value>(&sink, &chunk, ()) else {
                continue;
            };
            let entry = match ret {
                Value::Function(f) => f,
                other => {
                    (sink)(BridgeError::BadEntryPoint {
                        path: ext.file.clone(),
                        got: other.type_name().to_string(),
                    });
                    continue;
                }
            };
            let options = match marshal::toml_to_lua(&lua, &ext.options) {
                Ok(v) => v,
                Err(err) => {
                    (sink)(BridgeError::Script(err));
                    Value::Nil
                }
            };
            let _: Option<()> = protected(&sink, &entry, (pipeline.clone(), options));
        }

        apply_registrations(&mut regs.borrow_mut(), md);
    }
}

fn load_chunk(lua: &Lua, fs: &dyn ScriptFs, path: &str) -> Result<Function, BridgeError> {
    let src = fs.read(path).map_err(|source| BridgeError::Load {
        path: path.to_string(),
        source,
    })?;
    let chunk = lua
        .load(skip_shebang(&src))
        .set_name(path.to_string())
        .into_function()?;
    Ok(chunk)
}

/// Drops a leading `#!` line while keeping its newline, so reported line
/// numbers still match the file.
fn skip_shebang(src: &str) -> &str {
    if !src.starts_with('#') {
        return src;
    }
    match src.find('\n') {
        Some(i) => &src[i..],
        None => "",
    }
}
